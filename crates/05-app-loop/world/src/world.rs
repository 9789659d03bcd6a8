//! Session container that announces its shared context.

use crate::context::GameContext;
use broker::{BrokerSubscriber, CallOrRegisterBroker};
use log::{debug, error};
use signal_abi::{ReadinessError, ReadinessResult};
use std::cell::RefCell;
use std::rc::Rc;
use step_scheduler::StepScheduler;

/// Signal name of the context-established broker.
pub const CONTEXT_ESTABLISHED: &str = "context_established";

/// One session. Shared as `Rc<World>`; consumers keep only weak references.
pub struct World {
    scheduler: StepScheduler,
    context: RefCell<Option<Rc<GameContext>>>,
    established: CallOrRegisterBroker<Rc<GameContext>>,
}

impl World {
    /// Creates a world with no context yet.
    pub fn new(scheduler: StepScheduler) -> Self {
        Self {
            established: CallOrRegisterBroker::new(CONTEXT_ESTABLISHED, scheduler.clone()),
            scheduler,
            context: RefCell::new(None),
        }
    }

    /// Step loop this world's signals deliver on.
    pub fn scheduler(&self) -> &StepScheduler {
        &self.scheduler
    }

    /// The shared context, if it has been established.
    pub fn context(&self) -> Option<Rc<GameContext>> {
        self.context.borrow().clone()
    }

    /// Installs the shared context and fires the context-established signal.
    ///
    /// The context of a world is established once; a second call is rejected
    /// and the first context stays in place.
    pub fn establish_context(&self, context: GameContext) -> ReadinessResult<Rc<GameContext>> {
        if self.context.borrow().is_some() {
            error!(
                "world: context established twice at step={}",
                self.scheduler.current_step()
            );
            return Err(ReadinessError::already_satisfied(CONTEXT_ESTABLISHED));
        }
        let context = Rc::new(context);
        self.context.replace(Some(Rc::clone(&context)));
        self.established.fire(Rc::clone(&context))?;
        debug!(
            "world: context established at step={}",
            self.scheduler.current_step()
        );
        Ok(context)
    }

    /// Subscribe-only view of the one-shot context-established signal.
    pub fn context_signal(&self) -> BrokerSubscriber<Rc<GameContext>> {
        self.established.subscriber()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("step", &self.scheduler.current_step())
            .field("context", &self.context.borrow().is_some())
            .finish()
    }
}
