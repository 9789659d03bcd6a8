#![deny(missing_docs)]
//! Composite readiness over independently reported flags.
//!
//! A [`ReadinessAggregator`] owns a fixed set of named flags, each driven by a
//! separate subsystem, and a [`ReadinessPolicy`] that folds them into a single
//! "may proceed" value. Observers hear about predicate transitions, never about
//! individual flag changes, and always on a later scheduling step.
//!
//! ```
//! use aggregator::presets::ability_grant;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use step_scheduler::StepScheduler;
//!
//! let scheduler = StepScheduler::default();
//! let readiness = ability_grant::builder(scheduler.clone()).build().unwrap();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let sink = Rc::clone(&seen);
//! readiness.observe_transitions(move |ready| sink.borrow_mut().push(ready));
//!
//! readiness.set_flag(ability_grant::POSSESSED, true).unwrap();
//! readiness.set_flag(ability_grant::PAWN_READY, true).unwrap();
//! readiness.set_flag(ability_grant::ABILITY_SYSTEM_ATTACHED, true).unwrap();
//! assert!(readiness.evaluate());
//!
//! scheduler.run_step();
//! assert_eq!(*seen.borrow(), vec![true]);
//! ```

mod builder;
mod policy;
/// Flag sets for the ability, pawn, and player readiness milestones.
pub mod presets;
mod shared;
mod view;

pub use crate::builder::AggregatorBuilder;
pub use crate::policy::ReadinessPolicy;
pub use crate::view::ReadinessView;
pub use signal_abi::{
    FlagMask, FlagName, ReadinessError, ReadinessResult, ReadinessSnapshot, RegistrationHandle,
};

use crate::shared::{AggregatorCore, ObserverCallback};
use std::rc::Rc;
use step_scheduler::StepScheduler;

/// Owner side of a composite readiness predicate.
///
/// Only the owner mutates flags. Consumers receive a [`ReadinessView`].
pub struct ReadinessAggregator {
    core: Rc<AggregatorCore>,
}

impl ReadinessAggregator {
    /// Starts declaring an aggregator named `name`.
    pub fn builder(name: impl Into<String>, scheduler: StepScheduler) -> AggregatorBuilder {
        AggregatorBuilder::new(name.into(), scheduler)
    }

    pub(crate) fn from_core(core: AggregatorCore) -> Self {
        Self {
            core: Rc::new(core),
        }
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> String {
        self.core.name()
    }

    /// Declared flags in declaration order.
    pub fn flags(&self) -> Vec<FlagName> {
        self.core.flags()
    }

    /// Updates one flag and re-evaluates the predicate.
    ///
    /// Returns `Ok(true)` if the predicate changed value. Observers are
    /// notified on the next step.
    pub fn set_flag(&self, name: FlagName, value: bool) -> ReadinessResult<bool> {
        self.core.apply(&[(name, value)])
    }

    /// Updates several flags as one logical change.
    ///
    /// At most one transition is reported regardless of how many flags moved.
    /// An unknown name rejects the whole batch before any bit changes.
    pub fn set_flags(&self, updates: &[(FlagName, bool)]) -> ReadinessResult<bool> {
        self.core.apply(updates)
    }

    /// Current composite value; pure read.
    pub fn evaluate(&self) -> bool {
        self.core.evaluate()
    }

    /// Current value of one flag.
    pub fn flag(&self, name: FlagName) -> ReadinessResult<bool> {
        self.core.flag(name)
    }

    /// Raw bitmask of the declared flags.
    pub fn mask(&self) -> FlagMask {
        self.core.mask()
    }

    /// Debug view of every flag and the composite value.
    pub fn snapshot(&self) -> ReadinessSnapshot {
        self.core.snapshot()
    }

    /// Observes every predicate transition.
    ///
    /// If the predicate already holds, `callback` receives `true` on the next
    /// step, as if it had been registered before the transition happened.
    pub fn observe_transitions(&self, callback: impl FnMut(bool) + 'static) -> RegistrationHandle {
        self.core
            .observe(ObserverCallback::Transitions(Box::new(callback)))
    }

    /// Observes every change of the raw mask, starting with the current one.
    pub fn observe_state(&self, callback: impl FnMut(FlagMask) + 'static) -> RegistrationHandle {
        self.core.observe(ObserverCallback::State(Box::new(callback)))
    }

    /// Removes an observer. No-op for unknown or already-cancelled handles.
    pub fn cancel(&self, handle: RegistrationHandle) -> bool {
        self.core.cancel(handle)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.core.observer_count()
    }

    /// Read/observe-only view for consumers.
    pub fn view(&self) -> ReadinessView {
        ReadinessView::new(Rc::downgrade(&self.core))
    }
}

impl std::fmt::Debug for ReadinessAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessAggregator")
            .field("name", &self.core.name())
            .field("mask", &self.core.mask())
            .field("may_proceed", &self.core.evaluate())
            .finish()
    }
}
