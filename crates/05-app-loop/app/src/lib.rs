//! Frame loop and the caller-facing readiness wait.
//!
//! [`App`] owns the scheduling-step loop and the session [`World`]. Each
//! [`App::run_once`] is one host frame: one scheduling step, after which
//! finished ready actions are released.

/// One-shot wait for the session's content to be ready.
pub mod ready_action;

pub use crate::ready_action::{DeferredReadyAction, ReadyActionState};

use anyhow::{Context, Result};
use log::{debug, trace};
use smallvec::SmallVec;
use std::rc::Rc;
use step_scheduler::{SchedulerConfig, StepScheduler};
use world::{EntityId, GameContext, World};

/// Host frame loop driving a single world.
pub struct App {
    scheduler: StepScheduler,
    world: Rc<World>,
    actions: SmallVec<[DeferredReadyAction; 4]>,
}

impl App {
    /// Creates an app with a fresh scheduler and an empty world.
    pub fn new(config: SchedulerConfig) -> Self {
        let scheduler = StepScheduler::new(config);
        let world = Rc::new(World::new(scheduler.clone()));
        Self::with_world(scheduler, world)
    }

    /// Wraps an existing scheduler and world.
    pub fn with_world(scheduler: StepScheduler, world: Rc<World>) -> Self {
        Self {
            scheduler,
            world,
            actions: SmallVec::new(),
        }
    }

    /// Scheduler shared by every signal in this app.
    pub fn scheduler(&self) -> &StepScheduler {
        &self.scheduler
    }

    /// The session world.
    pub fn world(&self) -> &Rc<World> {
        &self.world
    }

    /// Builds the standard context for `entity` and establishes it on the world.
    pub fn establish_context(&self, entity: EntityId) -> Result<Rc<GameContext>> {
        let context = GameContext::standard(self.scheduler.clone(), entity)
            .context("assembling game context")?;
        self.world
            .establish_context(context)
            .context("establishing game context")
    }

    /// Starts a ready action owned by the app; `on_ready` runs once content is ready.
    pub fn wait_for_content_ready(&mut self, on_ready: impl FnOnce() + 'static) -> ReadyActionState {
        let action = DeferredReadyAction::wait_for_content_ready(
            Some(&self.world),
            self.scheduler.clone(),
            on_ready,
        );
        action.activate();
        let state = action.state();
        if !state.is_terminal() {
            self.actions.push(action);
        }
        debug!("app: ready action started in {:?}", state);
        state
    }

    /// Number of ready actions still waiting.
    pub fn pending_actions(&self) -> usize {
        self.actions.len()
    }

    /// Runs one scheduling step, re-checks waiting actions, and releases
    /// finished ones.
    ///
    /// Returns the number of tasks the step executed.
    pub fn run_once(&mut self) -> usize {
        let ran = self.scheduler.run_step();
        let before = self.actions.len();
        self.actions.retain(|action| !action.poll().is_terminal());
        trace!(
            "app: step={} ran {} task(s), released {} action(s)",
            self.scheduler.current_step(),
            ran,
            before - self.actions.len()
        );
        ran
    }

    /// Runs steps until the scheduler is idle or `max_steps` have run.
    ///
    /// Returns the number of steps executed.
    pub fn run_until_idle(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && !self.scheduler.is_idle() {
            self.run_once();
            steps += 1;
        }
        steps
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("world", &self.world)
            .field("pending_actions", &self.actions.len())
            .finish()
    }
}
