#![deny(missing_docs)]
//! Cooperative, single-threaded scheduling-step loop.
//!
//! Every continuation in the readiness crates is a task deferred onto this
//! queue. A task deferred while step `N` runs (or between steps `N` and `N+1`)
//! executes during step `N+1`, never earlier. There is no preemption and no
//! locking: ordering is entirely the order in which tasks were deferred.

use log::{trace, warn};
use signal_abi::{HandleAllocator, RegistrationHandle};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Default number of task slots preallocated per queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
/// Default backlog size above which a step start is logged as a warning.
pub const DEFAULT_BACKLOG_WARN: usize = 1024;

/// Handle for cancelling a deferred task before it runs.
pub type TaskHandle = RegistrationHandle;

type Task = Box<dyn FnOnce() + 'static>;

/// Tuning knobs for a [`StepScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Slots preallocated for the queued-task buffers.
    pub initial_capacity: usize,
    /// A step that begins with more queued tasks than this logs a warning.
    pub backlog_warn_threshold: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_QUEUE_CAPACITY,
            backlog_warn_threshold: DEFAULT_BACKLOG_WARN,
        }
    }
}

struct Queued {
    handle: TaskHandle,
    task: Task,
}

struct SchedulerInner {
    config: SchedulerConfig,
    step: u64,
    running: bool,
    /// Tasks that run during the next step.
    next: VecDeque<Queued>,
    /// Tasks of the step currently executing.
    current: VecDeque<Queued>,
    handles: HandleAllocator,
}

/// Shared handle to one step loop. Clones refer to the same queue.
#[derive(Clone)]
pub struct StepScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl StepScheduler {
    /// Creates an idle scheduler at step `0`.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                config,
                step: 0,
                running: false,
                next: VecDeque::with_capacity(config.initial_capacity),
                current: VecDeque::with_capacity(config.initial_capacity),
                handles: HandleAllocator::new(),
            })),
        }
    }

    /// Queues `task` for the next scheduling step.
    pub fn defer(&self, task: impl FnOnce() + 'static) -> TaskHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = inner.handles.allocate();
        trace!(
            "step-scheduler: defer task={} from step={}",
            handle.raw(),
            inner.step
        );
        inner.next.push_back(Queued {
            handle,
            task: Box::new(task),
        });
        handle
    }

    /// Issues a handle unique among every primitive sharing this scheduler.
    ///
    /// Brokers and aggregators draw their registration handles from here, so a
    /// handle issued by one primitive is never accepted by another.
    pub fn allocate_handle(&self) -> RegistrationHandle {
        self.inner.borrow_mut().handles.allocate()
    }

    /// Removes a queued task. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&self, handle: TaskHandle) -> bool {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;
        for queue in [&mut inner.current, &mut inner.next] {
            if let Some(pos) = queue.iter().position(|queued| queued.handle == handle) {
                queue.remove(pos);
                trace!("step-scheduler: cancelled task={}", handle.raw());
                return true;
            }
        }
        false
    }

    /// Executes one scheduling step and returns the number of tasks run.
    ///
    /// Only tasks queued before the step began are executed; anything deferred
    /// by those tasks waits for the following step. Calling `run_step` from
    /// inside a task is rejected and returns `0`.
    pub fn run_step(&self) -> usize {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.running {
                warn!("step-scheduler: re-entrant run_step ignored at step={}", inner.step);
                return 0;
            }
            inner.step += 1;
            inner.running = true;
            let inner = &mut *inner;
            std::mem::swap(&mut inner.current, &mut inner.next);
            if inner.current.len() > inner.config.backlog_warn_threshold {
                warn!(
                    "step-scheduler: step={} starts with backlog={} (threshold={})",
                    inner.step,
                    inner.current.len(),
                    inner.config.backlog_warn_threshold
                );
            }
        }

        let _running = RunningGuard {
            inner: &self.inner,
        };
        let mut ran = 0;
        loop {
            let next = self.inner.borrow_mut().current.pop_front();
            let Some(queued) = next else {
                break;
            };
            trace!("step-scheduler: run task={}", queued.handle.raw());
            (queued.task)();
            ran += 1;
        }
        ran
    }

    /// Runs steps until no task is queued or `max_steps` have run.
    ///
    /// Returns the number of steps executed.
    pub fn run_until_idle(&self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && !self.is_idle() {
            self.run_step();
            steps += 1;
        }
        steps
    }

    /// Number of the step currently running, or of the last completed step.
    pub fn current_step(&self) -> u64 {
        self.inner.borrow().step
    }

    /// Returns `true` while [`StepScheduler::run_step`] is executing tasks.
    pub fn is_running(&self) -> bool {
        self.inner.borrow().running
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        let inner = self.inner.borrow();
        inner.current.len() + inner.next.len()
    }

    /// Returns `true` when no task is queued.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl Default for StepScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl std::fmt::Debug for StepScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StepScheduler")
            .field("step", &inner.step)
            .field("running", &inner.running)
            .field("pending", &(inner.current.len() + inner.next.len()))
            .finish()
    }
}

/// Clears the running flag even if a task panics.
struct RunningGuard<'a> {
    inner: &'a Rc<RefCell<SchedulerInner>>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.running = false;
        }
    }
}
