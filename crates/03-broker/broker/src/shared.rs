//! Shared broker state reachable from both the owner and its subscriber views.

use log::{debug, error, trace};
use signal_abi::{ReadinessError, ReadinessResult, RegistrationHandle};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use step_scheduler::{StepScheduler, TaskHandle};

type Callback<T> = Box<dyn FnOnce(T) + 'static>;

struct Registration<T> {
    handle: RegistrationHandle,
    callback: Callback<T>,
}

struct BrokerState<T> {
    name: String,
    satisfied: bool,
    payload: Option<T>,
    /// Registrations not yet picked up by a flush, in insertion order.
    waiting: SmallVec<[Registration<T>; 4]>,
    /// Registrations owned by the flush currently running.
    due: VecDeque<Registration<T>>,
    /// Flush task queued for the next step, if any.
    flush: Option<TaskHandle>,
}

pub(crate) struct BrokerCore<T> {
    state: RefCell<BrokerState<T>>,
    scheduler: StepScheduler,
}

impl<T: Clone + 'static> BrokerCore<T> {
    pub(crate) fn new(name: String, scheduler: StepScheduler) -> Self {
        Self {
            state: RefCell::new(BrokerState {
                name,
                satisfied: false,
                payload: None,
                waiting: SmallVec::new(),
                due: VecDeque::new(),
                flush: None,
            }),
            scheduler,
        }
    }

    pub(crate) fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    pub(crate) fn is_satisfied(&self) -> bool {
        self.state.borrow().satisfied
    }

    pub(crate) fn payload(&self) -> Option<T> {
        self.state.borrow().payload.clone()
    }

    pub(crate) fn pending_len(&self) -> usize {
        let state = self.state.borrow();
        state.waiting.len() + state.due.len()
    }

    pub(crate) fn call_or_register(self: &Rc<Self>, callback: Callback<T>) -> RegistrationHandle {
        let (handle, satisfied) = {
            let mut state = self.state.borrow_mut();
            let handle = self.scheduler.allocate_handle();
            state.waiting.push(Registration { handle, callback });
            trace!(
                "broker[{}]: registered handle={} satisfied={}",
                state.name,
                handle.raw(),
                state.satisfied
            );
            (handle, state.satisfied)
        };
        if satisfied {
            self.schedule_flush();
        }
        handle
    }

    pub(crate) fn fire(self: &Rc<Self>, payload: T) -> ReadinessResult<usize> {
        let queued = {
            let mut state = self.state.borrow_mut();
            if state.satisfied {
                error!(
                    "broker[{}]: fired twice at step={}; second payload discarded",
                    state.name,
                    self.scheduler.current_step()
                );
                return Err(ReadinessError::already_satisfied(state.name.clone()));
            }
            state.satisfied = true;
            state.payload = Some(payload);
            debug!(
                "broker[{}]: satisfied at step={} with {} pending",
                state.name,
                self.scheduler.current_step(),
                state.waiting.len()
            );
            state.waiting.len()
        };
        if queued > 0 {
            self.schedule_flush();
        }
        Ok(queued)
    }

    pub(crate) fn cancel(&self, handle: RegistrationHandle) -> bool {
        let orphaned_flush = {
            let mut state = self.state.borrow_mut();
            let removed = if let Some(pos) = state.waiting.iter().position(|r| r.handle == handle)
            {
                state.waiting.remove(pos);
                true
            } else if let Some(pos) = state.due.iter().position(|r| r.handle == handle) {
                state.due.remove(pos);
                true
            } else {
                false
            };
            if !removed {
                return false;
            }
            trace!("broker[{}]: cancelled handle={}", state.name, handle.raw());
            if state.waiting.is_empty() {
                state.flush.take()
            } else {
                None
            }
        };
        if let Some(task) = orphaned_flush {
            self.scheduler.cancel(task);
        }
        true
    }

    fn schedule_flush(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        if state.flush.is_some() {
            return;
        }
        let weak: Weak<Self> = Rc::downgrade(self);
        state.flush = Some(self.scheduler.defer(move || {
            if let Some(core) = weak.upgrade() {
                core.flush();
            }
        }));
    }

    /// Delivers every registration that was waiting when this step's flush began.
    ///
    /// Registrations added by the callbacks themselves land in `waiting` and are
    /// picked up by the next step's flush.
    fn flush(&self) {
        {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;
            state.flush = None;
            state.due.extend(state.waiting.drain(..));
        }
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let Some(registration) = state.due.pop_front() else {
                    break;
                };
                let Some(payload) = state.payload.clone() else {
                    // Unreachable: flushes are only scheduled once satisfied.
                    state.due.push_front(registration);
                    break;
                };
                trace!(
                    "broker[{}]: deliver handle={} at step={}",
                    state.name,
                    registration.handle.raw(),
                    self.scheduler.current_step()
                );
                (registration, payload)
            };
            let (registration, payload) = next;
            (registration.callback)(payload);
        }
    }
}

impl<T> BrokerCore<T> {
    pub(crate) fn fmt_debug(
        &self,
        label: &str,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct(label)
            .field("name", &state.name)
            .field("satisfied", &state.satisfied)
            .field("pending", &(state.waiting.len() + state.due.len()))
            .finish()
    }
}
