//! Mask state and observer delivery shared by the aggregator and its views.

use crate::policy::CompiledPolicy;
use log::{debug, error, trace};
use signal_abi::{
    FlagMask, FlagName, FlagState, ReadinessError, ReadinessResult,
    ReadinessSnapshot, RegistrationHandle,
};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use step_scheduler::{StepScheduler, TaskHandle};

pub(crate) enum ObserverCallback {
    Transitions(Box<dyn FnMut(bool) + 'static>),
    State(Box<dyn FnMut(FlagMask) + 'static>),
}

#[derive(Clone, Copy, Debug)]
enum Event {
    Transition(bool),
    Mask(FlagMask),
}

struct Observer {
    handle: RegistrationHandle,
    wants_mask: bool,
    callback: Rc<RefCell<ObserverCallback>>,
    /// Events recorded since the last flush began.
    inbox: SmallVec<[Event; 2]>,
    /// Events owned by the flush currently running.
    due: SmallVec<[Event; 2]>,
}

struct AggregatorState {
    name: String,
    flags: Vec<FlagName>,
    policy: CompiledPolicy,
    mask: FlagMask,
    /// Predicate value as of the last recorded transition.
    last_value: bool,
    observers: Vec<Observer>,
    flush: Option<TaskHandle>,
}

impl AggregatorState {
    fn index_of(&self, name: FlagName) -> ReadinessResult<usize> {
        self.flags.iter().position(|flag| *flag == name).ok_or_else(|| {
            error!("aggregator[{}]: unknown flag `{}`", self.name, name);
            ReadinessError::unknown_flag(self.name.clone(), name.as_str())
        })
    }
}

pub(crate) struct AggregatorCore {
    state: RefCell<AggregatorState>,
    scheduler: StepScheduler,
}

impl AggregatorCore {
    pub(crate) fn new(
        name: String,
        flags: Vec<FlagName>,
        policy: CompiledPolicy,
        scheduler: StepScheduler,
    ) -> Self {
        let last_value = policy.evaluate(FlagMask::NONE);
        Self {
            state: RefCell::new(AggregatorState {
                name,
                flags,
                policy,
                mask: FlagMask::NONE,
                last_value,
                observers: Vec::new(),
                flush: None,
            }),
            scheduler,
        }
    }

    pub(crate) fn name(&self) -> String {
        self.state.borrow().name.clone()
    }

    pub(crate) fn flags(&self) -> Vec<FlagName> {
        self.state.borrow().flags.clone()
    }

    pub(crate) fn evaluate(&self) -> bool {
        let state = self.state.borrow();
        state.policy.evaluate(state.mask)
    }

    pub(crate) fn mask(&self) -> FlagMask {
        self.state.borrow().mask
    }

    pub(crate) fn flag(&self, name: FlagName) -> ReadinessResult<bool> {
        let state = self.state.borrow();
        let index = state.index_of(name)?;
        Ok(state.mask.contains_bit(index))
    }

    pub(crate) fn snapshot(&self) -> ReadinessSnapshot {
        let state = self.state.borrow();
        ReadinessSnapshot {
            aggregator: state.name.clone(),
            step: self.scheduler.current_step(),
            mask: state.mask,
            flags: state
                .flags
                .iter()
                .enumerate()
                .map(|(index, name)| FlagState {
                    name: *name,
                    set: state.mask.contains_bit(index),
                })
                .collect(),
            may_proceed: state.policy.evaluate(state.mask),
        }
    }

    /// Applies every update, then evaluates the predicate once.
    ///
    /// Returns whether the predicate transitioned. Names are validated before
    /// any bit changes.
    pub(crate) fn apply(self: &Rc<Self>, updates: &[(FlagName, bool)]) -> ReadinessResult<bool> {
        let (transitioned, notify) = {
            let mut state = self.state.borrow_mut();
            let mut mask = state.mask;
            for (name, value) in updates {
                let index = state.index_of(*name)?;
                mask = mask.with_bit(index, *value);
            }
            if mask == state.mask {
                return Ok(false);
            }

            let previous = state.mask;
            state.mask = mask;
            let value = state.policy.evaluate(mask);
            let transitioned = value != state.last_value;
            state.last_value = value;
            trace!(
                "aggregator[{}]: mask {:#b} -> {:#b}",
                state.name,
                previous,
                mask
            );
            if transitioned {
                debug!(
                    "aggregator[{}]: may_proceed -> {} at step={}",
                    state.name,
                    value,
                    self.scheduler.current_step()
                );
            }

            let mut notify = false;
            for observer in state.observers.iter_mut() {
                if observer.wants_mask {
                    observer.inbox.push(Event::Mask(mask));
                    notify = true;
                } else if transitioned {
                    observer.inbox.push(Event::Transition(value));
                    notify = true;
                }
            }
            (transitioned, notify)
        };
        if notify {
            self.schedule_flush();
        }
        Ok(transitioned)
    }

    pub(crate) fn observe(self: &Rc<Self>, callback: ObserverCallback) -> RegistrationHandle {
        let (handle, notify) = {
            let mut state = self.state.borrow_mut();
            let handle = self.scheduler.allocate_handle();
            let wants_mask = matches!(callback, ObserverCallback::State(_));
            let mut inbox = SmallVec::new();
            if wants_mask {
                inbox.push(Event::Mask(state.mask));
            } else if state.policy.evaluate(state.mask) {
                inbox.push(Event::Transition(true));
            }
            let notify = !inbox.is_empty();
            trace!(
                "aggregator[{}]: observer handle={} registered (immediate={})",
                state.name,
                handle.raw(),
                notify
            );
            state.observers.push(Observer {
                handle,
                wants_mask,
                callback: Rc::new(RefCell::new(callback)),
                inbox,
                due: SmallVec::new(),
            });
            (handle, notify)
        };
        if notify {
            self.schedule_flush();
        }
        handle
    }

    pub(crate) fn cancel(&self, handle: RegistrationHandle) -> bool {
        let mut state = self.state.borrow_mut();
        match state.observers.iter().position(|o| o.handle == handle) {
            Some(pos) => {
                state.observers.remove(pos);
                trace!("aggregator[{}]: observer handle={} cancelled", state.name, handle.raw());
                true
            }
            None => false,
        }
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
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

    /// Delivers events recorded before this step began, observer by observer.
    ///
    /// An observer cancelled mid-flush receives nothing further; events recorded
    /// by callbacks wait for the next step.
    fn flush(&self) {
        let order: SmallVec<[RegistrationHandle; 8]> = {
            let mut state = self.state.borrow_mut();
            state.flush = None;
            for observer in state.observers.iter_mut() {
                let inbox = std::mem::take(&mut observer.inbox);
                observer.due.extend(inbox);
            }
            state.observers.iter().map(|o| o.handle).collect()
        };

        for handle in order {
            loop {
                let next = {
                    let mut state = self.state.borrow_mut();
                    let Some(observer) = state.observers.iter_mut().find(|o| o.handle == handle)
                    else {
                        break;
                    };
                    if observer.due.is_empty() {
                        break;
                    }
                    let event = observer.due.remove(0);
                    (Rc::clone(&observer.callback), event)
                };
                let (callback, event) = next;
                let mut callback = callback.borrow_mut();
                match (&mut *callback, event) {
                    (ObserverCallback::Transitions(f), Event::Transition(value)) => f(value),
                    (ObserverCallback::State(f), Event::Mask(mask)) => f(mask),
                    _ => {}
                }
            }
        }
    }
}
