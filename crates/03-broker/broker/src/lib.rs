#![deny(missing_docs)]
//! One-shot call-or-register signal broker.
//!
//! A [`CallOrRegisterBroker`] is a latch owned by the subsystem whose readiness
//! it represents. Consumers register a callback whether or not the latch has
//! already closed; either way the callback runs exactly once, on a later
//! scheduling step, in registration order.
//!
//! ```
//! use broker::CallOrRegisterBroker;
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use step_scheduler::StepScheduler;
//!
//! let scheduler = StepScheduler::default();
//! let broker = CallOrRegisterBroker::new("content_loaded", scheduler.clone());
//! let seen = Rc::new(Cell::new(0));
//!
//! let sink = Rc::clone(&seen);
//! broker.call_or_register(move |value| sink.set(value));
//! broker.fire(42).unwrap();
//! assert_eq!(seen.get(), 0);
//!
//! scheduler.run_step();
//! assert_eq!(seen.get(), 42);
//! ```

mod shared;
mod subscriber;

pub use crate::subscriber::BrokerSubscriber;
pub use signal_abi::{ReadinessError, ReadinessResult, RegistrationHandle};

use crate::shared::BrokerCore;
use std::rc::Rc;
use step_scheduler::StepScheduler;

/// Owner side of a one-shot readiness signal carrying a payload of type `T`.
///
/// Only the owner can [`fire`](CallOrRegisterBroker::fire). Hand consumers a
/// [`BrokerSubscriber`] instead of the broker itself.
pub struct CallOrRegisterBroker<T> {
    core: Rc<BrokerCore<T>>,
}

impl<T: Clone + 'static> CallOrRegisterBroker<T> {
    /// Creates an unsatisfied broker whose deliveries run on `scheduler`.
    pub fn new(name: impl Into<String>, scheduler: StepScheduler) -> Self {
        Self {
            core: Rc::new(BrokerCore::new(name.into(), scheduler)),
        }
    }

    /// Name used in logs and errors.
    pub fn name(&self) -> String {
        self.core.name()
    }

    /// Returns `true` once the signal has fired.
    pub fn is_satisfied(&self) -> bool {
        self.core.is_satisfied()
    }

    /// The payload the signal fired with, if it has fired.
    pub fn payload(&self) -> Option<T> {
        self.core.payload()
    }

    /// Number of registrations that have not been delivered yet.
    pub fn pending_len(&self) -> usize {
        self.core.pending_len()
    }

    /// Registers `callback` for delivery of the payload.
    ///
    /// Never invokes `callback` inline: if the signal already fired, delivery is
    /// scheduled for the next step.
    pub fn call_or_register(&self, callback: impl FnOnce(T) + 'static) -> RegistrationHandle {
        self.core.call_or_register(Box::new(callback))
    }

    /// Latches the signal and schedules delivery to every pending registration.
    ///
    /// Returns the number of registrations queued for delivery. A second call is
    /// rejected with [`ReadinessError::AlreadySatisfied`] and the stored payload
    /// is left untouched.
    pub fn fire(&self, payload: T) -> ReadinessResult<usize> {
        self.core.fire(payload)
    }

    /// Revokes a registration that has not been delivered yet.
    ///
    /// Returns `false` (and does nothing) if the handle already fired, was
    /// already cancelled, or belongs to another broker.
    pub fn cancel(&self, handle: RegistrationHandle) -> bool {
        self.core.cancel(handle)
    }

    /// Non-owning, subscribe-only view for consumers.
    pub fn subscriber(&self) -> BrokerSubscriber<T> {
        BrokerSubscriber::new(Rc::downgrade(&self.core))
    }
}

impl<T> std::fmt::Debug for CallOrRegisterBroker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.core.fmt_debug("CallOrRegisterBroker", f)
    }
}
