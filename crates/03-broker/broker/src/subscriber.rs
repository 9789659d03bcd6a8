use crate::shared::BrokerCore;
use signal_abi::RegistrationHandle;
use std::rc::Weak;

/// Subscribe-only view of a [`crate::CallOrRegisterBroker`].
///
/// Holds no ownership. Once the owning broker is dropped the view reports the
/// signal as unsatisfied and registrations return [`RegistrationHandle::DEAD`].
pub struct BrokerSubscriber<T> {
    core: Weak<BrokerCore<T>>,
}

impl<T: Clone + 'static> BrokerSubscriber<T> {
    pub(crate) fn new(core: Weak<BrokerCore<T>>) -> Self {
        Self { core }
    }

    /// Returns `true` while the owning broker is alive.
    pub fn is_connected(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// Returns `true` once the signal has fired.
    pub fn is_satisfied(&self) -> bool {
        self.core
            .upgrade()
            .map(|core| core.is_satisfied())
            .unwrap_or(false)
    }

    /// The fired payload, if any.
    pub fn payload(&self) -> Option<T> {
        self.core.upgrade().and_then(|core| core.payload())
    }

    /// See [`crate::CallOrRegisterBroker::call_or_register`].
    pub fn call_or_register(&self, callback: impl FnOnce(T) + 'static) -> RegistrationHandle {
        match self.core.upgrade() {
            Some(core) => core.call_or_register(Box::new(callback)),
            None => RegistrationHandle::DEAD,
        }
    }

    /// See [`crate::CallOrRegisterBroker::cancel`].
    pub fn cancel(&self, handle: RegistrationHandle) -> bool {
        self.core
            .upgrade()
            .map(|core| core.cancel(handle))
            .unwrap_or(false)
    }
}

impl<T> Clone for BrokerSubscriber<T> {
    fn clone(&self) -> Self {
        Self {
            core: Weak::clone(&self.core),
        }
    }
}

impl<T> std::fmt::Debug for BrokerSubscriber<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.core.upgrade() {
            Some(core) => core.fmt_debug("BrokerSubscriber", f),
            None => f.write_str("BrokerSubscriber(disconnected)"),
        }
    }
}
