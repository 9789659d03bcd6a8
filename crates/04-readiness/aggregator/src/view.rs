use crate::shared::{AggregatorCore, ObserverCallback};
use signal_abi::{FlagMask, ReadinessSnapshot, RegistrationHandle};
use std::rc::Weak;

/// Consumer-side view of a [`crate::ReadinessAggregator`].
///
/// A view whose aggregator was dropped evaluates to `false`, since unknown
/// readiness is never optimistic.
#[derive(Clone)]
pub struct ReadinessView {
    core: Weak<AggregatorCore>,
}

impl ReadinessView {
    pub(crate) fn new(core: Weak<AggregatorCore>) -> Self {
        Self { core }
    }

    /// Returns `true` while the owning aggregator is alive.
    pub fn is_connected(&self) -> bool {
        self.core.strong_count() > 0
    }

    /// See [`crate::ReadinessAggregator::evaluate`].
    pub fn evaluate(&self) -> bool {
        self.core
            .upgrade()
            .map(|core| core.evaluate())
            .unwrap_or(false)
    }

    /// See [`crate::ReadinessAggregator::mask`].
    pub fn mask(&self) -> FlagMask {
        self.core
            .upgrade()
            .map(|core| core.mask())
            .unwrap_or(FlagMask::NONE)
    }

    /// See [`crate::ReadinessAggregator::snapshot`].
    pub fn snapshot(&self) -> Option<ReadinessSnapshot> {
        self.core.upgrade().map(|core| core.snapshot())
    }

    /// See [`crate::ReadinessAggregator::observe_transitions`].
    pub fn observe_transitions(&self, callback: impl FnMut(bool) + 'static) -> RegistrationHandle {
        match self.core.upgrade() {
            Some(core) => core.observe(ObserverCallback::Transitions(Box::new(callback))),
            None => RegistrationHandle::DEAD,
        }
    }

    /// See [`crate::ReadinessAggregator::observe_state`].
    pub fn observe_state(&self, callback: impl FnMut(FlagMask) + 'static) -> RegistrationHandle {
        match self.core.upgrade() {
            Some(core) => core.observe(ObserverCallback::State(Box::new(callback))),
            None => RegistrationHandle::DEAD,
        }
    }

    /// See [`crate::ReadinessAggregator::cancel`].
    pub fn cancel(&self, handle: RegistrationHandle) -> bool {
        self.core
            .upgrade()
            .map(|core| core.cancel(handle))
            .unwrap_or(false)
    }
}
