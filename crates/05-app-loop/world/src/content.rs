use broker::{BrokerSubscriber, CallOrRegisterBroker, RegistrationHandle};
use log::{debug, warn};
use serde::Serialize;
use signal_abi::{ReadinessError, ReadinessResult};
use std::cell::RefCell;
use std::rc::Rc;
use step_scheduler::StepScheduler;

/// Description of the gameplay content a session runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContentDefinition {
    /// Stable identifier.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
}

impl ContentDefinition {
    /// Creates a definition.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Opaque handle to loaded content, delivered as the content signal's payload.
pub type ContentHandle = Rc<ContentDefinition>;

/// Signal name of the content-loaded broker.
pub const CONTENT_LOADED: &str = "content_loaded";

/// Owns the content-loaded signal for one context.
pub struct ContentManager {
    loaded: CallOrRegisterBroker<ContentHandle>,
    loading: RefCell<Option<ContentHandle>>,
}

impl ContentManager {
    /// Creates a manager with nothing loaded.
    pub fn new(scheduler: StepScheduler) -> Self {
        Self {
            loaded: CallOrRegisterBroker::new(CONTENT_LOADED, scheduler),
            loading: RefCell::new(None),
        }
    }

    /// Starts loading `definition`.
    ///
    /// Fails with [`ReadinessError::AlreadySatisfied`] once content has loaded;
    /// the loaded content of a context never changes. Starting a second load
    /// before the first completes replaces it.
    pub fn begin_load(&self, definition: ContentDefinition) -> ReadinessResult<ContentHandle> {
        if self.loaded.is_satisfied() {
            return Err(ReadinessError::already_satisfied(CONTENT_LOADED));
        }
        let handle = Rc::new(definition);
        if let Some(previous) = self.loading.replace(Some(Rc::clone(&handle))) {
            warn!(
                "content: load of `{}` superseded by `{}`",
                previous.id, handle.id
            );
        }
        debug!("content: loading `{}`", handle.id);
        Ok(handle)
    }

    /// Completes the in-flight load and fires the content-loaded signal.
    pub fn finish_load(&self) -> ReadinessResult<ContentHandle> {
        if self.loaded.is_satisfied() {
            return Err(ReadinessError::already_satisfied(CONTENT_LOADED));
        }
        let handle = self
            .loading
            .borrow_mut()
            .take()
            .ok_or(ReadinessError::NoLoadInFlight)?;
        let notified = self.loaded.fire(Rc::clone(&handle))?;
        debug!(
            "content: `{}` loaded, {} waiter(s) scheduled",
            handle.id, notified
        );
        Ok(handle)
    }

    /// Returns `true` once content has loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_satisfied()
    }

    /// Returns `true` while a load is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.borrow().is_some()
    }

    /// The loaded content, if any.
    pub fn loaded_content(&self) -> Option<ContentHandle> {
        self.loaded.payload()
    }

    /// Runs `callback` with the loaded content on a later step, now or after loading.
    pub fn call_or_register_loaded(
        &self,
        callback: impl FnOnce(ContentHandle) + 'static,
    ) -> RegistrationHandle {
        self.loaded.call_or_register(callback)
    }

    /// Revokes a registration made with [`ContentManager::call_or_register_loaded`].
    pub fn cancel(&self, handle: RegistrationHandle) -> bool {
        self.loaded.cancel(handle)
    }

    /// Subscribe-only view of the content-loaded signal.
    pub fn subscriber(&self) -> BrokerSubscriber<ContentHandle> {
        self.loaded.subscriber()
    }
}

impl std::fmt::Debug for ContentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentManager")
            .field("loaded", &self.loaded_content().map(|c| c.id.clone()))
            .field("loading", &self.is_loading())
            .finish()
    }
}
