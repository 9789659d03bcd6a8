//! One-shot "content ready" wait exposed to a single caller.
//!
//! The action walks `Created -> WaitingForContext -> WaitingForContent ->
//! PendingFrameDelay -> Ready`, skipping stages whose signal has already
//! fired. Completion is never observed in the step that activated the action:
//! content that is already loaded costs one deferred step, content that loads
//! later arrives through the broker's own next-step delivery.
//!
//! Every continuation holds a weak reference to the action, and cancelling or
//! dropping the action revokes whatever registration is outstanding. A signal
//! whose owner is dropped before delivering takes the action to `Unreachable`
//! on the following step.

use broker::BrokerSubscriber;
use log::{debug, trace};
use serde::Serialize;
use signal_abi::RegistrationHandle;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use step_scheduler::{StepScheduler, TaskHandle};
use world::{ContentHandle, GameContext, World};

/// Lifecycle of a [`DeferredReadyAction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ReadyActionState {
    /// Constructed, not yet activated.
    Created,
    /// Subscribed to the world's context-established signal.
    WaitingForContext,
    /// Subscribed to the content-loaded signal.
    WaitingForContent,
    /// Content was already loaded at subscription time; completion is queued
    /// for the next step. Content that loads later skips this state, since the
    /// content signal's own next-step delivery already provides the delay.
    PendingFrameDelay,
    /// Completion delivered. Terminal.
    Ready,
    /// No session to wait on. Terminal; the caller is never notified.
    Unreachable,
    /// Revoked by the caller before completing. Terminal.
    Cancelled,
}

impl ReadyActionState {
    /// Returns `true` for states with no outgoing transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Unreachable | Self::Cancelled)
    }
}

type Completion = Box<dyn FnOnce() + 'static>;

/// Travels inside a signal registration. Dropped undelivered while the action
/// still waits in `waiting_in`, it means the signal's owner went away.
struct RegistrationWatch {
    inner: Weak<RefCell<ActionInner>>,
    waiting_in: ReadyActionState,
    delivered: bool,
}

impl RegistrationWatch {
    fn new(inner: &Rc<RefCell<ActionInner>>, waiting_in: ReadyActionState) -> Self {
        Self {
            inner: Rc::downgrade(inner),
            waiting_in,
            delivered: false,
        }
    }

    fn deliver(mut self) -> Option<Rc<RefCell<ActionInner>>> {
        self.delivered = true;
        self.inner.upgrade()
    }
}

impl Drop for RegistrationWatch {
    fn drop(&mut self) {
        if self.delivered {
            return;
        }
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let scheduler = match inner.try_borrow() {
            Ok(guard) if guard.state == self.waiting_in => guard.scheduler.clone(),
            _ => return,
        };
        debug!(
            "ready action: signal dropped while {:?} at step={}",
            self.waiting_in,
            scheduler.current_step()
        );
        let weak = Weak::clone(&self.inner);
        let waiting_in = self.waiting_in;
        scheduler.defer(move || {
            if let Some(inner) = weak.upgrade() {
                if inner.borrow().state == waiting_in {
                    give_up(&inner);
                }
            }
        });
    }
}

struct ActionInner {
    state: ReadyActionState,
    world: Weak<World>,
    scheduler: StepScheduler,
    context_wait: Option<(BrokerSubscriber<Rc<GameContext>>, RegistrationHandle)>,
    content_wait: Option<(BrokerSubscriber<ContentHandle>, RegistrationHandle)>,
    delay: Option<TaskHandle>,
    on_ready: Option<Completion>,
}

/// Outstanding registrations pulled out of the action so they can be revoked
/// without holding its borrow.
#[derive(Default)]
struct Outstanding {
    context_wait: Option<(BrokerSubscriber<Rc<GameContext>>, RegistrationHandle)>,
    content_wait: Option<(BrokerSubscriber<ContentHandle>, RegistrationHandle)>,
    delay: Option<TaskHandle>,
}

impl Outstanding {
    fn revoke(self, scheduler: &StepScheduler) {
        if let Some((signal, handle)) = self.context_wait {
            signal.cancel(handle);
        }
        if let Some((signal, handle)) = self.content_wait {
            signal.cancel(handle);
        }
        if let Some(task) = self.delay {
            scheduler.cancel(task);
        }
    }
}

impl ActionInner {
    fn take_outstanding(&mut self) -> Outstanding {
        Outstanding {
            context_wait: self.context_wait.take(),
            content_wait: self.content_wait.take(),
            delay: self.delay.take(),
        }
    }

    fn transition(&mut self, next: ReadyActionState) {
        debug!(
            "ready action: {:?} -> {:?} at step={}",
            self.state,
            next,
            self.scheduler.current_step()
        );
        self.state = next;
    }
}

/// Waits for the session's content to be ready and then notifies its caller once.
///
/// Created with [`DeferredReadyAction::wait_for_content_ready`], started with
/// [`DeferredReadyAction::activate`]. Dropping the action before it completes
/// cancels it.
pub struct DeferredReadyAction {
    inner: Rc<RefCell<ActionInner>>,
}

impl DeferredReadyAction {
    /// Creates an action bound to `world`, or to no session at all.
    ///
    /// `on_ready` runs at most once, on a step after [`activate`](Self::activate).
    pub fn wait_for_content_ready(
        world: Option<&Rc<World>>,
        scheduler: StepScheduler,
        on_ready: impl FnOnce() + 'static,
    ) -> Self {
        let inner = ActionInner {
            state: ReadyActionState::Created,
            world: world.map(Rc::downgrade).unwrap_or_default(),
            scheduler,
            context_wait: None,
            content_wait: None,
            delay: None,
            on_ready: Some(Box::new(on_ready)),
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Starts the wait. Only the first call on a `Created` action has an effect.
    pub fn activate(&self) {
        if self.state() != ReadyActionState::Created {
            trace!("ready action: activate ignored in {:?}", self.state());
            return;
        }
        let world = self.inner.borrow().world.upgrade();
        let Some(world) = world else {
            give_up(&self.inner);
            return;
        };
        match world.context() {
            Some(context) => wait_for_content(&self.inner, &context),
            None => {
                let signal = world.context_signal();
                let watch =
                    RegistrationWatch::new(&self.inner, ReadyActionState::WaitingForContext);
                let handle = signal.call_or_register(move |context| {
                    if let Some(inner) = watch.deliver() {
                        on_context(&inner, &context);
                    }
                });
                let mut inner = self.inner.borrow_mut();
                inner.transition(ReadyActionState::WaitingForContext);
                inner.context_wait = Some((signal, handle));
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> ReadyActionState {
        self.inner.borrow().state
    }

    /// Re-checks that the world is still alive and gives up if it is not.
    ///
    /// Covers a world dropped while the signal being waited on is kept alive
    /// elsewhere. Returns the resulting state.
    pub fn poll(&self) -> ReadyActionState {
        let state = self.state();
        if state.is_terminal() || state == ReadyActionState::Created {
            return state;
        }
        if !world_reachable(&self.inner) {
            give_up(&self.inner);
        }
        self.state()
    }

    /// Returns `true` once the action can no longer change state.
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Revokes every outstanding registration and discards the completion.
    ///
    /// Returns `false` when the action had already terminated.
    pub fn cancel(&self) -> bool {
        let (outstanding, scheduler, on_ready) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return false;
            }
            inner.transition(ReadyActionState::Cancelled);
            (
                inner.take_outstanding(),
                inner.scheduler.clone(),
                inner.on_ready.take(),
            )
        };
        outstanding.revoke(&scheduler);
        drop(on_ready);
        true
    }
}

impl Drop for DeferredReadyAction {
    fn drop(&mut self) {
        let live = self
            .inner
            .try_borrow()
            .map(|inner| !inner.state.is_terminal())
            .unwrap_or(false);
        if live {
            self.cancel();
        }
    }
}

impl std::fmt::Debug for DeferredReadyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DeferredReadyAction")
            .field("state", &inner.state)
            .field("world", &(inner.world.strong_count() > 0))
            .finish()
    }
}

fn on_context(inner: &Rc<RefCell<ActionInner>>, context: &Rc<GameContext>) {
    let waited = {
        let mut guard = inner.borrow_mut();
        if guard.state != ReadyActionState::WaitingForContext {
            return;
        }
        guard.context_wait.take()
    };
    if let Some((signal, handle)) = waited {
        signal.cancel(handle);
    }
    if !world_reachable(inner) {
        give_up(inner);
        return;
    }
    wait_for_content(inner, context);
}

fn wait_for_content(inner: &Rc<RefCell<ActionInner>>, context: &GameContext) {
    let content = context.content();
    if content.is_loaded() {
        let weak = Rc::downgrade(inner);
        let scheduler = inner.borrow().scheduler.clone();
        let task = scheduler.defer(move || {
            if let Some(inner) = weak.upgrade() {
                complete(&inner, ReadyActionState::PendingFrameDelay);
            }
        });
        let mut guard = inner.borrow_mut();
        guard.transition(ReadyActionState::PendingFrameDelay);
        guard.delay = Some(task);
    } else {
        let signal = content.subscriber();
        let watch = RegistrationWatch::new(inner, ReadyActionState::WaitingForContent);
        let handle = signal.call_or_register(move |_content| {
            if let Some(inner) = watch.deliver() {
                complete(&inner, ReadyActionState::WaitingForContent);
            }
        });
        let mut guard = inner.borrow_mut();
        guard.transition(ReadyActionState::WaitingForContent);
        guard.content_wait = Some((signal, handle));
    }
}

fn complete(inner: &Rc<RefCell<ActionInner>>, expected: ReadyActionState) {
    {
        let mut guard = inner.borrow_mut();
        if guard.state != expected {
            return;
        }
        guard.delay = None;
        guard.content_wait = None;
    }
    if !world_reachable(inner) {
        give_up(inner);
        return;
    }
    let on_ready = {
        let mut guard = inner.borrow_mut();
        guard.transition(ReadyActionState::Ready);
        guard.on_ready.take()
    };
    if let Some(on_ready) = on_ready {
        on_ready();
    }
}

fn world_reachable(inner: &Rc<RefCell<ActionInner>>) -> bool {
    inner.borrow().world.strong_count() > 0
}

fn give_up(inner: &Rc<RefCell<ActionInner>>) {
    let (outstanding, scheduler, on_ready) = {
        let mut guard = inner.borrow_mut();
        guard.transition(ReadyActionState::Unreachable);
        (
            guard.take_outstanding(),
            guard.scheduler.clone(),
            guard.on_ready.take(),
        )
    };
    outstanding.revoke(&scheduler);
    drop(on_ready);
}
