use serde::Serialize;

/// Opaque token returned by every subscribe-style call.
///
/// Handles are drawn from one allocator per scheduling loop, so a handle names
/// exactly one registration among all primitives sharing that loop. Handing it
/// back to `cancel` after delivery, twice, or to another primitive is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RegistrationHandle(u64);

impl RegistrationHandle {
    /// Handle that never refers to a live registration.
    ///
    /// Returned when subscribing through a view whose owner has been dropped.
    pub const DEAD: RegistrationHandle = RegistrationHandle(0);

    /// Raw numeric identifier, for logging.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is [`RegistrationHandle::DEAD`].
    pub fn is_dead(self) -> bool {
        self.0 == 0
    }
}

/// Monotonic source of [`RegistrationHandle`]s; never yields [`RegistrationHandle::DEAD`].
#[derive(Debug)]
pub struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    /// Creates an allocator whose first handle is `1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Issues the next handle.
    pub fn allocate(&mut self) -> RegistrationHandle {
        let handle = RegistrationHandle(self.next);
        self.next = self.next.wrapping_add(1).max(1);
        handle
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
