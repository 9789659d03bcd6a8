#![deny(missing_docs)]
//! Shared vocabulary for the readiness-coordination crates.
//!
//! Brokers, aggregators, the step scheduler, and the ready actions all compile
//! against the handle, flag, error, and snapshot types defined here so that a
//! consumer never needs to depend on the concrete owner of a signal.

/// Error taxonomy shared across every readiness primitive.
pub mod error;
/// Named flags and the bitmask they compose into.
pub mod flags;
/// Registration handles and their allocator.
pub mod handle;
/// Serializable debug views of aggregated readiness.
pub mod snapshot;

pub use crate::error::{ReadinessError, ReadinessResult};
pub use crate::flags::{FlagMask, FlagName, MAX_FLAGS};
pub use crate::handle::{HandleAllocator, RegistrationHandle};
pub use crate::snapshot::{FlagState, ReadinessSnapshot};
