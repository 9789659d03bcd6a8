//! Host-side readiness sources: the session world and its shared context.
//!
//! The `world` crate owns every signal whose readiness the rest of the app
//! waits on. The [`World`] raises a one-shot "context established" signal when
//! its [`GameContext`] appears; the context in turn owns the content-loaded
//! broker and the ability-grant readiness gate. Consumers only ever see
//! subscriber views and aggregator views.

/// Ability-grant readiness for the locally controlled entity.
pub mod ability;
/// Shared context object and its builder.
pub mod context;
/// Content definitions and the content-loaded signal.
pub mod content;
/// Session-level container that establishes the context.
pub mod world;

pub use crate::ability::{AbilityReadiness, EntityId};
pub use crate::content::{ContentDefinition, ContentHandle, ContentManager};
pub use crate::context::{GameContext, GameContextBuilder};
pub use crate::world::World;
