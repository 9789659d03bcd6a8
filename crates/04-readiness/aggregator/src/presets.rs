//! Milestone flag sets for the standard readiness aggregators.
//!
//! Each preset exposes its flag names as constants plus a `builder` that
//! declares them with the default "all flags set" policy. Callers may still
//! override the policy before building.

/// Gate for granting abilities to a controlled entity.
pub mod ability_grant {
    use crate::{AggregatorBuilder, ReadinessAggregator};
    use signal_abi::FlagName;
    use step_scheduler::StepScheduler;

    /// The ability subsystem is attached to the entity.
    pub const ABILITY_SYSTEM_ATTACHED: FlagName = FlagName::new("ability_system_attached");
    /// The controlled entity finished its own initialization.
    pub const PAWN_READY: FlagName = FlagName::new("pawn_ready");
    /// A controller currently possesses the entity.
    pub const POSSESSED: FlagName = FlagName::new("possessed");

    /// Declared flags in bit order.
    pub const FLAGS: [FlagName; 3] = [ABILITY_SYSTEM_ATTACHED, PAWN_READY, POSSESSED];

    /// Aggregator name used in logs.
    pub const NAME: &str = "ability_grant";

    /// Declares the ability-grant aggregator.
    pub fn builder(scheduler: StepScheduler) -> AggregatorBuilder {
        ReadinessAggregator::builder(NAME, scheduler).flags(FLAGS)
    }
}

/// Initialization milestones of a controlled entity ("body").
pub mod pawn_ready {
    use crate::{AggregatorBuilder, ReadinessAggregator};
    use signal_abi::FlagName;
    use step_scheduler::StepScheduler;

    /// Core entity data has been loaded and applied.
    pub const PAWN_DATA: FlagName = FlagName::new("pawn_data");
    /// The entity's ability subsystem is initialized.
    pub const ABILITY: FlagName = FlagName::new("ability");
    /// A controller possesses the entity.
    pub const POSSESSED: FlagName = FlagName::new("possessed");
    /// All gameplay extensions on the entity are ready.
    pub const GAMEPLAY: FlagName = FlagName::new("gameplay");

    /// Declared flags in bit order.
    pub const FLAGS: [FlagName; 4] = [PAWN_DATA, ABILITY, POSSESSED, GAMEPLAY];

    /// Aggregator name used in logs.
    pub const NAME: &str = "pawn_ready";

    /// Declares the pawn-ready aggregator.
    pub fn builder(scheduler: StepScheduler) -> AggregatorBuilder {
        ReadinessAggregator::builder(NAME, scheduler).flags(FLAGS)
    }
}

/// Initialization milestones of a player ("soul").
pub mod player_ready {
    use crate::{AggregatorBuilder, ReadinessAggregator};
    use signal_abi::FlagName;
    use step_scheduler::StepScheduler;

    /// The player's controller is initialized.
    pub const CONTROLLER: FlagName = FlagName::new("controller");
    /// The player's persistent state has its core data.
    pub const PLAYER_STATE: FlagName = FlagName::new("player_state");
    /// The player-level ability subsystem is initialized.
    pub const ABILITY: FlagName = FlagName::new("ability");
    /// The player possesses an entity.
    pub const POSSESSION: FlagName = FlagName::new("possession");
    /// Player-level gameplay features (HUD, input) are ready.
    pub const GAMEPLAY: FlagName = FlagName::new("gameplay");

    /// Declared flags in bit order.
    pub const FLAGS: [FlagName; 5] = [CONTROLLER, PLAYER_STATE, ABILITY, POSSESSION, GAMEPLAY];

    /// Aggregator name used in logs.
    pub const NAME: &str = "player_ready";

    /// Declares the player-ready aggregator.
    pub fn builder(scheduler: StepScheduler) -> AggregatorBuilder {
        ReadinessAggregator::builder(NAME, scheduler).flags(FLAGS)
    }
}
