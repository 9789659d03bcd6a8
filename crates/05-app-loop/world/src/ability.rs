use aggregator::presets::ability_grant::{self, ABILITY_SYSTEM_ATTACHED, PAWN_READY, POSSESSED};
use aggregator::{ReadinessAggregator, ReadinessView};
use log::debug;
use serde::Serialize;
use signal_abi::{FlagName, ReadinessResult, ReadinessSnapshot, RegistrationHandle};
use step_scheduler::StepScheduler;

/// Identifier of a controllable entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EntityId(pub u64);

/// Decides when abilities may be granted to one controlled entity.
///
/// Three collaborators report into it independently: the ability subsystem,
/// the entity's own initialization, and the possession hand-off. The granting
/// subsystem only reads [`AbilityReadiness::may_grant_abilities`] or observes
/// transitions through a [`ReadinessView`].
pub struct AbilityReadiness {
    entity: EntityId,
    gate: ReadinessAggregator,
}

impl AbilityReadiness {
    /// Creates the gate for `entity` with every flag unset.
    pub fn new(entity: EntityId, scheduler: StepScheduler) -> ReadinessResult<Self> {
        Ok(Self {
            entity,
            gate: ability_grant::builder(scheduler).build()?,
        })
    }

    /// Entity this gate belongs to.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Reported by the ability subsystem when it attaches to or detaches from the entity.
    pub fn set_ability_system_attached(&self, attached: bool) -> ReadinessResult<bool> {
        self.report(ABILITY_SYSTEM_ATTACHED, attached)
    }

    /// Reported by the entity when its own initialization completes or is torn down.
    pub fn set_pawn_ready(&self, ready: bool) -> ReadinessResult<bool> {
        self.report(PAWN_READY, ready)
    }

    /// Reported by the possession hand-off.
    pub fn set_possessed(&self, possessed: bool) -> ReadinessResult<bool> {
        self.report(POSSESSED, possessed)
    }

    /// Applies a controller switching from `old` to `new`.
    ///
    /// The un-possession of `old` is applied before the possession of `new`,
    /// within one batch, so a controller hopping back into the same entity
    /// produces no transition at all.
    pub fn handle_possession_change(
        &self,
        old: Option<EntityId>,
        new: Option<EntityId>,
    ) -> ReadinessResult<bool> {
        let mut updates = Vec::with_capacity(2);
        if old == Some(self.entity) {
            updates.push((POSSESSED, false));
        }
        if new == Some(self.entity) {
            updates.push((POSSESSED, true));
        }
        if updates.is_empty() {
            return Ok(false);
        }
        debug!(
            "ability[{:?}]: possession change {:?} -> {:?}",
            self.entity, old, new
        );
        self.gate.set_flags(&updates)
    }

    /// Composite "may grant abilities" value.
    pub fn may_grant_abilities(&self) -> bool {
        self.gate.evaluate()
    }

    /// Observes "may grant abilities" transitions.
    pub fn observe_transitions(&self, callback: impl FnMut(bool) + 'static) -> RegistrationHandle {
        self.gate.observe_transitions(callback)
    }

    /// Removes an observer.
    pub fn cancel(&self, handle: RegistrationHandle) -> bool {
        self.gate.cancel(handle)
    }

    /// Read/observe-only view for the granting subsystem.
    pub fn view(&self) -> ReadinessView {
        self.gate.view()
    }

    /// Debug snapshot of the three flags.
    pub fn snapshot(&self) -> ReadinessSnapshot {
        self.gate.snapshot()
    }

    fn report(&self, flag: FlagName, value: bool) -> ReadinessResult<bool> {
        let transitioned = self.gate.set_flag(flag, value)?;
        debug!(
            "ability[{:?}]: {}={} (may_grant={})",
            self.entity,
            flag,
            value,
            self.gate.evaluate()
        );
        Ok(transitioned)
    }
}

impl std::fmt::Debug for AbilityReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityReadiness")
            .field("entity", &self.entity)
            .field("gate", &self.gate)
            .finish()
    }
}
