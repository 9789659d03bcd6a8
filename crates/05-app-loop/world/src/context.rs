use crate::ability::{AbilityReadiness, EntityId};
use crate::content::ContentManager;
use anyhow::{anyhow, Result};
use step_scheduler::StepScheduler;

/// Shared per-session context: the object whose appearance the world announces.
#[derive(Debug)]
pub struct GameContext {
    content: ContentManager,
    ability: AbilityReadiness,
}

impl GameContext {
    /// Creates a new builder for assembling a context.
    pub fn builder() -> GameContextBuilder {
        GameContextBuilder::new()
    }

    /// Context with a fresh content manager and an ability gate for `entity`.
    pub fn standard(scheduler: StepScheduler, entity: EntityId) -> Result<Self> {
        Self::builder()
            .content(ContentManager::new(scheduler.clone()))
            .ability(AbilityReadiness::new(entity, scheduler)?)
            .build()
    }

    /// Content-management subsystem.
    pub fn content(&self) -> &ContentManager {
        &self.content
    }

    /// Ability-grant readiness of the locally controlled entity.
    pub fn ability(&self) -> &AbilityReadiness {
        &self.ability
    }
}

/// Builder for assembling a [`GameContext`] from its subsystems.
pub struct GameContextBuilder {
    content: Option<ContentManager>,
    ability: Option<AbilityReadiness>,
}

impl GameContextBuilder {
    /// Creates an empty builder with no subsystems attached.
    pub fn new() -> Self {
        Self {
            content: None,
            ability: None,
        }
    }

    /// Sets the content manager.
    pub fn content(mut self, content: ContentManager) -> Self {
        self.content = Some(content);
        self
    }

    /// Sets the ability readiness gate.
    pub fn ability(mut self, ability: AbilityReadiness) -> Self {
        self.ability = Some(ability);
        self
    }

    /// Builds a [`GameContext`], returning an error if any subsystem is missing.
    pub fn build(self) -> Result<GameContext> {
        Ok(GameContext {
            content: self
                .content
                .ok_or_else(|| anyhow!("missing content manager"))?,
            ability: self
                .ability
                .ok_or_else(|| anyhow!("missing ability readiness"))?,
        })
    }
}

impl Default for GameContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reports_missing_subsystems() {
        let err = GameContext::builder()
            .content(ContentManager::new(StepScheduler::default()))
            .build()
            .expect_err("ability missing");
        assert_eq!(err.to_string(), "missing ability readiness");
    }
}
