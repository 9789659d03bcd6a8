use crate::policy::ReadinessPolicy;
use crate::shared::AggregatorCore;
use crate::ReadinessAggregator;
use log::debug;
use signal_abi::{FlagName, ReadinessError, ReadinessResult, MAX_FLAGS};
use step_scheduler::StepScheduler;

/// Declares the flags and policy of a [`ReadinessAggregator`].
pub struct AggregatorBuilder {
    name: String,
    scheduler: StepScheduler,
    flags: Vec<FlagName>,
    policy: Option<ReadinessPolicy>,
}

impl AggregatorBuilder {
    pub(crate) fn new(name: String, scheduler: StepScheduler) -> Self {
        Self {
            name,
            scheduler,
            flags: Vec::new(),
            policy: None,
        }
    }

    /// Declares one flag. Declared flags start unset.
    pub fn flag(mut self, name: FlagName) -> Self {
        self.flags.push(name);
        self
    }

    /// Declares several flags in order.
    pub fn flags(mut self, names: impl IntoIterator<Item = FlagName>) -> Self {
        self.flags.extend(names);
        self
    }

    /// Sets the composite policy. Defaults to "every declared flag is set".
    pub fn policy(mut self, policy: ReadinessPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Validates the declaration and builds the aggregator.
    pub fn build(self) -> ReadinessResult<ReadinessAggregator> {
        if self.flags.is_empty() {
            return Err(ReadinessError::EmptyPolicy {
                aggregator: self.name,
            });
        }
        if self.flags.len() > MAX_FLAGS {
            return Err(ReadinessError::TooManyFlags {
                aggregator: self.name,
                count: self.flags.len(),
                max: MAX_FLAGS,
            });
        }
        for (index, flag) in self.flags.iter().enumerate() {
            if self.flags[..index].contains(flag) {
                return Err(ReadinessError::DuplicateFlag {
                    aggregator: self.name,
                    flag: flag.as_str().to_owned(),
                });
            }
        }

        let policy = self
            .policy
            .unwrap_or_else(|| ReadinessPolicy::all_of(self.flags.iter().copied()));
        let compiled = policy.compile(&self.name, &self.flags)?;
        debug!(
            "aggregator[{}]: built with flags={:?}",
            self.name, self.flags
        );
        Ok(ReadinessAggregator::from_core(AggregatorCore::new(
            self.name,
            self.flags,
            compiled,
            self.scheduler,
        )))
    }
}
