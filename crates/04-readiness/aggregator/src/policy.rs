//! Declarative composite predicates over named flags.

use signal_abi::{FlagMask, FlagName, ReadinessError, ReadinessResult};

/// How named flags combine into the "may proceed" predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadinessPolicy {
    /// True when the named flag is set.
    Flag(FlagName),
    /// True when every sub-policy holds. An empty list is true.
    All(Vec<ReadinessPolicy>),
    /// True when at least one sub-policy holds. An empty list is false.
    Any(Vec<ReadinessPolicy>),
}

impl ReadinessPolicy {
    /// Every listed flag must be set.
    pub fn all_of(flags: impl IntoIterator<Item = FlagName>) -> Self {
        ReadinessPolicy::All(flags.into_iter().map(ReadinessPolicy::Flag).collect())
    }

    /// At least one listed flag must be set.
    pub fn any_of(flags: impl IntoIterator<Item = FlagName>) -> Self {
        ReadinessPolicy::Any(flags.into_iter().map(ReadinessPolicy::Flag).collect())
    }

    /// Resolves flag names against the declared flag list.
    pub(crate) fn compile(
        &self,
        aggregator: &str,
        declared: &[FlagName],
    ) -> ReadinessResult<CompiledPolicy> {
        Ok(match self {
            ReadinessPolicy::Flag(name) => {
                let index = declared
                    .iter()
                    .position(|flag| flag == name)
                    .ok_or_else(|| ReadinessError::unknown_flag(aggregator, name.as_str()))?;
                CompiledPolicy::Bit(index)
            }
            ReadinessPolicy::All(parts) => CompiledPolicy::All(
                parts
                    .iter()
                    .map(|part| part.compile(aggregator, declared))
                    .collect::<ReadinessResult<_>>()?,
            ),
            ReadinessPolicy::Any(parts) => CompiledPolicy::Any(
                parts
                    .iter()
                    .map(|part| part.compile(aggregator, declared))
                    .collect::<ReadinessResult<_>>()?,
            ),
        })
    }
}

/// Policy with names resolved to bit positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CompiledPolicy {
    Bit(usize),
    All(Vec<CompiledPolicy>),
    Any(Vec<CompiledPolicy>),
}

impl CompiledPolicy {
    /// Pure function of the mask; no caching.
    pub(crate) fn evaluate(&self, mask: FlagMask) -> bool {
        match self {
            CompiledPolicy::Bit(index) => mask.contains_bit(*index),
            CompiledPolicy::All(parts) => parts.iter().all(|part| part.evaluate(mask)),
            CompiledPolicy::Any(parts) => parts.iter().any(|part| part.evaluate(mask)),
        }
    }
}
