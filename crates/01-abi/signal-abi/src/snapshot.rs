use crate::flags::{FlagMask, FlagName};
use serde::Serialize;

/// State of a single named flag inside a [`ReadinessSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FlagState {
    /// Flag name.
    pub name: FlagName,
    /// Whether the flag is currently set.
    pub set: bool,
}

/// Point-in-time view of an aggregator, used for debug dumps and inspectors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReadinessSnapshot {
    /// Name of the aggregator the snapshot was taken from.
    pub aggregator: String,
    /// Scheduling step at which the snapshot was taken.
    pub step: u64,
    /// Raw bitmask.
    pub mask: FlagMask,
    /// Flags in declaration order.
    pub flags: Vec<FlagState>,
    /// Composite predicate value.
    pub may_proceed: bool,
}

impl ReadinessSnapshot {
    /// Names of the flags that are still unset, in declaration order.
    pub fn missing(&self) -> Vec<FlagName> {
        self.flags
            .iter()
            .filter(|flag| !flag.set)
            .map(|flag| flag.name)
            .collect()
    }
}
