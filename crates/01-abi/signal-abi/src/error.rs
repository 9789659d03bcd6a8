use thiserror::Error;

/// Result alias used by every readiness primitive.
pub type ReadinessResult<T> = Result<T, ReadinessError>;

/// Invariant violations and configuration errors raised by readiness primitives.
///
/// None of these are recoverable at the call site: a double fire or an unknown
/// flag means the owning subsystem is wired incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    /// A one-shot signal was fired a second time.
    #[error("signal `{signal}` is already satisfied; second fire rejected")]
    AlreadySatisfied {
        /// Name of the signal that was fired twice.
        signal: String,
    },

    /// An aggregator was given a flag name it never declared.
    #[error("aggregator `{aggregator}` has no flag named `{flag}`")]
    UnknownFlag {
        /// Name of the aggregator.
        aggregator: String,
        /// The undeclared flag name.
        flag: String,
    },

    /// The same flag was declared twice on one aggregator.
    #[error("flag `{flag}` declared twice on aggregator `{aggregator}`")]
    DuplicateFlag {
        /// Name of the aggregator.
        aggregator: String,
        /// The repeated flag name.
        flag: String,
    },

    /// More flags were declared than fit in a [`crate::FlagMask`].
    #[error("aggregator `{aggregator}` declares {count} flags; at most {max} fit in a mask")]
    TooManyFlags {
        /// Name of the aggregator.
        aggregator: String,
        /// Number of declared flags.
        count: usize,
        /// Capacity of the mask.
        max: usize,
    },

    /// An aggregator was built without any flags.
    #[error("aggregator `{aggregator}` declares no flags")]
    EmptyPolicy {
        /// Name of the aggregator.
        aggregator: String,
    },

    /// A content load was completed without being started.
    #[error("no content load in flight")]
    NoLoadInFlight,
}

impl ReadinessError {
    /// Builds an [`ReadinessError::AlreadySatisfied`] for `signal`.
    pub fn already_satisfied(signal: impl Into<String>) -> Self {
        ReadinessError::AlreadySatisfied {
            signal: signal.into(),
        }
    }

    /// Builds an [`ReadinessError::UnknownFlag`].
    pub fn unknown_flag(aggregator: impl Into<String>, flag: impl Into<String>) -> Self {
        ReadinessError::UnknownFlag {
            aggregator: aggregator.into(),
            flag: flag.into(),
        }
    }

    /// Returns `true` for errors caused by static wiring rather than runtime ordering.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ReadinessError::UnknownFlag { .. }
                | ReadinessError::DuplicateFlag { .. }
                | ReadinessError::TooManyFlags { .. }
                | ReadinessError::EmptyPolicy { .. }
        )
    }
}
