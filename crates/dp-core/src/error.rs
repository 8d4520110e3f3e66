//! Error type shared by builders and mechanisms
//!
//! Two classes of failure exist:
//! - configuration errors, raised while building a mechanism
//! - argument errors, raised by per-call operations such as
//!   [`crate::NumericalMechanism::noise_confidence_interval`]
//!
//! Both are recoverable. The message is part of the contract: callers and
//! tests match on its prefix (e.g. `"Epsilon has to be set"`).

use serde::{Deserialize, Serialize};

/// Error kind, for callers that only care about the failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed epsilon / delta / sensitivity at build time
    InvalidConfiguration,
    /// Malformed privacy budget or confidence level at call time
    InvalidArgument,
}

/// Error type for mechanism construction and use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum MechanismError {
    /// The builder configuration was rejected
    #[error("{0}")]
    InvalidConfiguration(String),
    /// A per-call argument was rejected
    #[error("{0}")]
    InvalidArgument(String),
}

impl MechanismError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MechanismError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            MechanismError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Human-readable message, without any prefix added by `Display`
    pub fn message(&self) -> &str {
        match self {
            MechanismError::InvalidConfiguration(msg) | MechanismError::InvalidArgument(msg) => msg,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MechanismError>;
