//! Error types for mining-core operations

use crate::session::SessionState;
use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, MinerError>;

/// Errors that can occur while driving the mining core
#[derive(Debug, Error)]
pub enum MinerError {
    /// Malformed parameters (wrong word counts, bad register address)
    #[error("Validation failed: {reason}")]
    Validation {
        /// What failed to validate
        reason: String,
    },

    /// Compact difficulty encoding does not denote a valid target
    #[error("Invalid difficulty encoding {bits:#010x}: {reason}")]
    InvalidDifficultyEncoding {
        /// The rejected compact encoding
        bits: u32,
        /// Why it was rejected
        reason: String,
    },

    /// Operation invoked from the wrong session state
    #[error("Invalid state transition: {operation} not legal from {from}")]
    InvalidTransition {
        /// State the session was in
        from: SessionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Hardware reported found and not-found simultaneously
    #[error("Inconsistent status: found={raw_found:#x} not_found={raw_not_found:#x}")]
    InconsistentStatus {
        /// Raw STATUS_FOUND read
        raw_found: u32,
        /// Raw STATUS_NOT_FOUND read
        raw_not_found: u32,
    },

    /// Transport-level register access failure
    #[error("Hardware fault: {reason}")]
    HardwareFault {
        /// Reason for failure
        reason: String,
    },

    /// I/O error while opening or mapping the device window
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl MinerError {
    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Create an invalid difficulty encoding error
    pub fn invalid_encoding(bits: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDifficultyEncoding {
            bits,
            reason: reason.into(),
        }
    }

    /// Create a hardware fault
    pub fn hardware_fault(reason: impl Into<String>) -> Self {
        Self::HardwareFault {
            reason: reason.into(),
        }
    }
}
