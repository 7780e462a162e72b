//! # Error Types
//!
//! Parsing failures raised when raw store values are normalized.

use thiserror::Error;

/// A raw value could not be mapped onto one of the shared enums.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Role spelling is not one of the known owner/tenant/guarantor forms.
    #[error("Unknown signer role: {0:?}")]
    UnknownRole(String),

    /// Signature status is neither pending nor signed.
    #[error("Unknown signature status: {0:?}")]
    UnknownSignatureStatus(String),

    /// Lease status is not a known lifecycle state.
    #[error("Unknown lease status: {0:?}")]
    UnknownLeaseStatus(String),

    /// Identifier is not a valid UUID.
    #[error("Invalid identifier {value:?}: {reason}")]
    InvalidId { value: String, reason: String },
}
