//! # Signature Errors
//!
//! Classified failures of the `Sign` operation.
//!
//! | Class         | Meaning                                   | Propagated |
//! |---------------|-------------------------------------------|------------|
//! | Validation    | request is malformed or lease unusable    | yes        |
//! | Authorization | caller may not sign (with reason)         | yes        |
//! | Dependency    | proof / storage / data store unavailable  | yes        |
//! | Persistence   | a write failed after external side effects| yes        |
//! | Notification  | event delivery failed                     | never      |

use shared_types::{LeaseId, LeaseStatus, SignerId};
use thiserror::Error;

/// Top-level error returned by [`crate::LeaseSignatureApi::sign`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Signature refused: {0}")]
    Authorization(#[from] Refusal),

    #[error("Dependency failure: {0}")]
    Dependency(#[from] DependencyError),

    /// A write failed after the proof and artifact were produced.
    #[error("Persistence failure during {operation}: {reason}")]
    Persistence {
        operation: PersistenceOp,
        signer_id: Option<SignerId>,
        reason: String,
    },
}

impl SignError {
    /// Whether the client may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Dependency(_) | Self::Persistence { .. })
    }

    /// Short label used for metrics and logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authorization(_) => "authorization",
            Self::Dependency(_) => "dependency",
            Self::Persistence { .. } => "persistence",
        }
    }

    /// Message safe to show to the end user. "Not allowed" and "something
    /// went wrong" stay distinguishable.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Authorization(refusal) => refusal.to_string(),
            Self::Dependency(_) | Self::Persistence { .. } => {
                "Something went wrong while recording your signature, please retry".to_string()
            }
        }
    }
}

/// Request or lease state rejected before any side effect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("signature image is required")]
    MissingSignature,

    #[error("signature image is empty")]
    EmptySignature,

    #[error("signature must be an image, got {0:?}")]
    UnsupportedContentType(String),

    #[error("lease {0} not found")]
    LeaseNotFound(LeaseId),

    #[error("lease {lease_id} is {status} and no longer accepts signatures")]
    LeaseClosed { lease_id: LeaseId, status: LeaseStatus },
}

/// Why the caller may not sign. Display strings are user-facing.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum Refusal {
    #[error("already signed")]
    AlreadySigned,

    #[error("not authorized to sign this lease")]
    NotAuthorized,

    #[error("signature slot already bound to another identity")]
    AlreadyBound,
}

impl Refusal {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::AlreadySigned => "already_signed",
            Self::NotAuthorized => "not_authorized",
            Self::AlreadyBound => "already_bound",
        }
    }
}

/// An external collaborator failed or timed out.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DependencyError {
    #[error("data store: {0}")]
    DataStore(String),

    #[error("proof generation: {0}")]
    ProofGeneration(String),

    #[error("artifact storage: {0}")]
    ArtifactStorage(String),

    #[error("{operation} timed out after {after_ms} ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },
}

/// Write that failed in a [`SignError::Persistence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOp {
    CreateSigner,
    MarkSigned,
    UpdateLeaseStatus,
}

impl std::fmt::Display for PersistenceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CreateSigner => "create_signer",
            Self::MarkSigned => "mark_signed",
            Self::UpdateLeaseStatus => "update_lease_status",
        })
    }
}

/// A stored signer row failed validation at the storage boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowValidationError {
    #[error("signer {signer_id}: {source}")]
    Field {
        signer_id: String,
        #[source]
        source: shared_types::ParseError,
    },

    #[error("signer {signer_id}: signed row has no signed_at timestamp")]
    MissingSignedAt { signer_id: String },
}
