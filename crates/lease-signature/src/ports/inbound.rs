//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::entities::{SignOutcome, SignRequest};
use crate::domain::errors::SignError;
use crate::domain::status::StatusAssessment;
use async_trait::async_trait;
use shared_types::{LeaseId, LeaseStatus};

/// Primary lease signature API.
///
/// Implementations must be thread-safe (`Send + Sync`); concurrent calls
/// for the same lease are expected.
#[async_trait]
pub trait LeaseSignatureApi: Send + Sync {
    /// Record the caller's signature on a lease.
    ///
    /// # Errors
    /// * `SignError::Validation` - missing artifact, unknown or closed lease
    /// * `SignError::Authorization` - caller may not sign (reason attached)
    /// * `SignError::Dependency` - proof generator, storage or data store failed
    /// * `SignError::Persistence` - a write failed after the proof was produced
    async fn sign(&self, request: SignRequest) -> Result<SignOutcome, SignError>;

    /// Status the lease would have given its current signers. Read-only.
    async fn assess_lease(&self, lease_id: LeaseId) -> Result<StatusAssessment, SignError>;

    /// Recompute and persist the lease status from its signers.
    ///
    /// Used after out-of-band roster edits. Lifecycle states past the
    /// signature phase are left untouched.
    async fn recompute_status(&self, lease_id: LeaseId) -> Result<LeaseStatus, SignError>;
}
