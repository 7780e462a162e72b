//! # Outbound Ports (Driven Ports / SPI)
//!
//! Traits that define dependencies this subsystem needs: the relational
//! store (signers, leases, profiles), the proof generator, the artifact
//! store, the event notifier, and a clock.

use crate::domain::entities::{LeaseSummary, Profile, Proof, ProofRequest, SignatureRecord, Signer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared_bus::LeaseEvent;
use shared_types::{LeaseId, LeaseStatus, ProfileId, SignerId};
use thiserror::Error;

// =============================================================================
// SIGNER STORE
// =============================================================================

/// Error from signer row operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerStoreError {
    /// The row to update does not exist.
    #[error("Signer not found: {0}")]
    NotFound(SignerId),

    /// A stored row could not be validated.
    #[error("Corrupt signer row: {0}")]
    Corrupt(String),

    /// The store rejected or failed the operation.
    #[error("Signer store error: {0}")]
    Backend(String),
}

/// Result of a conditional bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// The row was unbound and is now bound to the requested profile.
    Bound,
    /// Someone bound the row first.
    AlreadyBound(ProfileId),
}

/// Result of a conditional owner-row insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerInsert {
    /// The lease had no owner-family row; the new row is stored.
    Inserted,
    /// An owner-family row already exists; nothing was written.
    Exists(SignerId),
}

/// Result of a conditional mark-signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The row was pending and is now signed.
    Signed,
    /// The row was already signed; nothing was written.
    AlreadySigned,
}

/// Signer registry persistence. No business decisions happen here.
#[async_trait]
pub trait SignerStore: Send + Sync {
    /// All signer rows of a lease, in insertion order.
    async fn list_for_lease(&self, lease_id: LeaseId) -> Result<Vec<Signer>, SignerStoreError>;

    /// Insert an owner-family row only if the lease has none yet. The check
    /// and the insert are one atomic step.
    async fn insert_owner_if_absent(&self, signer: Signer)
        -> Result<OwnerInsert, SignerStoreError>;

    /// Bind `profile_id` to the row only if it is still unbound. The
    /// caller's email is recorded when the row carries none.
    async fn bind_if_unbound(
        &self,
        signer_id: SignerId,
        profile_id: ProfileId,
        email: &str,
    ) -> Result<BindOutcome, SignerStoreError>;

    /// Mark the row signed only if it is still pending.
    async fn mark_signed_if_pending(
        &self,
        signer_id: SignerId,
        record: SignatureRecord,
    ) -> Result<MarkOutcome, SignerStoreError>;
}

// =============================================================================
// LEASE STORE
// =============================================================================

/// Error from lease and profile reads or status writes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LeaseStoreError {
    #[error("Lease not found: {0}")]
    NotFound(LeaseId),

    #[error("Lease store error: {0}")]
    Backend(String),
}

/// Lease and profile reads, lease status writes.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    async fn lease_summary(&self, lease_id: LeaseId)
        -> Result<Option<LeaseSummary>, LeaseStoreError>;

    async fn profile(&self, profile_id: ProfileId) -> Result<Option<Profile>, LeaseStoreError>;

    async fn update_status(
        &self,
        lease_id: LeaseId,
        status: LeaseStatus,
    ) -> Result<(), LeaseStoreError>;
}

// =============================================================================
// PROOF GENERATOR
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProofError {
    #[error("Proof generator unavailable: {0}")]
    Unavailable(String),

    #[error("Proof request rejected: {0}")]
    Rejected(String),
}

/// External service producing a legally meaningful proof of signature.
#[async_trait]
pub trait ProofGenerator: Send + Sync {
    async fn generate_proof(&self, request: ProofRequest<'_>) -> Result<Proof, ProofError>;
}

// =============================================================================
// ARTIFACT STORE
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArtifactStoreError {
    #[error("Artifact upload failed for {path}: {reason}")]
    Upload { path: String, reason: String },
}

/// Object storage for signature images. `store` overwrites an existing
/// object at the same path.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn store(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ArtifactStoreError>;
}

// =============================================================================
// EVENT NOTIFIER
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),

    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Receives milestone events. Failures are logged by the caller and never
/// fail a signature.
#[async_trait]
pub trait SignatureNotifier: Send + Sync {
    async fn notify(&self, event: LeaseEvent) -> Result<(), NotifyError>;
}

// =============================================================================
// CLOCK
// =============================================================================

/// Time source for signature timestamps.
///
/// Abstracted to allow testing with deterministic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Default system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
