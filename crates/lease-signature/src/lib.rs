//! # Lease Signature Core
//!
//! Signature workflow and status determination for rental leases: who may
//! sign, binding of invited or placeholder signer slots to an identity,
//! signature recording with an external proof, lease status derivation and
//! milestone events.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): rights decision, status machine, milestone
//!   planning, storage-row validation. No I/O.
//! - **Ports Layer** (`ports/`): inbound `LeaseSignatureApi`, outbound store,
//!   proof, artifact and notifier traits
//! - **Service Layer** (`service/`): orchestrates a sign request over the ports
//! - **Adapters** (`adapters/`): in-memory stores, SHA-256 proof generator,
//!   event bus notifier
//!
//! ## Guarantees
//!
//! - A signer row is bound to at most one identity, and only once
//! - A signer row is signed at most once; a lost race is refused, never
//!   overwritten
//! - The stored lease status is recomputed under a per-lease lock and never
//!   downgrades a lease that moved past the signature phase
//! - Milestone delivery failures never fail a signature

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

/// Test utilities (FixedClock, fault-injecting adapters, LeaseFixture)
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export public API
pub use adapters::bus::BusNotifier;
pub use adapters::memory::{
    InMemoryArtifactStore, InMemoryLeaseStore, InMemorySignerStore, Seed, SeedError,
};
pub use adapters::proof::Sha256ProofGenerator;
pub use domain::config::SignatureConfig;
pub use domain::entities::{
    Caller, ClientMetadata, IdentityMethod, LeaseDocument, LeaseSummary, Party, Profile, Proof,
    ProofRequest, SignOutcome, SignRequest, SignatureArtifact, SignatureRecord, SignatureRights,
    Signer,
};
pub use domain::errors::{
    DependencyError, PersistenceOp, Refusal, RowValidationError, SignError, ValidationError,
};
pub use domain::records::SignerRow;
pub use domain::status::{assess, compute_status, StatusAnomaly, StatusAssessment};
pub use ports::inbound::LeaseSignatureApi;
pub use ports::outbound::{
    ArtifactStore, ArtifactStoreError, BindOutcome, Clock, LeaseStore, LeaseStoreError,
    MarkOutcome, NotifyError, OwnerInsert, ProofError, ProofGenerator, SignatureNotifier,
    SignerStore, SignerStoreError, SystemClock,
};
pub use service::{LeaseLocks, LeaseSignatureService, SignatureDependencies};
