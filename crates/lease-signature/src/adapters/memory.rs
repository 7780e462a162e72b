//! # In-Memory Adapters
//!
//! Reference implementations of the store ports, used by the runtime binary
//! and by tests. Conditional updates take the write lock for the whole
//! check-and-set, which gives them the atomicity a relational `UPDATE ...
//! WHERE profile_id IS NULL` has.

use crate::domain::entities::{LeaseSummary, Profile, SignatureRecord, Signer};
use crate::domain::errors::RowValidationError;
use crate::domain::records::SignerRow;
use crate::ports::outbound::{
    ArtifactStore, ArtifactStoreError, BindOutcome, LeaseStore, LeaseStoreError, MarkOutcome,
    OwnerInsert, SignerStore, SignerStoreError,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use shared_types::{LeaseId, LeaseStatus, ProfileId, SignatureStatus, SignerId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;

// =============================================================================
// SIGNER STORE
// =============================================================================

/// Signer rows kept in insertion order.
#[derive(Default)]
pub struct InMemorySignerStore {
    rows: RwLock<Vec<Signer>>,
}

impl InMemorySignerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signers(signers: Vec<Signer>) -> Self {
        Self {
            rows: RwLock::new(signers),
        }
    }

    /// Insert without the duplicate check, for fixtures.
    pub fn push(&self, signer: Signer) {
        self.rows.write().push(signer);
    }

    /// Snapshot of one row.
    pub fn get(&self, signer_id: SignerId) -> Option<Signer> {
        self.rows.read().iter().find(|s| s.id == signer_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl SignerStore for InMemorySignerStore {
    async fn list_for_lease(&self, lease_id: LeaseId) -> Result<Vec<Signer>, SignerStoreError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|s| s.lease_id == lease_id)
            .cloned()
            .collect())
    }

    async fn insert_owner_if_absent(
        &self,
        signer: Signer,
    ) -> Result<OwnerInsert, SignerStoreError> {
        let mut rows = self.rows.write();
        if rows.iter().any(|s| s.id == signer.id) {
            return Err(SignerStoreError::Backend(format!(
                "duplicate signer id {}",
                signer.id
            )));
        }
        let existing = rows
            .iter()
            .find(|s| s.lease_id == signer.lease_id && s.role.is_owner_family());
        if let Some(existing) = existing {
            return Ok(OwnerInsert::Exists(existing.id));
        }
        debug!(signer_id = %signer.id, lease_id = %signer.lease_id, role = %signer.role, "Signer inserted");
        rows.push(signer);
        Ok(OwnerInsert::Inserted)
    }

    async fn bind_if_unbound(
        &self,
        signer_id: SignerId,
        profile_id: ProfileId,
        email: &str,
    ) -> Result<BindOutcome, SignerStoreError> {
        let mut rows = self.rows.write();
        let row = rows
            .iter_mut()
            .find(|s| s.id == signer_id)
            .ok_or(SignerStoreError::NotFound(signer_id))?;

        if let Some(existing) = row.profile_id {
            return Ok(BindOutcome::AlreadyBound(existing));
        }
        row.profile_id = Some(profile_id);
        if row.invited_email.is_none() {
            row.invited_email = Some(email.trim().to_string());
        }
        Ok(BindOutcome::Bound)
    }

    async fn mark_signed_if_pending(
        &self,
        signer_id: SignerId,
        record: SignatureRecord,
    ) -> Result<MarkOutcome, SignerStoreError> {
        let mut rows = self.rows.write();
        let row = rows
            .iter_mut()
            .find(|s| s.id == signer_id)
            .ok_or(SignerStoreError::NotFound(signer_id))?;

        if row.is_signed() {
            return Ok(MarkOutcome::AlreadySigned);
        }
        row.status = SignatureStatus::Signed;
        row.signature = Some(record);
        Ok(MarkOutcome::Signed)
    }
}

// =============================================================================
// LEASE STORE
// =============================================================================

/// Leases and profiles.
#[derive(Default)]
pub struct InMemoryLeaseStore {
    leases: RwLock<HashMap<LeaseId, LeaseSummary>>,
    profiles: RwLock<HashMap<ProfileId, Profile>>,
    status_writes: AtomicU64,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_lease(&self, lease: LeaseSummary) {
        self.leases.write().insert(lease.id, lease);
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.profiles.write().insert(profile.id, profile);
    }

    pub fn status_of(&self, lease_id: LeaseId) -> Option<LeaseStatus> {
        self.leases.read().get(&lease_id).map(|l| l.status)
    }

    /// Number of status writes performed, for asserting write suppression.
    pub fn status_writes(&self) -> u64 {
        self.status_writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn lease_summary(
        &self,
        lease_id: LeaseId,
    ) -> Result<Option<LeaseSummary>, LeaseStoreError> {
        Ok(self.leases.read().get(&lease_id).cloned())
    }

    async fn profile(&self, profile_id: ProfileId) -> Result<Option<Profile>, LeaseStoreError> {
        Ok(self.profiles.read().get(&profile_id).cloned())
    }

    async fn update_status(
        &self,
        lease_id: LeaseId,
        status: LeaseStatus,
    ) -> Result<(), LeaseStoreError> {
        let mut leases = self.leases.write();
        let lease = leases
            .get_mut(&lease_id)
            .ok_or(LeaseStoreError::NotFound(lease_id))?;
        lease.status = status;
        self.status_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// =============================================================================
// ARTIFACT STORE
// =============================================================================

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Object storage keyed by path. Uploads to an existing path overwrite.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    objects: RwLock<HashMap<String, StoredArtifact>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<StoredArtifact> {
        self.objects.read().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn store(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(), ArtifactStoreError> {
        if path.is_empty() {
            return Err(ArtifactStoreError::Upload {
                path: path.to_string(),
                reason: "empty path".to_string(),
            });
        }
        self.objects.write().insert(
            path.to_string(),
            StoredArtifact {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

// =============================================================================
// SEED
// =============================================================================

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid seed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid signer row: {0}")]
    Row(#[from] RowValidationError),

    #[error("Signer {signer_id} references unknown lease {lease_id}")]
    UnknownLease { signer_id: SignerId, lease_id: LeaseId },
}

/// Initial content of the in-memory stores.
///
/// ```json
/// {
///   "profiles": [{ "id": "...", "first_name": "Jeanne", "email": "j@x.fr" }],
///   "leases":   [{ "id": "...", "status": "pending_signature", "property_id": "...",
///                  "property_address": "...", "owner_profile_id": "..." }],
///   "signers":  [{ "id": "...", "lease_id": "...", "role": "locataire",
///                  "invited_email": "t@x.fr" }]
/// }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub leases: Vec<LeaseSummary>,
    #[serde(default)]
    pub signers: Vec<SignerRow>,
}

impl Seed {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Validate every row and build the stores.
    pub fn into_stores(self) -> Result<(InMemoryLeaseStore, InMemorySignerStore), SeedError> {
        let lease_store = InMemoryLeaseStore::new();
        for profile in self.profiles {
            lease_store.insert_profile(profile);
        }
        for lease in self.leases {
            lease_store.insert_lease(lease);
        }

        let mut signers = Vec::with_capacity(self.signers.len());
        for row in self.signers {
            let signer = Signer::try_from(row)?;
            if lease_store.status_of(signer.lease_id).is_none() {
                return Err(SeedError::UnknownLease {
                    signer_id: signer.id,
                    lease_id: signer.lease_id,
                });
            }
            signers.push(signer);
        }

        Ok((lease_store, InMemorySignerStore::with_signers(signers)))
    }
}
