//! Test utilities for the signature service.
//!
//! Deterministic clock, fault-injecting adapters and a lease fixture wired
//! to the in-memory stores. Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use lease_signature::test_utils::LeaseFixture;
//! use shared_types::SignerRole;
//!
//! let fixture = LeaseFixture::new();
//! fixture.owner_row();
//! fixture.invited_tenant(SignerRole::PrincipalTenant);
//! let service = fixture.service();
//! # let _ = service;
//! ```

use crate::adapters::memory::{InMemoryArtifactStore, InMemoryLeaseStore, InMemorySignerStore};
use crate::adapters::proof::Sha256ProofGenerator;
use crate::domain::config::SignatureConfig;
use crate::domain::entities::{
    Caller, ClientMetadata, LeaseSummary, Profile, Proof, ProofRequest, SignRequest,
    SignatureArtifact, SignatureRecord, Signer,
};
use crate::ports::outbound::{
    ArtifactStore, ArtifactStoreError, BindOutcome, Clock, MarkOutcome, NotifyError,
    OwnerInsert, ProofError, ProofGenerator, SignatureNotifier, SignerStore, SignerStoreError,
};
use crate::service::{LeaseSignatureService, SignatureDependencies};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use shared_bus::LeaseEvent;
use shared_types::{LeaseId, LeaseStatus, ProfileId, PropertyId, SignerId, SignerRole};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Bytes standing in for a drawn signature (PNG magic number).
pub const SAMPLE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

// =============================================================================
// CLOCK
// =============================================================================

/// A clock that returns a fixed instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

// =============================================================================
// PROOF / ARTIFACT DOUBLES
// =============================================================================

/// Proof generator that always fails.
pub struct FailingProofGenerator;

#[async_trait]
impl ProofGenerator for FailingProofGenerator {
    async fn generate_proof(&self, _request: ProofRequest<'_>) -> Result<Proof, ProofError> {
        Err(ProofError::Unavailable("proof service down".to_string()))
    }
}

/// Proof generator that never answers.
pub struct StalledProofGenerator;

#[async_trait]
impl ProofGenerator for StalledProofGenerator {
    async fn generate_proof(&self, _request: ProofRequest<'_>) -> Result<Proof, ProofError> {
        std::future::pending().await
    }
}

/// Proof generator counting calls before delegating to SHA-256.
#[derive(Default)]
pub struct CountingProofGenerator {
    inner: Sha256ProofGenerator,
    calls: AtomicUsize,
}

impl CountingProofGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofGenerator for CountingProofGenerator {
    async fn generate_proof(&self, request: ProofRequest<'_>) -> Result<Proof, ProofError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_proof(request).await
    }
}

/// Artifact store that rejects every upload.
pub struct FailingArtifactStore;

#[async_trait]
impl ArtifactStore for FailingArtifactStore {
    async fn store(
        &self,
        path: &str,
        _bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), ArtifactStoreError> {
        Err(ArtifactStoreError::Upload {
            path: path.to_string(),
            reason: "bucket unavailable".to_string(),
        })
    }
}

// =============================================================================
// NOTIFIER
// =============================================================================

/// Notifier recording every event; optionally failing some kinds.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<LeaseEvent>>,
    failing_kinds: Mutex<Vec<&'static str>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject events of `kind` (e.g. `"lease.owner_signed"`).
    pub fn fail_kind(&self, kind: &'static str) {
        self.failing_kinds.lock().push(kind);
    }

    /// Events accepted so far.
    pub fn events(&self) -> Vec<LeaseEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(LeaseEvent::kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl SignatureNotifier for RecordingNotifier {
    async fn notify(&self, event: LeaseEvent) -> Result<(), NotifyError> {
        if self.failing_kinds.lock().contains(&event.kind()) {
            return Err(NotifyError::Unavailable("smtp relay refused".to_string()));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

// =============================================================================
// SIGNER STORE WITH INTERFERENCE
// =============================================================================

/// Wraps the in-memory signer store and lets a test inject a competing
/// write just before the service's conditional update, or fail writes.
pub struct InterferingSignerStore {
    inner: Arc<InMemorySignerStore>,
    bind_first: Mutex<Option<ProfileId>>,
    insert_first: Mutex<Option<ProfileId>>,
    sign_first: AtomicBool,
    fail_insert: AtomicBool,
    fail_mark: AtomicBool,
}

impl InterferingSignerStore {
    pub fn new(inner: Arc<InMemorySignerStore>) -> Self {
        Self {
            inner,
            bind_first: Mutex::new(None),
            insert_first: Mutex::new(None),
            sign_first: AtomicBool::new(false),
            fail_insert: AtomicBool::new(false),
            fail_mark: AtomicBool::new(false),
        }
    }

    /// The next bind loses to `profile_id`.
    pub fn bind_first_as(&self, profile_id: ProfileId) {
        *self.bind_first.lock() = Some(profile_id);
    }

    /// The next owner-row insert finds a row bound to `profile_id` already
    /// in place.
    pub fn insert_first_as(&self, profile_id: ProfileId) {
        *self.insert_first.lock() = Some(profile_id);
    }

    /// The next mark-signed finds the row already signed.
    pub fn sign_first(&self) {
        self.sign_first.store(true, Ordering::SeqCst);
    }

    pub fn fail_insert(&self) {
        self.fail_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_mark(&self) {
        self.fail_mark.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SignerStore for InterferingSignerStore {
    async fn list_for_lease(&self, lease_id: LeaseId) -> Result<Vec<Signer>, SignerStoreError> {
        self.inner.list_for_lease(lease_id).await
    }

    async fn insert_owner_if_absent(
        &self,
        signer: Signer,
    ) -> Result<OwnerInsert, SignerStoreError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(SignerStoreError::Backend("insert rejected".to_string()));
        }
        let competitor = self.insert_first.lock().take();
        if let Some(competitor) = competitor {
            let rival = Signer::bound(signer.lease_id, competitor, signer.role);
            self.inner.insert_owner_if_absent(rival).await?;
        }
        self.inner.insert_owner_if_absent(signer).await
    }

    async fn bind_if_unbound(
        &self,
        signer_id: SignerId,
        profile_id: ProfileId,
        email: &str,
    ) -> Result<BindOutcome, SignerStoreError> {
        let competitor = self.bind_first.lock().take();
        if let Some(competitor) = competitor {
            self.inner
                .bind_if_unbound(signer_id, competitor, "competitor@example.fr")
                .await?;
        }
        self.inner.bind_if_unbound(signer_id, profile_id, email).await
    }

    async fn mark_signed_if_pending(
        &self,
        signer_id: SignerId,
        record: SignatureRecord,
    ) -> Result<MarkOutcome, SignerStoreError> {
        if self.fail_mark.load(Ordering::SeqCst) {
            return Err(SignerStoreError::Backend("connection reset".to_string()));
        }
        if self.sign_first.swap(false, Ordering::SeqCst) {
            let mut competing = record.clone();
            competing.proof_id = format!("{}-competing", record.proof_id);
            self.inner.mark_signed_if_pending(signer_id, competing).await?;
        }
        self.inner.mark_signed_if_pending(signer_id, record).await
    }
}

// =============================================================================
// FIXTURE
// =============================================================================

/// A pending lease with an owner and a tenant profile, wired to in-memory
/// adapters.
pub struct LeaseFixture {
    pub lease: LeaseSummary,
    pub owner: Profile,
    pub tenant: Profile,
    pub leases: Arc<InMemoryLeaseStore>,
    pub signers: Arc<InMemorySignerStore>,
    pub artifacts: Arc<InMemoryArtifactStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
}

impl Default for LeaseFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaseFixture {
    pub fn new() -> Self {
        let owner = profile("Olivier", "Marchand", "olivier@example.fr");
        let tenant = profile("Tess", "Leroy", "tess@example.fr");
        let lease = LeaseSummary {
            id: LeaseId::new(),
            status: LeaseStatus::PendingSignature,
            property_id: PropertyId::new(),
            property_address: "12 rue des Lilas, 69003 Lyon".to_string(),
            owner_profile_id: Some(owner.id),
        };

        let leases = Arc::new(InMemoryLeaseStore::new());
        leases.insert_lease(lease.clone());
        leases.insert_profile(owner.clone());
        leases.insert_profile(tenant.clone());

        Self {
            lease,
            owner,
            tenant,
            leases,
            signers: Arc::new(InMemorySignerStore::new()),
            artifacts: Arc::new(InMemoryArtifactStore::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            clock: Arc::new(FixedClock::default()),
        }
    }

    pub fn with_status(self, status: LeaseStatus) -> Self {
        let mut lease = self.lease.clone();
        lease.status = status;
        self.leases.insert_lease(lease.clone());
        Self { lease, ..self }
    }

    pub fn add_signer(&self, signer: Signer) -> Signer {
        self.signers.push(signer.clone());
        signer
    }

    /// Unbound owner row.
    pub fn owner_row(&self) -> Signer {
        self.add_signer(Signer::placeholder(self.lease.id, SignerRole::Owner))
    }

    /// Unbound row invited under the tenant's email.
    pub fn invited_tenant(&self, role: SignerRole) -> Signer {
        let email = self.tenant.email.clone().unwrap_or_default();
        self.add_signer(Signer::invited(self.lease.id, role, &email, Some("Tess Leroy")))
    }

    pub fn owner_caller(&self) -> Caller {
        caller(&self.owner)
    }

    pub fn tenant_caller(&self) -> Caller {
        caller(&self.tenant)
    }

    pub fn request(&self, caller: Caller) -> SignRequest {
        SignRequest {
            lease_id: self.lease.id,
            caller,
            signature: Some(SignatureArtifact::png(SAMPLE_PNG.to_vec())),
            client: ClientMetadata {
                user_agent: Some("Mozilla/5.0 (test)".to_string()),
                ip_address: Some("203.0.113.7".to_string()),
                ..ClientMetadata::default()
            },
        }
    }

    pub fn dependencies(&self) -> SignatureDependencies {
        SignatureDependencies {
            signers: self.signers.clone(),
            leases: self.leases.clone(),
            proofs: Arc::new(Sha256ProofGenerator::with_clock(self.clock.clone())),
            artifacts: self.artifacts.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn service(&self) -> LeaseSignatureService {
        LeaseSignatureService::new(self.dependencies(), SignatureConfig::default())
    }

    pub fn service_with(&self, deps: SignatureDependencies) -> LeaseSignatureService {
        LeaseSignatureService::new(deps, SignatureConfig::default())
    }

    pub fn signer(&self, id: SignerId) -> Signer {
        self.signers
            .get(id)
            .unwrap_or_else(|| panic!("signer {id} not in fixture"))
    }

    pub fn status(&self) -> LeaseStatus {
        self.leases.status_of(self.lease.id).unwrap_or_default()
    }
}

pub fn profile(first: &str, last: &str, email: &str) -> Profile {
    Profile {
        id: ProfileId::new(),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        email: Some(email.to_string()),
        identity_document_on_file: false,
    }
}

pub fn caller(profile: &Profile) -> Caller {
    Caller {
        profile_id: profile.id,
        email: profile.email.clone().unwrap_or_default(),
    }
}
