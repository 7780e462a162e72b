//! # Concurrency Tests
//!
//! Competing requests on one lease, on a multi-threaded runtime:
//!
//! - Two requests for the same signer slot: one signature, one refusal
//! - Two strangers claiming the only placeholder: one binding
//! - Owner and tenant finishing together: exactly one completion
//! - Two owner requests on a lease without an owner row: one row, one signature

use std::sync::Arc;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future::join_all;
use lease_signature::test_utils::{caller, profile, LeaseFixture, SAMPLE_PNG};
use lease_signature::{
    BindOutcome, InMemorySignerStore, LeaseSignatureApi, MarkOutcome, OwnerInsert, Refusal,
    SignError, SignatureArtifact, SignatureRecord, Signer, SignerStore, SignerStoreError,
};
use shared_types::{LeaseId, LeaseStatus, ProfileId, SignerId, SignerRole};
use tokio::sync::Barrier;

use super::support::BusHarness;

/// Holds the first `parties` roster reads until all of them arrived, so
/// every request decides on the same snapshot.
struct RendezvousSignerStore {
    inner: Arc<InMemorySignerStore>,
    barrier: Barrier,
    parties: usize,
    reads: AtomicUsize,
}

impl RendezvousSignerStore {
    fn new(inner: Arc<InMemorySignerStore>, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SignerStore for RendezvousSignerStore {
    async fn list_for_lease(&self, lease_id: LeaseId) -> Result<Vec<Signer>, SignerStoreError> {
        let snapshot = self.inner.list_for_lease(lease_id).await;
        if self.reads.fetch_add(1, Ordering::SeqCst) < self.parties {
            self.barrier.wait().await;
        }
        snapshot
    }

    async fn insert_owner_if_absent(
        &self,
        signer: Signer,
    ) -> Result<OwnerInsert, SignerStoreError> {
        self.inner.insert_owner_if_absent(signer).await
    }

    async fn bind_if_unbound(
        &self,
        signer_id: SignerId,
        profile_id: ProfileId,
        email: &str,
    ) -> Result<BindOutcome, SignerStoreError> {
        self.inner.bind_if_unbound(signer_id, profile_id, email).await
    }

    async fn mark_signed_if_pending(
        &self,
        signer_id: SignerId,
        record: SignatureRecord,
    ) -> Result<MarkOutcome, SignerStoreError> {
        self.inner.mark_signed_if_pending(signer_id, record).await
    }
}

fn drawing(stroke: u8) -> Vec<u8> {
    let mut bytes = SAMPLE_PNG.to_vec();
    bytes.push(stroke);
    bytes
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_double_sign_records_once() {
    let fixture = LeaseFixture::new();
    fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.owner.id,
        SignerRole::Owner,
    ));
    let tenant_row = fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.tenant.id,
        SignerRole::PrincipalTenant,
    ));
    let harness = BusHarness::new(fixture);

    // Each contender draws a different image.
    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let service = Arc::clone(&harness.service);
            let mut request = harness.fixture.request(harness.fixture.tenant_caller());
            request.signature = Some(SignatureArtifact::png(drawing(i)));
            tokio::spawn(async move { service.sign(request).await })
        })
        .collect();
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = results
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.as_ref().ok().map(|outcome| (i, outcome)))
        .collect();
    assert_eq!(winners.len(), 1);
    let (winner_index, winner) = winners[0];
    for result in results.iter().filter(|r| r.is_err()) {
        assert_eq!(
            result.as_ref().unwrap_err(),
            &SignError::Authorization(Refusal::AlreadySigned)
        );
    }

    // The stored record and its image both belong to the winner.
    let record = harness.fixture.signer(tenant_row.id).signature.unwrap();
    assert_eq!(record.proof_id, winner.proof_id);
    let stored = harness.fixture.artifacts.get(&record.artifact_path).unwrap();
    assert_eq!(stored.bytes, drawing(winner_index as u8));
    assert_eq!(harness.published_kinds(), ["lease.tenant_signed"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placeholder_claims_bind_once() {
    let fixture = LeaseFixture::new();
    let slot = fixture.add_signer(Signer::placeholder(
        fixture.lease.id,
        SignerRole::CoTenant,
    ));
    let contenders: Vec<_> = (0..6)
        .map(|i| {
            let p = profile("Coloc", &format!("N{i}"), &format!("coloc{i}@example.fr"));
            fixture.leases.insert_profile(p.clone());
            p
        })
        .collect();
    let harness = BusHarness::new(fixture);

    let handles: Vec<_> = contenders
        .iter()
        .map(|p| {
            let service = Arc::clone(&harness.service);
            let request = harness.fixture.request(caller(p));
            tokio::spawn(async move { service.sign(request).await })
        })
        .collect();
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(SignError::Authorization(
                Refusal::NotAuthorized | Refusal::AlreadyBound
            ))
        ));
    }

    let row = harness.fixture.signer(slot.id);
    let winner = row.profile_id.unwrap();
    assert!(contenders.iter().any(|p| p.id == winner));
    assert!(row.is_signed());
    assert_eq!(harness.fixture.signers.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_final_signatures_complete_once() {
    for _ in 0..10 {
        let fixture = LeaseFixture::new();
        fixture.add_signer(Signer::bound(
            fixture.lease.id,
            fixture.owner.id,
            SignerRole::Owner,
        ));
        fixture.add_signer(Signer::bound(
            fixture.lease.id,
            fixture.tenant.id,
            SignerRole::PrincipalTenant,
        ));
        let harness = BusHarness::new(fixture);

        let owner = {
            let service = Arc::clone(&harness.service);
            let request = harness.fixture.request(harness.fixture.owner_caller());
            tokio::spawn(async move { service.sign(request).await })
        };
        let tenant = {
            let service = Arc::clone(&harness.service);
            let request = harness.fixture.request(harness.fixture.tenant_caller());
            tokio::spawn(async move { service.sign(request).await })
        };
        let owner = owner.await.unwrap().unwrap();
        let tenant = tenant.await.unwrap().unwrap();

        // At least the later recompute sees both signatures.
        assert!(
            owner.lease_status == LeaseStatus::FullySigned
                || tenant.lease_status == LeaseStatus::FullySigned
        );
        assert_eq!(harness.fixture.status(), LeaseStatus::FullySigned);

        let kinds = harness.published_kinds();
        assert_eq!(kinds.iter().filter(|k| **k == "lease.fully_signed").count(), 2);
        assert_eq!(kinds.iter().filter(|k| **k == "lease.owner_signed").count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == "lease.tenant_signed").count(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_owner_requests_synthesize_one_row() {
    let fixture = LeaseFixture::new();
    fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.tenant.id,
        SignerRole::PrincipalTenant,
    ));
    let store = Arc::new(RendezvousSignerStore::new(fixture.signers.clone(), 2));
    let harness = BusHarness::with_signers(fixture, store);

    // Both requests see a roster without an owner row.
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&harness.service);
            let request = harness.fixture.request(harness.fixture.owner_caller());
            tokio::spawn(async move { service.sign(request).await })
        })
        .collect();
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == SignError::Authorization(Refusal::AlreadySigned)));

    let roster = harness
        .fixture
        .signers
        .list_for_lease(harness.fixture.lease.id)
        .await
        .unwrap();
    let owner_rows: Vec<_> = roster.iter().filter(|s| s.role == SignerRole::Owner).collect();
    assert_eq!(owner_rows.len(), 1);
    assert!(owner_rows[0].is_bound_to(harness.fixture.owner.id));
    assert!(owner_rows[0].is_signed());
    assert_eq!(harness.published_kinds(), ["lease.owner_signed"]);
}
