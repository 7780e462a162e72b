//! # End-to-End Signing Scenarios
//!
//! ```text
//! sign ──→ LeaseSignatureService ──→ BusNotifier ──→ InMemoryEventBus ──→ Subscription
//!                 │
//!                 └──→ InMemorySignerStore / InMemoryLeaseStore / InMemoryArtifactStore
//! ```
//!
//! ## Scenarios
//!
//! 1. **Two-party lease**: owner then tenant, lease becomes fully signed
//! 2. **Invited tenant**: email-only row bound and signed in one request
//! 3. **Owner without row**: owner row synthesized at signing time
//! 4. **Storage failure**: nothing marked signed, status unchanged

use std::sync::Arc;

use lease_signature::test_utils::{FailingArtifactStore, LeaseFixture};
use lease_signature::{
    DependencyError, LeaseSignatureApi, LeaseSignatureService, SignError, SignatureConfig, Signer,
};
use shared_bus::{Audience, LeaseEvent, NextStep};
use shared_types::{LeaseStatus, SignerRole};

use super::support::BusHarness;

// =============================================================================
// SCENARIO 1: TWO-PARTY LEASE
// =============================================================================

#[tokio::test]
async fn test_owner_then_tenant_fully_signs_lease() {
    let fixture = LeaseFixture::new();
    let owner_row = fixture.add_signer(Signer::bound(
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
    let mut subscription = harness.subscribe();
    let fixture = &harness.fixture;

    let status = harness.service.assess_lease(fixture.lease.id).await.unwrap();
    assert_eq!(status.status, LeaseStatus::PendingSignature);

    // Owner first: still pending, the tenant hears about it.
    let outcome = harness
        .service
        .sign(fixture.request(fixture.owner_caller()))
        .await
        .unwrap();
    assert_eq!(outcome.signer_id, owner_row.id);
    assert_eq!(outcome.lease_status, LeaseStatus::PendingSignature);
    assert_eq!(fixture.status(), LeaseStatus::PendingSignature);

    let delivered = subscription.drain();
    assert_eq!(delivered.len(), 1);
    let LeaseEvent::OwnerSigned(milestone) = &delivered[0].event else {
        panic!("expected OwnerSigned, got {:?}", delivered[0].event);
    };
    assert_eq!(milestone.recipient_profile_id, Some(fixture.tenant.id));
    assert_eq!(milestone.counterpart_name, "Olivier Marchand");

    // Tenant second: fully signed, one role event plus one event per audience.
    let outcome = harness
        .service
        .sign(fixture.request(fixture.tenant_caller()))
        .await
        .unwrap();
    assert_eq!(outcome.signer_id, tenant_row.id);
    assert_eq!(outcome.lease_status, LeaseStatus::FullySigned);
    assert_eq!(fixture.status(), LeaseStatus::FullySigned);

    let delivered = subscription.drain();
    let events: Vec<_> = delivered.iter().map(|e| &e.event).collect();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], LeaseEvent::TenantSigned(m)
        if m.recipient_profile_id == Some(fixture.owner.id)));
    assert!(matches!(
        events[1],
        LeaseEvent::FullySigned {
            audience: Audience::Owner,
            next_step: NextStep::ScheduleEntryInspection,
            ..
        }
    ));
    assert!(matches!(
        events[2],
        LeaseEvent::FullySigned {
            audience: Audience::Tenant,
            next_step: NextStep::PayInitialInvoice,
            ..
        }
    ));

    // Envelope ids are unique so consumers can deduplicate.
    let mut ids: Vec<_> = harness.bus.journal().iter().map(|e| e.event_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

// =============================================================================
// SCENARIO 2: INVITED TENANT
// =============================================================================

#[tokio::test]
async fn test_invited_tenant_binds_and_signs() {
    let fixture = LeaseFixture::new();
    fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.owner.id,
        SignerRole::Owner,
    ));
    let invited = fixture.invited_tenant(SignerRole::PrincipalTenant);
    assert!(!invited.is_bound());
    let harness = BusHarness::new(fixture);
    let fixture = &harness.fixture;

    let outcome = harness
        .service
        .sign(fixture.request(fixture.tenant_caller()))
        .await
        .unwrap();

    let row = fixture.signer(invited.id);
    assert_eq!(outcome.signer_id, invited.id);
    assert!(row.is_bound_to(fixture.tenant.id));
    assert!(row.is_signed());
    assert_eq!(outcome.lease_status, LeaseStatus::PendingSignature);
    assert_eq!(harness.published_kinds(), ["lease.tenant_signed"]);

    let journal = harness.bus.journal();
    let milestone = journal[0].event.milestone();
    assert_eq!(milestone.recipient_profile_id, Some(fixture.owner.id));
    assert_eq!(milestone.counterpart_name, "Tess Leroy");
    assert_eq!(milestone.signer_profile_id, Some(fixture.tenant.id));
}

// =============================================================================
// SCENARIO 3: OWNER WITHOUT ROW
// =============================================================================

#[tokio::test]
async fn test_owner_row_synthesized_on_first_signature() {
    let fixture = LeaseFixture::new();
    fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.tenant.id,
        SignerRole::PrincipalTenant,
    ));
    let harness = BusHarness::new(fixture);
    let fixture = &harness.fixture;

    let outcome = harness
        .service
        .sign(fixture.request(fixture.owner_caller()))
        .await
        .unwrap();

    assert_eq!(fixture.signers.len(), 2);
    let owner_row = fixture.signer(outcome.signer_id);
    assert_eq!(owner_row.role, SignerRole::Owner);
    assert!(owner_row.is_bound_to(fixture.owner.id));
    assert!(owner_row.is_signed());
    assert_eq!(fixture.status(), LeaseStatus::PendingSignature);
    assert_eq!(harness.published_kinds(), ["lease.owner_signed"]);

    // The tenant then completes the lease; no second owner row appears.
    let outcome = harness
        .service
        .sign(fixture.request(fixture.tenant_caller()))
        .await
        .unwrap();
    assert_eq!(outcome.lease_status, LeaseStatus::FullySigned);
    assert_eq!(fixture.signers.len(), 2);
}

// =============================================================================
// SCENARIO 4: STORAGE FAILURE
// =============================================================================

#[tokio::test]
async fn test_storage_failure_commits_nothing() {
    let fixture = LeaseFixture::new();
    let owner_row = fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.owner.id,
        SignerRole::Owner,
    ));
    let tenant_row = fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.tenant.id,
        SignerRole::PrincipalTenant,
    ));
    let mut deps = fixture.dependencies();
    deps.artifacts = Arc::new(FailingArtifactStore);
    let service = LeaseSignatureService::new(deps, SignatureConfig::default());

    let err = service
        .sign(fixture.request(fixture.tenant_caller()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SignError::Dependency(DependencyError::ArtifactStorage(_))
    ));
    assert!(err.is_retryable());
    assert_eq!(fixture.signer(owner_row.id), owner_row);
    assert_eq!(fixture.signer(tenant_row.id), tenant_row);
    assert!(fixture.artifacts.paths().is_empty());
    assert!(fixture.notifier.events().is_empty());

    // A recompute afterwards is a no-op.
    let status = service.recompute_status(fixture.lease.id).await.unwrap();
    assert_eq!(status, LeaseStatus::PendingSignature);
    assert_eq!(fixture.leases.status_writes(), 0);

    // The same request succeeds once storage is back.
    let outcome = fixture
        .service()
        .sign(fixture.request(fixture.tenant_caller()))
        .await
        .unwrap();
    assert_eq!(outcome.signer_id, tenant_row.id);
}

// =============================================================================
// LIFECYCLE
// =============================================================================

#[tokio::test]
async fn test_draft_lease_moves_to_pending_then_locks_after_activation() {
    let fixture = LeaseFixture::new().with_status(LeaseStatus::Draft);
    fixture.add_signer(Signer::bound(
        fixture.lease.id,
        fixture.owner.id,
        SignerRole::Owner,
    ));
    fixture.invited_tenant(SignerRole::PrincipalTenant);
    let harness = BusHarness::new(fixture);
    let fixture = &harness.fixture;

    let status = harness
        .service
        .recompute_status(fixture.lease.id)
        .await
        .unwrap();
    assert_eq!(status, LeaseStatus::PendingSignature);

    harness
        .service
        .sign(fixture.request(fixture.owner_caller()))
        .await
        .unwrap();
    harness
        .service
        .sign(fixture.request(fixture.tenant_caller()))
        .await
        .unwrap();
    assert_eq!(fixture.status(), LeaseStatus::FullySigned);

    // Activation belongs to another flow; signing and recomputes leave it be.
    let mut active = fixture.lease.clone();
    active.status = LeaseStatus::Active;
    fixture.leases.insert_lease(active);

    let status = harness
        .service
        .recompute_status(fixture.lease.id)
        .await
        .unwrap();
    assert_eq!(status, LeaseStatus::Active);
    let err = harness
        .service
        .sign(fixture.request(fixture.tenant_caller()))
        .await
        .unwrap_err();
    assert_eq!(err.class(), "validation");
}
