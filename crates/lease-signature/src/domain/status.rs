//! # Lease Status Machine
//!
//! Derives the lease status from the full signer set. Pure: no stored
//! status is consulted, so recomputing after every signature is idempotent.
//!
//! ```text
//! roster complete = >= 2 signers, an owner-family row, a tenant-family row
//!
//! complete, all signed, every tenant bound  -> fully_signed
//! complete, otherwise                       -> pending_signature
//! incomplete, nothing signed                -> draft
//! incomplete, something signed              -> pending_signature (+ anomaly)
//! ```

use crate::domain::entities::Signer;
use serde::Serialize;
use shared_types::LeaseStatus;

/// Signer data that cannot belong to a healthy lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusAnomaly {
    /// The lease has no signer rows at all.
    NoSigners,
    /// Signatures exist but the roster lacks an owner or a tenant.
    IncompleteRoster,
}

impl StatusAnomaly {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSigners => "no_signers",
            Self::IncompleteRoster => "incomplete_roster",
        }
    }
}

/// Best-effort status plus an optional inconsistency signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusAssessment {
    pub status: LeaseStatus,
    pub anomaly: Option<StatusAnomaly>,
}

/// Counts over a signer set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterSummary {
    pub total: usize,
    pub signed: usize,
    pub owners: usize,
    pub tenants: usize,
    pub unbound_tenants: usize,
}

impl RosterSummary {
    pub fn of(signers: &[Signer]) -> Self {
        signers.iter().fold(Self::default(), |mut acc, s| {
            acc.total += 1;
            if s.is_signed() {
                acc.signed += 1;
            }
            if s.role.is_owner_family() {
                acc.owners += 1;
            }
            if s.role.is_tenant_family() {
                acc.tenants += 1;
                if !s.is_bound() {
                    acc.unbound_tenants += 1;
                }
            }
            acc
        })
    }

    pub fn is_complete(&self) -> bool {
        self.total >= 2 && self.owners > 0 && self.tenants > 0
    }

    pub fn all_signed(&self) -> bool {
        self.total > 0 && self.signed == self.total
    }
}

/// Assess the status of a lease from its signers.
pub fn assess(signers: &[Signer]) -> StatusAssessment {
    let roster = RosterSummary::of(signers);

    if roster.is_complete() {
        let status = if roster.all_signed() && roster.unbound_tenants == 0 {
            LeaseStatus::FullySigned
        } else {
            LeaseStatus::PendingSignature
        };
        return StatusAssessment {
            status,
            anomaly: None,
        };
    }

    if roster.signed == 0 {
        return StatusAssessment {
            status: LeaseStatus::Draft,
            anomaly: (roster.total == 0).then_some(StatusAnomaly::NoSigners),
        };
    }

    StatusAssessment {
        status: LeaseStatus::PendingSignature,
        anomaly: Some(StatusAnomaly::IncompleteRoster),
    }
}

/// Status only, for callers that do not care about anomalies.
pub fn compute_status(signers: &[Signer]) -> LeaseStatus {
    assess(signers).status
}

/// Status to persist given the stored one. Lifecycle states owned by other
/// flows (active, terminated, archived) are never overwritten.
pub fn next_status(stored: LeaseStatus, computed: LeaseStatus) -> Option<LeaseStatus> {
    if stored.is_lifecycle_advanced() || stored == computed {
        None
    } else {
        Some(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::{LeaseId, ProfileId, SignatureStatus, SignerRole};

    fn signer(role: SignerRole, signed: bool, bound: bool) -> Signer {
        let lease = LeaseId::from(uuid::Uuid::nil());
        let mut s = if bound {
            Signer::bound(lease, ProfileId::new(), role)
        } else {
            Signer::placeholder(lease, role)
        };
        if signed {
            s.status = SignatureStatus::Signed;
        }
        s
    }

    #[test]
    fn test_owner_and_tenant_signed_is_fully_signed() {
        let signers = [
            signer(SignerRole::Owner, true, true),
            signer(SignerRole::PrincipalTenant, true, true),
        ];
        assert_eq!(compute_status(&signers), LeaseStatus::FullySigned);
    }

    #[test]
    fn test_unbound_signed_tenant_keeps_pending() {
        let signers = [
            signer(SignerRole::Owner, true, true),
            signer(SignerRole::PrincipalTenant, true, false),
        ];
        assert_eq!(compute_status(&signers), LeaseStatus::PendingSignature);
    }

    #[test]
    fn test_guarantor_counts_toward_all_signed() {
        let mut signers = vec![
            signer(SignerRole::Owner, true, true),
            signer(SignerRole::CoTenant, true, true),
            signer(SignerRole::Guarantor, false, true),
        ];
        assert_eq!(compute_status(&signers), LeaseStatus::PendingSignature);
        signers[2].status = SignatureStatus::Signed;
        assert_eq!(compute_status(&signers), LeaseStatus::FullySigned);
    }

    #[test]
    fn test_degraded_rosters() {
        assert_eq!(
            assess(&[]),
            StatusAssessment {
                status: LeaseStatus::Draft,
                anomaly: Some(StatusAnomaly::NoSigners)
            }
        );

        let lone_owner = [signer(SignerRole::Owner, false, true)];
        assert_eq!(
            assess(&lone_owner),
            StatusAssessment {
                status: LeaseStatus::Draft,
                anomaly: None
            }
        );

        let signed_owner_only = [
            signer(SignerRole::Owner, true, true),
            signer(SignerRole::Guarantor, false, false),
        ];
        assert_eq!(
            assess(&signed_owner_only),
            StatusAssessment {
                status: LeaseStatus::PendingSignature,
                anomaly: Some(StatusAnomaly::IncompleteRoster)
            }
        );
    }

    #[test]
    fn test_next_status_never_downgrades_lifecycle() {
        assert_eq!(
            next_status(LeaseStatus::Active, LeaseStatus::PendingSignature),
            None
        );
        assert_eq!(
            next_status(LeaseStatus::Archived, LeaseStatus::FullySigned),
            None
        );
        assert_eq!(
            next_status(LeaseStatus::Draft, LeaseStatus::PendingSignature),
            Some(LeaseStatus::PendingSignature)
        );
        assert_eq!(
            next_status(LeaseStatus::FullySigned, LeaseStatus::FullySigned),
            None
        );
    }

    fn arb_role() -> impl Strategy<Value = SignerRole> {
        prop_oneof![
            Just(SignerRole::Owner),
            Just(SignerRole::PrincipalTenant),
            Just(SignerRole::CoTenant),
            Just(SignerRole::Guarantor),
        ]
    }

    fn arb_signers() -> impl Strategy<Value = Vec<Signer>> {
        prop::collection::vec(
            (arb_role(), any::<bool>(), any::<bool>())
                .prop_map(|(role, signed, bound)| signer(role, signed, bound)),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn prop_fully_signed_iff_complete_and_bound(signers in arb_signers()) {
            let expected = signers.len() >= 2
                && signers.iter().all(Signer::is_signed)
                && signers.iter().any(|s| s.role.is_owner_family())
                && signers.iter().any(|s| s.role.is_tenant_family())
                && signers
                    .iter()
                    .filter(|s| s.role.is_tenant_family())
                    .all(Signer::is_bound);
            prop_assert_eq!(compute_status(&signers) == LeaseStatus::FullySigned, expected);
        }

        #[test]
        fn prop_nothing_signed_is_never_fully_signed(signers in arb_signers()) {
            let unsigned: Vec<Signer> = signers
                .into_iter()
                .map(|mut s| {
                    s.status = SignatureStatus::Pending;
                    s
                })
                .collect();
            prop_assert_ne!(compute_status(&unsigned), LeaseStatus::FullySigned);
        }

        #[test]
        fn prop_assessment_is_idempotent(signers in arb_signers()) {
            prop_assert_eq!(assess(&signers), assess(&signers));
        }

        #[test]
        fn prop_only_signature_phase_states_produced(signers in arb_signers()) {
            prop_assert!(!compute_status(&signers).is_lifecycle_advanced());
        }
    }
}
