//! # Rights Resolution
//!
//! Decides whether a caller may sign, and against which signer row. The
//! decision is pure; claiming an unbound row is performed by the service
//! with an atomic conditional update, re-running `decide` if the claim is
//! lost.
//!
//! Resolution order, first match wins:
//!
//! 1. Row already bound to the caller.
//! 2. Unbound row invited under the caller's email.
//! 3. Unbound, uninvited tenant-family placeholder (not for property owners).
//! 4. Owner-family row, when the caller owns the property.
//! 5. Refusal.

use crate::domain::entities::{Caller, Signer};
use crate::domain::errors::Refusal;
use shared_types::SignerRole;

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RightsDecision {
    /// Caller is bound to this pending row.
    Eligible(Signer),
    /// Caller may claim this unbound pending row.
    Claim(Signer),
    /// Caller owns the property but the lease has no owner row.
    Synthesize(SignerRole),
    Refused(Refusal),
}

/// Pick the pending candidate, or report that only signed ones exist.
fn first_pending<'a>(
    candidates: impl Iterator<Item = &'a Signer>,
) -> Option<Result<&'a Signer, Refusal>> {
    let mut saw_signed = false;
    for signer in candidates {
        if !signer.is_signed() {
            return Some(Ok(signer));
        }
        saw_signed = true;
    }
    saw_signed.then_some(Err(Refusal::AlreadySigned))
}

/// Resolve the caller's signature rights on a lease.
pub fn decide(signers: &[Signer], caller: &Caller, owns_property: bool) -> RightsDecision {
    // 1. Direct binding.
    let bound = signers.iter().filter(|s| s.is_bound_to(caller.profile_id));
    match first_pending(bound) {
        Some(Ok(signer)) => return RightsDecision::Eligible(signer.clone()),
        Some(Err(refusal)) => return RightsDecision::Refused(refusal),
        None => {}
    }

    // 2. Invitation by email.
    let invited = signers
        .iter()
        .filter(|s| !s.is_bound() && s.is_invited_as(&caller.email));
    match first_pending(invited) {
        Some(Ok(signer)) => return RightsDecision::Claim(signer.clone()),
        Some(Err(refusal)) => return RightsDecision::Refused(refusal),
        None => {}
    }

    // 3. Role placeholder. Owners never land in a tenant slot.
    if !owns_property {
        let placeholder = signers.iter().find(|s| {
            s.role.is_tenant_family()
                && !s.is_bound()
                && !s.is_signed()
                && s.invited_email.is_none()
        });
        if let Some(signer) = placeholder {
            return RightsDecision::Claim(signer.clone());
        }
        return RightsDecision::Refused(Refusal::NotAuthorized);
    }

    // 4. Ownership-derived.
    let owner_rows: Vec<&Signer> = signers.iter().filter(|s| s.role.is_owner_family()).collect();
    if owner_rows.is_empty() {
        return RightsDecision::Synthesize(SignerRole::Owner);
    }
    if let Some(signer) = owner_rows.iter().find(|s| !s.is_bound() && !s.is_signed()) {
        return RightsDecision::Claim((*signer).clone());
    }
    // A signed owner row means the owner side is done, whoever holds it.
    if owner_rows.iter().any(|s| s.is_signed()) {
        return RightsDecision::Refused(Refusal::AlreadySigned);
    }
    RightsDecision::Refused(Refusal::AlreadyBound)
}
