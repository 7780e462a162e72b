//! # Milestone Planning
//!
//! Turns a completed signature into the events to dispatch. Display data
//! (names, emails) is resolved by the caller; this module only decides who
//! is told what.

use crate::domain::entities::{LeaseSummary, Party, Signer};
use shared_bus::{Audience, LeaseEvent, NextStep, SignatureMilestone};
use shared_types::{ProfileId, SignerRole};

/// The tenant to address owner-side milestones to: the first principal
/// tenant, falling back to any tenant-family signer.
pub fn principal_tenant(signers: &[Signer]) -> Option<&Signer> {
    signers
        .iter()
        .find(|s| s.role == SignerRole::PrincipalTenant)
        .or_else(|| signers.iter().find(|s| s.role.is_tenant_family()))
}

/// Everything the planner needs about the signature that just happened.
#[derive(Debug, Clone)]
pub struct SignedContext<'a> {
    pub lease: &'a LeaseSummary,
    pub role: SignerRole,
    pub signer_profile_id: Option<ProfileId>,
    /// The party that just signed.
    pub signer: &'a Party,
    pub owner: &'a Party,
    pub tenant: Option<&'a Party>,
    /// Status moved to fully signed with this signature.
    pub became_fully_signed: bool,
}

fn milestone(ctx: &SignedContext<'_>, recipient: &Party, counterpart: &Party) -> SignatureMilestone {
    SignatureMilestone {
        lease_id: ctx.lease.id,
        recipient_profile_id: recipient.profile_id,
        recipient_email: recipient.email.clone(),
        signer_profile_id: ctx.signer_profile_id,
        counterpart_name: counterpart.name.clone(),
        property_address: ctx.lease.property_address.clone(),
    }
}

/// Events to emit, in dispatch order. Guarantors produce no role event.
pub fn plan(ctx: &SignedContext<'_>) -> Vec<LeaseEvent> {
    let mut events = Vec::with_capacity(3);

    if ctx.role.is_tenant_family() {
        events.push(LeaseEvent::TenantSigned(milestone(ctx, ctx.owner, ctx.signer)));
    } else if ctx.role.is_owner_family() {
        if let Some(tenant) = ctx.tenant {
            events.push(LeaseEvent::OwnerSigned(milestone(ctx, tenant, ctx.signer)));
        }
    }

    if ctx.became_fully_signed {
        if let Some(tenant) = ctx.tenant {
            events.push(LeaseEvent::FullySigned {
                milestone: milestone(ctx, ctx.owner, tenant),
                audience: Audience::Owner,
                next_step: NextStep::ScheduleEntryInspection,
            });
            events.push(LeaseEvent::FullySigned {
                milestone: milestone(ctx, tenant, ctx.owner),
                audience: Audience::Tenant,
                next_step: NextStep::PayInitialInvoice,
            });
        }
    }

    events
}
