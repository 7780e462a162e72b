//! Milestone dispatch. Every failure here is logged and swallowed; the
//! signature is already committed.

use super::LeaseSignatureService;
use crate::domain::entities::{LeaseSummary, Party, Profile, Signer};
use crate::domain::milestones::{plan, principal_tenant, SignedContext};
use crate::metrics;
use shared_types::ProfileId;
use tracing::{debug, warn};

impl LeaseSignatureService {
    /// Profile lookup that degrades to `None` on store errors.
    async fn profile_for_display(&self, profile_id: Option<ProfileId>) -> Option<Profile> {
        let profile_id = profile_id?;
        match self.leases.profile(profile_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(profile_id = %profile_id, error = %e, "Profile lookup failed, using row data");
                None
            }
        }
    }

    async fn owner_party(&self, lease: &LeaseSummary, roster: &[Signer]) -> Party {
        let row = roster.iter().find(|s| s.role.is_owner_family());
        let profile_id = lease.owner_profile_id.or_else(|| row.and_then(|s| s.profile_id));
        let profile = self.profile_for_display(profile_id).await;
        party(profile_id, profile, row, "Propriétaire")
    }

    async fn tenant_party(&self, roster: &[Signer]) -> Option<Party> {
        let row = principal_tenant(roster)?;
        let profile = self.profile_for_display(row.profile_id).await;
        Some(party(row.profile_id, profile, Some(row), "Locataire"))
    }

    /// Plan and deliver milestone events for a committed signature.
    pub(crate) async fn dispatch_milestones(
        &self,
        lease: &LeaseSummary,
        signer: &Signer,
        signer_party: &Party,
        roster: &[Signer],
        became_fully_signed: bool,
    ) {
        if !signer.role.is_owner_family() && !signer.role.is_tenant_family() && !became_fully_signed
        {
            debug!(lease_id = %lease.id, role = %signer.role, "No milestone for this role");
            return;
        }

        let owner = if signer.role.is_owner_family() {
            signer_party.clone()
        } else {
            self.owner_party(lease, roster).await
        };
        let tenant = if signer.role.is_tenant_family() && !became_fully_signed {
            None
        } else {
            self.tenant_party(roster).await
        };
        if tenant.is_none() && signer.role.is_owner_family() {
            debug!(lease_id = %lease.id, "No tenant to notify");
        }

        let events = plan(&SignedContext {
            lease,
            role: signer.role,
            signer_profile_id: signer_party.profile_id,
            signer: signer_party,
            owner: &owner,
            tenant: tenant.as_ref(),
            became_fully_signed,
        });

        for event in events {
            let kind = event.kind();
            if let Err(e) = self.notifier.notify(event).await {
                metrics::record_notification_failure(kind);
                warn!(lease_id = %lease.id, kind, error = %e, "Milestone notification failed");
            }
        }
    }
}

/// Display data for a party: profile first, then the signer row.
fn party(
    profile_id: Option<ProfileId>,
    profile: Option<Profile>,
    row: Option<&Signer>,
    fallback: &str,
) -> Party {
    let row_email = row.and_then(|s| s.invited_email.clone());
    let row_name = row.and_then(|s| s.invited_name.clone());
    match profile {
        Some(profile) => Party {
            profile_id,
            email: profile.email.clone().or(row_email),
            name: profile.display_name(),
        },
        None => Party {
            profile_id,
            name: row_name
                .or_else(|| row_email.clone())
                .unwrap_or_else(|| fallback.to_string()),
            email: row_email,
        },
    }
}
