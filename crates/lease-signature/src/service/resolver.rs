//! Rights resolution against the store, with conditional binding.

use super::LeaseSignatureService;
use crate::domain::entities::{Caller, LeaseSummary, SignatureRights, Signer};
use crate::domain::errors::{DependencyError, Refusal, SignError};
use crate::domain::rights::{decide, RightsDecision};
use crate::ports::outbound::BindOutcome;
use tracing::{debug, info, warn};

impl LeaseSignatureService {
    /// The row the caller signs against, synthesizing the owner row when the
    /// lease has none. Losing the synthesis to a concurrent request resolves
    /// again, so the loser lands on the winner's row.
    pub(crate) async fn resolve_signer(
        &self,
        lease: &LeaseSummary,
        caller: &Caller,
    ) -> Result<Signer, SignError> {
        let attempts = self.config.bind_attempts.max(1);
        for attempt in 1..=attempts {
            match self.resolve_rights(lease, caller).await? {
                SignatureRights::Existing(signer) => return Ok(signer),
                SignatureRights::Synthesize(role) => {
                    if let Some(signer) =
                        self.create_signer(lease.id, caller.profile_id, role).await?
                    {
                        return Ok(signer);
                    }
                    debug!(lease_id = %lease.id, attempt, "Lost owner-row race, re-resolving");
                }
            }
        }
        Err(Refusal::AlreadyBound.into())
    }

    /// Decide the caller's rights, claiming an unbound row when the decision
    /// calls for it. A lost claim re-runs the decision on fresh rows.
    pub(crate) async fn resolve_rights(
        &self,
        lease: &LeaseSummary,
        caller: &Caller,
    ) -> Result<SignatureRights, SignError> {
        let owns_property = lease.is_owned_by(caller.profile_id);
        let attempts = self.config.bind_attempts.max(1);

        for attempt in 1..=attempts {
            let signers = self
                .signers
                .list_for_lease(lease.id)
                .await
                .map_err(|e| DependencyError::DataStore(e.to_string()))?;

            let mut claimed = match decide(&signers, caller, owns_property) {
                RightsDecision::Eligible(signer) => return Ok(SignatureRights::Existing(signer)),
                RightsDecision::Synthesize(role) => return Ok(SignatureRights::Synthesize(role)),
                RightsDecision::Refused(refusal) => return Err(refusal.into()),
                RightsDecision::Claim(signer) => signer,
            };

            let outcome = self
                .signers
                .bind_if_unbound(claimed.id, caller.profile_id, &caller.email)
                .await
                .map_err(|e| DependencyError::DataStore(e.to_string()))?;

            match outcome {
                BindOutcome::Bound => {
                    info!(
                        lease_id = %lease.id,
                        signer_id = %claimed.id,
                        role = %claimed.role,
                        profile_id = %caller.profile_id,
                        "Signer slot bound to caller"
                    );
                    claimed.profile_id = Some(caller.profile_id);
                    if claimed.invited_email.is_none() {
                        claimed.invited_email = Some(caller.email.trim().to_string());
                    }
                    return Ok(SignatureRights::Existing(claimed));
                }
                BindOutcome::AlreadyBound(winner) if winner == caller.profile_id => {
                    // A concurrent request from the same caller won.
                    claimed.profile_id = Some(winner);
                    return Ok(SignatureRights::Existing(claimed));
                }
                BindOutcome::AlreadyBound(_) => {
                    debug!(
                        lease_id = %lease.id,
                        signer_id = %claimed.id,
                        attempt,
                        "Lost binding race, re-resolving"
                    );
                }
            }
        }

        warn!(
            lease_id = %lease.id,
            profile_id = %caller.profile_id,
            attempts,
            "Binding retries exhausted"
        );
        Err(Refusal::AlreadyBound.into())
    }
}
