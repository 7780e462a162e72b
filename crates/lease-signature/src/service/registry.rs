//! Signer registry writes: owner-row synthesis and the conditional
//! mark-signed.

use super::LeaseSignatureService;
use crate::domain::entities::{SignatureRecord, Signer};
use crate::domain::errors::{PersistenceOp, Refusal, SignError};
use crate::ports::outbound::{MarkOutcome, OwnerInsert};
use shared_types::{LeaseId, ProfileId, SignerRole};
use tracing::{debug, error, info, warn};

impl LeaseSignatureService {
    /// Insert a pending owner row bound to `profile_id`. `None` when an
    /// owner row appeared since the rights were decided.
    pub(crate) async fn create_signer(
        &self,
        lease_id: LeaseId,
        profile_id: ProfileId,
        role: SignerRole,
    ) -> Result<Option<Signer>, SignError> {
        let signer = Signer::bound(lease_id, profile_id, role);
        match self.signers.insert_owner_if_absent(signer.clone()).await {
            Ok(OwnerInsert::Inserted) => {
                info!(
                    lease_id = %lease_id,
                    signer_id = %signer.id,
                    role = %role,
                    "Signer row synthesized for property owner"
                );
                Ok(Some(signer))
            }
            Ok(OwnerInsert::Exists(existing)) => {
                debug!(
                    lease_id = %lease_id,
                    signer_id = %existing,
                    "Owner row created concurrently"
                );
                Ok(None)
            }
            Err(e) => {
                error!(lease_id = %lease_id, role = %role, error = %e, "Signer creation failed");
                Err(SignError::Persistence {
                    operation: PersistenceOp::CreateSigner,
                    signer_id: None,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Record the signature. Only a pending row is updated; a row signed in
    /// the meantime turns this request into an "already signed" refusal.
    pub(crate) async fn mark_signed(
        &self,
        signer: &Signer,
        record: SignatureRecord,
    ) -> Result<(), SignError> {
        let proof_id = record.proof_id.clone();
        let artifact_path = record.artifact_path.clone();

        match self.signers.mark_signed_if_pending(signer.id, record).await {
            Ok(MarkOutcome::Signed) => Ok(()),
            Ok(MarkOutcome::AlreadySigned) => {
                warn!(
                    lease_id = %signer.lease_id,
                    signer_id = %signer.id,
                    orphan_proof_id = %proof_id,
                    orphan_artifact = %artifact_path,
                    "Signer was signed concurrently; proof and artifact are orphaned"
                );
                Err(Refusal::AlreadySigned.into())
            }
            Err(e) => {
                error!(
                    lease_id = %signer.lease_id,
                    signer_id = %signer.id,
                    proof_id = %proof_id,
                    artifact = %artifact_path,
                    error = %e,
                    reconciliation = true,
                    "Mark-signed failed after proof and artifact were produced"
                );
                Err(SignError::Persistence {
                    operation: PersistenceOp::MarkSigned,
                    signer_id: Some(signer.id),
                    reason: e.to_string(),
                })
            }
        }
    }
}
