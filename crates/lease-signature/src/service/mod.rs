//! # Lease Signature Service
//!
//! Application service implementing [`LeaseSignatureApi`].
//!
//! ## Architecture
//!
//! ```text
//! sign ─→ validate artifact ─→ load lease ─→ resolve rights (bind) ─→ [synthesize owner row]
//!      ─→ proof ─→ store artifact ─→ mark signed ─→ recompute status (per-lease lock)
//!      ─→ dispatch milestones (best effort) ─→ SignOutcome
//! ```
//!
//! Nothing is written before the proof and the artifact exist, except the
//! identity binding and owner-row synthesis, which are safe to keep on a
//! later failure.

mod notify;
mod registry;
mod resolver;
mod status;

pub use status::LeaseLocks;

use crate::domain::config::SignatureConfig;
use crate::domain::entities::{
    IdentityMethod, LeaseDocument, LeaseSummary, Party, Proof, ProofRequest, SignOutcome,
    SignRequest, SignatureArtifact, SignatureRecord,
};
use crate::domain::errors::{DependencyError, SignError, ValidationError};
use crate::domain::status::{assess, StatusAssessment};
use crate::metrics;
use crate::ports::inbound::LeaseSignatureApi;
use crate::ports::outbound::{
    ArtifactStore, Clock, LeaseStore, ProofGenerator, SignatureNotifier, SignerStore,
};
use async_trait::async_trait;
use shared_types::{LeaseId, LeaseStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Dependencies for [`LeaseSignatureService`].
pub struct SignatureDependencies {
    pub signers: Arc<dyn SignerStore>,
    pub leases: Arc<dyn LeaseStore>,
    pub proofs: Arc<dyn ProofGenerator>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub notifier: Arc<dyn SignatureNotifier>,
    pub clock: Arc<dyn Clock>,
}

/// The Lease Signature Service.
pub struct LeaseSignatureService {
    pub(crate) signers: Arc<dyn SignerStore>,
    pub(crate) leases: Arc<dyn LeaseStore>,
    pub(crate) proofs: Arc<dyn ProofGenerator>,
    pub(crate) artifacts: Arc<dyn ArtifactStore>,
    pub(crate) notifier: Arc<dyn SignatureNotifier>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: SignatureConfig,
    /// Serializes status recomputation per lease.
    pub(crate) locks: LeaseLocks,
}

impl LeaseSignatureService {
    pub fn new(deps: SignatureDependencies, config: SignatureConfig) -> Self {
        Self {
            signers: deps.signers,
            leases: deps.leases,
            proofs: deps.proofs,
            artifacts: deps.artifacts,
            notifier: deps.notifier,
            clock: deps.clock,
            config,
            locks: LeaseLocks::new(),
        }
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /// Load the lease and check it still accepts signatures.
    async fn load_open_lease(&self, lease_id: LeaseId) -> Result<LeaseSummary, SignError> {
        let lease = self.load_lease(lease_id).await?;
        if lease.status.is_lifecycle_advanced() {
            return Err(ValidationError::LeaseClosed {
                lease_id,
                status: lease.status,
            }
            .into());
        }
        Ok(lease)
    }

    pub(crate) async fn load_lease(&self, lease_id: LeaseId) -> Result<LeaseSummary, SignError> {
        self.leases
            .lease_summary(lease_id)
            .await
            .map_err(|e| DependencyError::DataStore(e.to_string()))?
            .ok_or_else(|| ValidationError::LeaseNotFound(lease_id).into())
    }

    async fn generate_proof(&self, request: ProofRequest<'_>) -> Result<Proof, SignError> {
        let limit = self.config.proof_timeout;
        match timeout(limit, self.proofs.generate_proof(request)).await {
            Ok(Ok(proof)) => Ok(proof),
            Ok(Err(e)) => Err(DependencyError::ProofGeneration(e.to_string()).into()),
            Err(_) => Err(timed_out("proof generation", limit).into()),
        }
    }

    async fn store_artifact(
        &self,
        path: &str,
        artifact: &SignatureArtifact,
        content_type: &str,
    ) -> Result<(), SignError> {
        let limit = self.config.storage_timeout;
        let upload = self.artifacts.store(path, &artifact.bytes, content_type);
        match timeout(limit, upload).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(DependencyError::ArtifactStorage(e.to_string()).into()),
            Err(_) => Err(timed_out("artifact storage", limit).into()),
        }
    }

    async fn sign_inner(&self, request: SignRequest) -> Result<SignOutcome, SignError> {
        let SignRequest {
            lease_id,
            caller,
            signature,
            client,
        } = request;

        // 1. Artifact and lease checks; nothing has happened yet.
        let artifact = signature.ok_or(ValidationError::MissingSignature)?;
        let content_type = validate_artifact(&artifact, &self.config)?;
        let lease = self.load_open_lease(lease_id).await?;

        // 2-3. Rights, then the owner row when the lease has none.
        let signer = self.resolve_signer(&lease, &caller).await?;

        // 4. Proof.
        let profile = self
            .leases
            .profile(caller.profile_id)
            .await
            .map_err(|e| DependencyError::DataStore(e.to_string()))?;
        let roster = self
            .signers
            .list_for_lease(lease.id)
            .await
            .map_err(|e| DependencyError::DataStore(e.to_string()))?;
        let document = LeaseDocument::new(&lease, &roster)
            .canonical_bytes()
            .map_err(|e| DependencyError::ProofGeneration(e.to_string()))?;

        let id_document = profile.as_ref().is_some_and(|p| p.identity_document_on_file);
        let (identity_verified, identity_method) =
            IdentityMethod::for_signer(signer.role, id_document);
        let signer_party = Party {
            profile_id: Some(caller.profile_id),
            email: Some(caller.email.clone()),
            name: profile
                .as_ref()
                .map(|p| p.display_name())
                .or_else(|| signer.invited_name.clone())
                .unwrap_or_else(|| caller.email.clone()),
        };

        let proof = self
            .generate_proof(ProofRequest {
                document_type: &self.config.document_type,
                document_id: lease.id,
                document_content: &document,
                signer_name: &signer_party.name,
                signer_email: &caller.email,
                signer_profile_id: caller.profile_id,
                identity_verified,
                identity_method,
                signature_type: &self.config.signature_type,
                signature_artifact: &artifact.bytes,
                user_agent: client.user_agent.as_deref(),
                ip_address: client.ip_address.as_deref(),
                device: &client.device,
            })
            .await?;
        debug!(
            lease_id = %lease.id,
            proof_id = %proof.proof_id,
            method = identity_method.label(),
            "Proof obtained"
        );

        // 5. Artifact. Failure here leaves no signed state behind.
        let path = self.config.artifact_path(
            lease.id,
            signer.id,
            &proof.proof_id,
            SignatureArtifact::extension_for(content_type),
        );
        self.store_artifact(&path, &artifact, content_type).await?;

        // 6. Signed state.
        let signed_at = self.clock.now();
        let record = SignatureRecord {
            proof_id: proof.proof_id.clone(),
            document_hash: proof.document_hash.clone(),
            signed_at,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            artifact_path: path,
        };
        self.mark_signed(&signer, record).await?;
        metrics::record_signature(signer.role.as_str());

        // 7. Lease status.
        let transition = self.recompute_locked(lease.id).await?;
        if transition.became_fully_signed() {
            metrics::record_fully_signed();
            info!(lease_id = %lease.id, "Lease fully signed");
        }

        // 8. Milestones, best effort.
        self.dispatch_milestones(
            &lease,
            &signer,
            &signer_party,
            &transition.roster,
            transition.became_fully_signed(),
        )
        .await;

        Ok(SignOutcome {
            proof_id: proof.proof_id,
            lease_status: transition.current,
            signer_id: signer.id,
            signed_at,
        })
    }
}

/// Effective content type of an acceptable artifact.
fn validate_artifact<'a>(
    artifact: &'a SignatureArtifact,
    config: &'a SignatureConfig,
) -> Result<&'a str, ValidationError> {
    if artifact.bytes.is_empty() {
        return Err(ValidationError::EmptySignature);
    }
    let content_type = match artifact.content_type.trim() {
        "" => config.artifact_content_type.as_str(),
        declared => declared,
    };
    if !content_type.starts_with("image/") {
        return Err(ValidationError::UnsupportedContentType(
            content_type.to_string(),
        ));
    }
    Ok(content_type)
}

fn timed_out(operation: &'static str, limit: Duration) -> DependencyError {
    DependencyError::Timeout {
        operation,
        after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
}

#[async_trait]
impl LeaseSignatureApi for LeaseSignatureService {
    #[instrument(skip_all, fields(lease_id = %request.lease_id, caller = %request.caller.profile_id))]
    async fn sign(&self, request: SignRequest) -> Result<SignOutcome, SignError> {
        let started = Instant::now();
        let result = self.sign_inner(request).await;
        metrics::record_sign_duration(started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => info!(
                signer_id = %outcome.signer_id,
                proof_id = %outcome.proof_id,
                status = %outcome.lease_status,
                "Signature recorded"
            ),
            Err(SignError::Authorization(refusal)) => {
                metrics::record_refusal(refusal.as_label());
                info!(reason = refusal.as_label(), "Signature refused");
            }
            Err(e) => warn!(class = e.class(), error = %e, "Sign request failed"),
        }
        if let Err(e) = &result {
            metrics::record_sign_failure(e.class());
        }
        result
    }

    async fn assess_lease(&self, lease_id: LeaseId) -> Result<StatusAssessment, SignError> {
        self.load_lease(lease_id).await?;
        let roster = self
            .signers
            .list_for_lease(lease_id)
            .await
            .map_err(|e| DependencyError::DataStore(e.to_string()))?;
        Ok(assess(&roster))
    }

    async fn recompute_status(&self, lease_id: LeaseId) -> Result<LeaseStatus, SignError> {
        self.load_lease(lease_id).await?;
        Ok(self.recompute_locked(lease_id).await?.current)
    }
}
