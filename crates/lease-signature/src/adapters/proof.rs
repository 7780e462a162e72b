//! # Reference Proof Generator
//!
//! Local stand-in for the external e-signature proof service. Produces a
//! proof whose hashes are SHA-256 digests of the document content and the
//! signature image, so a stored `document_hash` can be checked against the
//! document later.

use crate::domain::entities::{Proof, ProofRequest};
use crate::ports::outbound::{Clock, ProofError, ProofGenerator, SystemClock};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Hex-encoded SHA-256 digest.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub struct Sha256ProofGenerator {
    clock: Arc<dyn Clock>,
}

impl Sha256ProofGenerator {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for Sha256ProofGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProofGenerator for Sha256ProofGenerator {
    async fn generate_proof(&self, request: ProofRequest<'_>) -> Result<Proof, ProofError> {
        if request.document_content.is_empty() {
            return Err(ProofError::Rejected("empty document content".to_string()));
        }
        if request.signature_artifact.is_empty() {
            return Err(ProofError::Rejected("empty signature".to_string()));
        }

        let proof = Proof {
            proof_id: Uuid::new_v4().to_string(),
            timestamp: self.clock.now(),
            document_hash: sha256_hex(request.document_content),
            signature_hash: sha256_hex(request.signature_artifact),
            identity_verified: request.identity_verified,
            identity_method: request.identity_method,
        };

        debug!(
            proof_id = %proof.proof_id,
            document_type = request.document_type,
            document_id = %request.document_id,
            signer = %request.signer_profile_id,
            method = ?request.identity_method,
            "Proof generated"
        );
        Ok(proof)
    }
}
