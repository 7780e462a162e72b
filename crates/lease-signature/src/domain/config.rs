//! Signature service configuration.

use std::time::Duration;

/// Tunables of [`crate::LeaseSignatureService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    /// Upper bound on a proof generator call.
    pub proof_timeout: Duration,
    /// Upper bound on an artifact upload.
    pub storage_timeout: Duration,
    /// Root of artifact paths: `{prefix}/{lease_id}/{signer_id}/{proof_id}.{ext}`.
    pub artifact_prefix: String,
    /// Content type recorded for stored artifacts.
    pub artifact_content_type: String,
    /// Resolve/bind attempts before a lost binding race becomes a refusal.
    pub bind_attempts: u32,
    /// Document type label passed to the proof generator.
    pub document_type: String,
    /// Signature type label passed to the proof generator.
    pub signature_type: String,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            proof_timeout: Duration::from_secs(10),
            storage_timeout: Duration::from_secs(15),
            artifact_prefix: "signatures".to_string(),
            artifact_content_type: "image/png".to_string(),
            bind_attempts: 3,
            document_type: "bail".to_string(),
            signature_type: "draw".to_string(),
        }
    }
}

impl SignatureConfig {
    #[must_use]
    pub fn with_timeouts(mut self, proof: Duration, storage: Duration) -> Self {
        self.proof_timeout = proof;
        self.storage_timeout = storage;
        self
    }

    #[must_use]
    pub fn with_artifact_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.artifact_prefix = prefix.into();
        self
    }

    /// Path of one signing attempt's artifact. Keyed by proof id: an upload
    /// retried within the attempt overwrites its own object, and a competing
    /// attempt on the same signer never touches it.
    pub fn artifact_path(
        &self,
        lease_id: shared_types::LeaseId,
        signer_id: shared_types::SignerId,
        proof_id: &str,
        extension: &str,
    ) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            self.artifact_prefix.trim_end_matches('/'),
            lease_id,
            signer_id,
            proof_id,
            extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{LeaseId, SignerId};

    #[test]
    fn test_artifact_path_is_keyed_per_attempt() {
        let config = SignatureConfig::default().with_artifact_prefix("sigs/");
        let lease = LeaseId::new();
        let signer = SignerId::new();
        let path = config.artifact_path(lease, signer, "p-1", "png");
        assert_eq!(path, format!("sigs/{lease}/{signer}/p-1.png"));
        assert_eq!(path, config.artifact_path(lease, signer, "p-1", "png"));
        assert_ne!(path, config.artifact_path(lease, signer, "p-2", "png"));
    }
}
