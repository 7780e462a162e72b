//! # Lease Runtime
//!
//! Command-line host for the lease-signature core.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and adapter wiring
//! - `LeaseRuntime` - one operation per invocation, JSON responses
//!
//! ## Flow
//!
//! ```text
//! CLI args ──→ RuntimeConfig + Seed ──→ ServiceContainer
//!                                           │
//!              sign / status ───────────────┤
//!                                           ↓
//!                                  JSON response (stdout)
//!                                  event journal (logs)
//! ```

pub mod container;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use lease_signature::{
    Caller, ClientMetadata, LeaseSignatureApi, SignError, SignOutcome, SignRequest,
    SignatureArtifact,
};
use serde::Serialize;
use shared_bus::{EventPublisher, OutboxEnvelope};
use shared_types::{LeaseId, LeaseStatus, ProfileId};
use tracing::{info, instrument};

use crate::container::ServiceContainer;

/// Inputs of one `sign` invocation.
#[derive(Debug, Clone)]
pub struct SignCommand {
    pub lease_id: LeaseId,
    pub profile_id: ProfileId,
    pub email: String,
    pub signature: Option<SignatureArtifact>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub device: BTreeMap<String, String>,
}

impl SignCommand {
    fn into_request(self) -> SignRequest {
        SignRequest {
            lease_id: self.lease_id,
            caller: Caller {
                profile_id: self.profile_id,
                email: self.email,
            },
            signature: self.signature,
            client: ClientMetadata {
                user_agent: self.user_agent,
                ip_address: self.ip_address,
                device: self.device,
            },
        }
    }
}

/// Read a signature image, deriving the content type from the extension.
pub fn load_signature(path: &Path) -> std::io::Result<SignatureArtifact> {
    let bytes = std::fs::read(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let content_type = match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("png") | None => "image/png",
        Some(_) => "application/octet-stream",
    };
    Ok(SignatureArtifact {
        bytes,
        content_type: content_type.to_string(),
    })
}

/// Response body of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub detail: String,
    pub retryable: bool,
}

impl From<&SignError> for ErrorResponse {
    fn from(e: &SignError) -> Self {
        Self {
            error: e.class(),
            message: e.user_message(),
            detail: e.to_string(),
            retryable: e.is_retryable(),
        }
    }
}

/// Response body of the `status` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub lease_id: LeaseId,
    /// Status derived from the signer rows.
    pub computed: LeaseStatus,
    /// Stored status after the recompute.
    pub stored: LeaseStatus,
    pub anomaly: Option<&'static str>,
}

/// The runtime hosting one signature service.
pub struct LeaseRuntime {
    container: Arc<ServiceContainer>,
}

impl LeaseRuntime {
    pub fn new(container: ServiceContainer) -> Self {
        Self {
            container: Arc::new(container),
        }
    }

    /// Get a reference to the service container.
    pub fn container(&self) -> Arc<ServiceContainer> {
        Arc::clone(&self.container)
    }

    /// Run a sign request, then log whatever reached the outbox.
    #[instrument(skip_all, fields(lease_id = %command.lease_id))]
    pub async fn sign(&self, command: SignCommand) -> Result<SignOutcome, SignError> {
        let published_before = self.container.event_bus.events_published();
        let result = self.container.service.sign(command.into_request()).await;
        for envelope in self.milestones_since(published_before) {
            let milestone = envelope.event.milestone();
            info!(
                event_id = %envelope.event_id,
                kind = envelope.event.kind(),
                lease_id = %milestone.lease_id,
                recipient = milestone.recipient_email.as_deref().unwrap_or("-"),
                counterpart = %milestone.counterpart_name,
                "Milestone published"
            );
        }
        result
    }

    /// Assess the roster and reconcile the stored status.
    #[instrument(skip(self))]
    pub async fn status(&self, lease_id: LeaseId) -> Result<StatusReport, SignError> {
        let service = &self.container.service;
        let assessment = service.assess_lease(lease_id).await?;
        let stored = service.recompute_status(lease_id).await?;
        Ok(StatusReport {
            lease_id,
            computed: assessment.status,
            stored,
            anomaly: assessment.anomaly.map(|a| a.as_str()),
        })
    }

    /// Journal entries published after the `published_before` count. The
    /// journal is bounded, so only the retained tail can be returned.
    fn milestones_since(&self, published_before: u64) -> Vec<OutboxEnvelope> {
        let bus = &self.container.event_bus;
        let fresh = bus.events_published().saturating_sub(published_before);
        let journal = bus.journal();
        let retained = journal.len();
        let skip = retained.saturating_sub(usize::try_from(fresh).unwrap_or(retained));
        journal.into_iter().skip(skip).collect()
    }
}
