//! # Service Container
//!
//! Holds the signature service and the adapters it is wired to.
//!
//! ## Wiring
//!
//! ```text
//! Seed (JSON) ──→ InMemoryLeaseStore ─┐
//!             └─→ InMemorySignerStore ┤
//!   InMemoryArtifactStore ────────────┼──→ LeaseSignatureService
//!   Sha256ProofGenerator ─────────────┤
//!   BusNotifier ──→ InMemoryEventBus ─┘
//! ```

pub mod config;

pub use config::{ConfigError, RuntimeConfig};

use std::sync::Arc;

use lease_signature::{
    BusNotifier, InMemoryArtifactStore, InMemoryLeaseStore, InMemorySignerStore,
    LeaseSignatureService, Seed, SeedError, Sha256ProofGenerator, SignatureDependencies,
    SystemClock,
};
use shared_bus::InMemoryEventBus;
use tracing::{info, instrument};

/// Central container holding the service and its adapters.
pub struct ServiceContainer {
    /// Signature service wired to the adapters below.
    pub service: Arc<LeaseSignatureService>,

    /// Lease and profile read models.
    pub leases: Arc<InMemoryLeaseStore>,

    /// Signer rows.
    pub signers: Arc<InMemorySignerStore>,

    /// Uploaded signature images.
    pub artifacts: Arc<InMemoryArtifactStore>,

    /// Outbox the milestones are published on.
    pub event_bus: Arc<InMemoryEventBus>,

    /// Runtime configuration (immutable after initialization).
    pub config: RuntimeConfig,
}

impl ServiceContainer {
    /// Validate the seed and wire every adapter.
    #[instrument(name = "container_init", skip_all)]
    pub fn from_seed(config: RuntimeConfig, seed: Seed) -> Result<Self, SeedError> {
        let (profiles, leases, rows) = (seed.profiles.len(), seed.leases.len(), seed.signers.len());
        let (lease_store, signer_store) = seed.into_stores()?;
        info!(profiles, leases, signers = rows, "Seed loaded");

        let leases = Arc::new(lease_store);
        let signers = Arc::new(signer_store);
        let artifacts = Arc::new(InMemoryArtifactStore::new());
        let event_bus = Arc::new(InMemoryEventBus::with_capacity(config.event_capacity));

        let service = Arc::new(LeaseSignatureService::new(
            SignatureDependencies {
                signers: signers.clone(),
                leases: leases.clone(),
                proofs: Arc::new(Sha256ProofGenerator::new()),
                artifacts: artifacts.clone(),
                notifier: Arc::new(BusNotifier::new(event_bus.clone())),
                clock: Arc::new(SystemClock),
            },
            config.signature.clone(),
        ));
        info!(
            proof_timeout_ms = config.signature.proof_timeout.as_millis() as u64,
            storage_timeout_ms = config.signature.storage_timeout.as_millis() as u64,
            artifact_prefix = %config.signature.artifact_prefix,
            "Signature service initialized"
        );

        Ok(Self {
            service,
            leases,
            signers,
            artifacts,
            event_bus,
            config,
        })
    }

    /// Parse a JSON seed, then wire.
    pub fn from_json(config: RuntimeConfig, raw: &str) -> Result<Self, SeedError> {
        Self::from_seed(config, Seed::from_json(raw)?)
    }
}
