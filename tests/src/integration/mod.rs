//! # Integration Tests
//!
//! The signature service wired to the in-memory stores and to the shared
//! event bus through [`lease_signature::BusNotifier`].

#[cfg(test)]
mod races;
#[cfg(test)]
mod scenarios;

#[cfg(test)]
pub(crate) mod support {
    use std::sync::Arc;

    use lease_signature::test_utils::LeaseFixture;
    use lease_signature::{BusNotifier, LeaseSignatureService, SignatureConfig, SignerStore};
    use shared_bus::{EventFilter, InMemoryEventBus, Subscription};

    /// A fixture whose milestones go to a real event bus.
    pub(crate) struct BusHarness {
        pub fixture: LeaseFixture,
        pub bus: Arc<InMemoryEventBus>,
        pub service: Arc<LeaseSignatureService>,
    }

    impl BusHarness {
        pub fn new(fixture: LeaseFixture) -> Self {
            Self::with_config(fixture, SignatureConfig::default())
        }

        pub fn with_config(fixture: LeaseFixture, config: SignatureConfig) -> Self {
            let signers = fixture.signers.clone();
            Self::build(fixture, config, signers)
        }

        /// Route signer reads and writes through `signers`, which should
        /// wrap the fixture's store.
        pub fn with_signers(fixture: LeaseFixture, signers: Arc<dyn SignerStore>) -> Self {
            Self::build(fixture, SignatureConfig::default(), signers)
        }

        fn build(
            fixture: LeaseFixture,
            config: SignatureConfig,
            signers: Arc<dyn SignerStore>,
        ) -> Self {
            let bus = Arc::new(InMemoryEventBus::new());
            let mut deps = fixture.dependencies();
            deps.signers = signers;
            deps.notifier = Arc::new(BusNotifier::new(bus.clone()));
            let service = Arc::new(LeaseSignatureService::new(deps, config));
            Self {
                fixture,
                bus,
                service,
            }
        }

        pub fn subscribe(&self) -> Subscription {
            self.bus.subscribe(EventFilter::for_lease(self.fixture.lease.id))
        }

        /// Kinds of every published event, oldest first.
        pub fn published_kinds(&self) -> Vec<&'static str> {
            self.bus.journal().iter().map(|e| e.event.kind()).collect()
        }
    }
}
