//! Lease status recomputation, serialized per lease.

use super::LeaseSignatureService;
use crate::domain::entities::Signer;
use crate::domain::errors::{DependencyError, PersistenceOp, SignError, ValidationError};
use crate::domain::status::{assess, next_status};
use crate::metrics;
use parking_lot::Mutex;
use shared_types::{LeaseId, LeaseStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

/// One async mutex per lease. Entries nobody holds are pruned on the next
/// acquisition.
#[derive(Default)]
pub struct LeaseLocks {
    locks: Mutex<HashMap<LeaseId, Arc<AsyncMutex<()>>>>,
}

impl LeaseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, lease_id: LeaseId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks.retain(|id, lock| *id == lease_id || Arc::strong_count(lock) > 1);
            locks.entry(lease_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Leases with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

/// Result of a recompute.
#[derive(Debug, Clone)]
pub(crate) struct StatusTransition {
    pub previous: LeaseStatus,
    pub current: LeaseStatus,
    /// Signers the status was computed from.
    pub roster: Vec<Signer>,
}

impl StatusTransition {
    /// Only the request that moves the lease into fully signed sees `true`.
    pub fn became_fully_signed(&self) -> bool {
        self.current == LeaseStatus::FullySigned && self.previous != LeaseStatus::FullySigned
    }
}

impl LeaseSignatureService {
    /// Read signers, compute, and write the status if it changed, holding
    /// the lease lock throughout.
    pub(crate) async fn recompute_locked(
        &self,
        lease_id: LeaseId,
    ) -> Result<StatusTransition, SignError> {
        let _guard = self.locks.acquire(lease_id).await;

        let roster = self
            .signers
            .list_for_lease(lease_id)
            .await
            .map_err(|e| DependencyError::DataStore(e.to_string()))?;
        let assessment = assess(&roster);
        if let Some(anomaly) = assessment.anomaly {
            metrics::record_status_anomaly(anomaly.as_str());
            warn!(
                lease_id = %lease_id,
                anomaly = anomaly.as_str(),
                signers = roster.len(),
                status = %assessment.status,
                "Inconsistent signer data, using best-effort status"
            );
        }

        let previous = self
            .leases
            .lease_summary(lease_id)
            .await
            .map_err(|e| DependencyError::DataStore(e.to_string()))?
            .ok_or(ValidationError::LeaseNotFound(lease_id))?
            .status;

        let current = match next_status(previous, assessment.status) {
            Some(status) => {
                if let Err(e) = self.leases.update_status(lease_id, status).await {
                    error!(
                        lease_id = %lease_id,
                        from = %previous,
                        to = %status,
                        error = %e,
                        reconciliation = true,
                        "Lease status write failed"
                    );
                    return Err(SignError::Persistence {
                        operation: PersistenceOp::UpdateLeaseStatus,
                        signer_id: None,
                        reason: e.to_string(),
                    });
                }
                info!(lease_id = %lease_id, from = %previous, to = %status, "Lease status updated");
                status
            }
            None => {
                if previous.is_lifecycle_advanced() && previous != assessment.status {
                    debug!(
                        lease_id = %lease_id,
                        stored = %previous,
                        computed = %assessment.status,
                        "Lifecycle status kept"
                    );
                }
                previous
            }
        };

        Ok(StatusTransition {
            previous,
            current,
            roster,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_lease_serialized() {
        let locks = Arc::new(LeaseLocks::new());
        let lease = LeaseId::new();

        let guard = locks.acquire(lease).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(lease).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn test_other_leases_not_blocked() {
        let locks = LeaseLocks::new();
        let _a = locks.acquire(LeaseId::new()).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(LeaseId::new())).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_pruned() {
        let locks = LeaseLocks::new();
        for _ in 0..5 {
            let _g = locks.acquire(LeaseId::new()).await;
        }
        let _g = locks.acquire(LeaseId::new()).await;
        assert_eq!(locks.len(), 1);
    }
}
