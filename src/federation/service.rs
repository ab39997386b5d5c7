//! Concurrency wrapper and round scheduler.
//!
//! Submission intake runs from many parallel workers against one OPEN
//! round. `FederationService` serializes every mutation through one
//! `RwLock`-guarded [`RoundManager`], so acceptance is atomic with respect
//! to a concurrent close: a submission racing `close_round` is either fully
//! accepted or rejected with `ROUND_NOT_OPEN`, never half-applied.
//! Aggregation and release run under the same lock and cannot overlap for
//! a round.

use crate::core::{now, Error, ModelKind, Result, RoundId};
use crate::federation::aggregator::AggregateResult;
use crate::federation::config::{FederationConfig, PrivacyConfig};
use crate::federation::manager::{ManagerStats, RoundManager};
use crate::federation::round::RoundStatus;
use crate::federation::submission::{SubmissionDraft, SubmissionId};
use crate::store::{ModelStore, ModelVersion};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Thread-safe handle over the round manager.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct FederationService {
    inner: Arc<RwLock<RoundManager>>,
}

impl FederationService {
    /// Create a service over the given store.
    pub fn new(
        config: FederationConfig,
        privacy: PrivacyConfig,
        store: Arc<dyn ModelStore>,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RoundManager::new(config, privacy, store))),
        }
    }

    /// Open a round for `kind`. See [`RoundManager::open_round`].
    pub async fn open_round(&self, kind: ModelKind) -> Result<RoundId> {
        self.inner.write().await.open_round(kind).await
    }

    /// Accept one submission. See [`RoundManager::accept_submission`].
    pub async fn accept_submission(
        &self,
        round_id: RoundId,
        draft: SubmissionDraft,
    ) -> Result<SubmissionId> {
        self.inner
            .write()
            .await
            .accept_submission(round_id, draft)
            .await
    }

    /// Explicitly close a round.
    pub async fn close_round(&self, round_id: RoundId) -> Result<()> {
        self.inner.write().await.close_round(round_id).await
    }

    /// Aggregate a closed round.
    pub async fn aggregate(&self, round_id: RoundId) -> Result<AggregateResult> {
        self.inner.write().await.aggregate(round_id).await
    }

    /// Release an aggregated round.
    pub async fn release(&self, round_id: RoundId) -> Result<ModelVersion> {
        self.inner.write().await.release(round_id).await
    }

    /// Current status of a round, if known.
    pub async fn round_status(&self, round_id: RoundId) -> Option<RoundStatus> {
        self.inner.read().await.round(round_id).map(|r| r.status)
    }

    /// The OPEN round id for a model kind, if any.
    pub async fn open_round_id(&self, kind: ModelKind) -> Option<RoundId> {
        self.inner.read().await.open_round_id(kind)
    }

    /// Snapshot of the lifetime counters.
    pub async fn stats(&self) -> ManagerStats {
        self.inner.read().await.stats().clone()
    }

    /// One scheduler pass: close expired rounds, aggregate every CLOSED
    /// round still pending (including rounds closed explicitly between
    /// passes), (re)try release of every AGGREGATED round, and prune
    /// terminal rounds past the retention window.
    ///
    /// Under-threshold rounds are reported and skipped: terminal for the
    /// round, a new one must be opened. A failed store write leaves its
    /// round AGGREGATED so the next pass retries the release.
    pub async fn tick(&self) -> Result<Vec<ModelVersion>> {
        let mut manager = self.inner.write().await;

        manager.close_due_rounds(now()).await?;
        for round_id in manager.rounds_pending_aggregation() {
            match manager.aggregate(round_id).await {
                Ok(_) => {}
                Err(Error::InsufficientParticipants { .. }) => {
                    // Already reported by the manager; the round stays
                    // CLOSED and a fresh round has to be opened.
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        let mut released = Vec::new();
        for round_id in manager.rounds_in(RoundStatus::Aggregated) {
            match manager.release(round_id).await {
                Ok(version) => released.push(version),
                Err(e) => {
                    warn!(round_id, error = %e, "release failed, will retry");
                }
            }
        }

        manager.prune_expired(now()).await?;
        Ok(released)
    }

    /// Drive [`tick`](Self::tick) forever at the given period.
    ///
    /// Callers spawn this on its own task and abort it on shutdown.
    pub async fn run_scheduler(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(period_ms = period.as_millis() as u64, "round scheduler started");
        loop {
            interval.tick().await;
            match self.tick().await {
                Ok(released) if !released.is_empty() => {
                    info!(count = released.len(), "scheduler released model versions");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "scheduler pass failed"),
            }
        }
    }
}
