//! Aggregation round manager.
//!
//! Owns the Round and Submission lifecycle: opens time-boxed rounds,
//! accepts validated submissions, enforces the minimum-participant
//! threshold, runs aggregation, and releases noised results to the store.

use crate::core::{now, Error, ModelKind, Result, RoundId, Timestamp};
use crate::federation::aggregator::{self, AggregateResult};
use crate::federation::config::{FederationConfig, PrivacyConfig};
use crate::federation::round::{Round, RoundStatus};
use crate::federation::submission::{Submission, SubmissionDraft, SubmissionId};
use crate::federation::validator::SubmissionValidator;
use crate::privacy::ReleaseFilter;
use crate::store::{ModelStore, ModelVersion};
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters over the manager's lifetime.
#[derive(Clone, Debug, Default)]
pub struct ManagerStats {
    pub submissions_accepted: u64,
    pub submissions_rejected: u64,
    pub rounds_opened: u64,
    pub rounds_released: u64,
    pub rounds_failed: u64,
}

/// Serialized owner of all round state.
///
/// Not internally synchronized: wrap in
/// [`FederationService`](crate::federation::service::FederationService) for
/// concurrent use. Every mutation goes through this type, so there is no
/// ambient global round state.
pub struct RoundManager {
    config: FederationConfig,
    privacy: PrivacyConfig,
    store: Arc<dyn ModelStore>,
    rounds: HashMap<RoundId, Round>,
    results: HashMap<RoundId, AggregateResult>,
    open_by_kind: HashMap<ModelKind, RoundId>,
    next_round_id: RoundId,
    stats: ManagerStats,
}

impl RoundManager {
    /// Create a manager over the given store.
    pub fn new(
        config: FederationConfig,
        privacy: PrivacyConfig,
        store: Arc<dyn ModelStore>,
    ) -> Self {
        Self {
            config,
            privacy,
            store,
            rounds: HashMap::new(),
            results: HashMap::new(),
            open_by_kind: HashMap::new(),
            next_round_id: 1,
            stats: ManagerStats::default(),
        }
    }

    /// Open a new round for `kind`.
    ///
    /// Privacy parameters are validated here, before any submission can be
    /// accepted; a misconfigured epsilon is fatal at this point. Under the
    /// single-open-round policy, fails while another round for the same
    /// kind is OPEN.
    pub async fn open_round(&mut self, kind: ModelKind) -> Result<RoundId> {
        self.privacy.validate()?;
        self.config.schema(kind)?;

        if self.config.single_open_round {
            if let Some(&existing) = self.open_by_kind.get(&kind) {
                return Err(Error::RoundAlreadyOpen {
                    model_kind: kind.to_string(),
                    round_id: existing,
                });
            }
        }

        let round_id = self.next_round_id;
        self.next_round_id += 1;
        self.rounds.insert(round_id, Round::open(round_id, kind));
        self.open_by_kind.insert(kind, round_id);
        self.stats.rounds_opened += 1;

        info!(round_id, model_kind = %kind, "round opened");
        Ok(round_id)
    }

    /// Validate and accept one submission into an OPEN round.
    ///
    /// All-or-nothing: a rejected draft leaves the round's submission set
    /// untouched. The averaging weight is capped at the configured
    /// sensitivity bound on acceptance.
    pub async fn accept_submission(
        &mut self,
        round_id: RoundId,
        draft: SubmissionDraft,
    ) -> Result<SubmissionId> {
        let round = self.rounds.get(&round_id);
        let status = round.map(|r| r.status);
        let already = round
            .map(|r| r.has_contribution(&draft.pseudonym))
            .unwrap_or(false);

        let validator = match round {
            Some(r) => SubmissionValidator::new(self.config.schema(r.model_kind)?.clone()),
            // Unknown round: any schema reports the same reason code.
            None => {
                self.stats.submissions_rejected += 1;
                return Err(Error::SubmissionRejected(
                    crate::federation::validator::RejectReason::RoundUnknown,
                ));
            }
        };

        if let Err(reason) = validator.validate(&draft, status, already) {
            self.stats.submissions_rejected += 1;
            debug!(round_id, reason = %reason, "submission rejected");
            return Err(Error::SubmissionRejected(reason));
        }

        let submission = Submission::accept(draft, self.privacy.sensitivity);
        let id = submission.id;
        // Round exists and is OPEN: validated above.
        self.rounds
            .get_mut(&round_id)
            .ok_or(Error::RoundUnknown(round_id))?
            .insert(submission);
        self.stats.submissions_accepted += 1;

        debug!(round_id, submission_id = %id, "submission accepted");
        Ok(id)
    }

    /// Explicitly close an OPEN round.
    pub async fn close_round(&mut self, round_id: RoundId) -> Result<()> {
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(Error::RoundUnknown(round_id))?;
        round.transition_to(RoundStatus::Closed)?;
        self.open_by_kind.remove(&round.model_kind);
        info!(
            round_id,
            participants = round.participant_count(),
            "round closed"
        );
        Ok(())
    }

    /// Close every OPEN round whose window has expired as of `at`.
    ///
    /// Returns the ids of the rounds closed. Rounds auto-close on expiry
    /// regardless of participant count; the threshold is enforced at
    /// aggregation.
    pub async fn close_due_rounds(&mut self, at: Timestamp) -> Result<Vec<RoundId>> {
        let duration = Duration::seconds(self.config.round_duration_secs as i64);
        let due: Vec<RoundId> = self
            .rounds
            .values()
            .filter(|r| r.is_due(at, duration))
            .map(|r| r.round_id)
            .collect();
        for round_id in &due {
            self.close_round(*round_id).await?;
        }
        Ok(due)
    }

    /// Aggregate a CLOSED round.
    ///
    /// Fails with [`Error::InsufficientParticipants`] below the configured
    /// threshold; that failure is terminal for the round and a new round
    /// must be opened. On success the round transitions to AGGREGATED and the
    /// un-noised result is held until release.
    pub async fn aggregate(&mut self, round_id: RoundId) -> Result<AggregateResult> {
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(Error::RoundUnknown(round_id))?;

        if round.status != RoundStatus::Closed {
            return Err(Error::InvalidTransition {
                round_id,
                from: round.status,
                to: RoundStatus::Aggregated,
            });
        }

        let participants = round.participant_count();
        if round.is_failed() {
            // Already counted and logged on the first attempt.
            return Err(Error::InsufficientParticipants {
                round_id,
                got: participants,
                required: self.config.min_participants,
            });
        }
        if participants < self.config.min_participants {
            round.mark_failed();
            round.clear_submissions();
            self.stats.rounds_failed += 1;
            warn!(
                round_id,
                participants,
                required = self.config.min_participants,
                "round aggregation failed: insufficient participants"
            );
            return Err(Error::InsufficientParticipants {
                round_id,
                got: participants,
                required: self.config.min_participants,
            });
        }

        let cohort: Vec<&Submission> = round.submissions().collect();
        let output = aggregator::aggregate(&cohort)?;

        let result = AggregateResult {
            round_id,
            aggregated_vector: output.vector,
            aggregated_metrics: output.metrics,
            participant_count: participants,
            noise_applied: false,
            released_at: None,
        };
        round.transition_to(RoundStatus::Aggregated)?;
        self.results.insert(round_id, result.clone());

        info!(round_id, participants, "round aggregated");
        Ok(result)
    }

    /// Release an AGGREGATED round: apply the DP filter once, persist the
    /// version, and transition to RELEASED.
    ///
    /// If the store write fails the round REMAINS AGGREGATED and release
    /// may be retried; noise is drawn fresh from the held un-noised result
    /// on each attempt, and only the attempt whose write succeeds is ever
    /// visible.
    pub async fn release(&mut self, round_id: RoundId) -> Result<ModelVersion> {
        let round = self
            .rounds
            .get(&round_id)
            .ok_or(Error::RoundUnknown(round_id))?;
        if round.status != RoundStatus::Aggregated {
            return Err(Error::InvalidTransition {
                round_id,
                from: round.status,
                to: RoundStatus::Released,
            });
        }
        let model_kind = round.model_kind;
        let result = self
            .results
            .get(&round_id)
            .ok_or(Error::RoundUnknown(round_id))?;

        let mut filter = ReleaseFilter::new(self.privacy.epsilon, self.privacy.sensitivity)?;
        let noised_vector = filter.release_noise(&result.aggregated_vector);

        let version = ModelVersion {
            round_id,
            model_kind,
            aggregated_vector: noised_vector,
            aggregated_metrics: result.aggregated_metrics.clone(),
            released_at: now(),
        };

        // A failed put must leave the round AGGREGATED: nothing below this
        // line runs unless the version is durable.
        self.store.put(version.clone()).await?;

        let result = self
            .results
            .get_mut(&round_id)
            .ok_or(Error::RoundUnknown(round_id))?;
        result.noise_applied = true;
        result.released_at = Some(version.released_at);
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(Error::RoundUnknown(round_id))?;
        round.transition_to(RoundStatus::Released)?;
        // The store holds the released artifact; the per-organization
        // vectors must not outlive the round they served.
        round.clear_submissions();
        self.stats.rounds_released += 1;

        info!(round_id, model_kind = %model_kind, "round released");
        Ok(version)
    }

    /// Current state of a round, if known.
    pub fn round(&self, round_id: RoundId) -> Option<&Round> {
        self.rounds.get(&round_id)
    }

    /// Held aggregate result for a round, if one has been computed.
    pub fn result(&self, round_id: RoundId) -> Option<&AggregateResult> {
        self.results.get(&round_id)
    }

    /// The OPEN round for a model kind, if any.
    pub fn open_round_id(&self, kind: ModelKind) -> Option<RoundId> {
        self.open_by_kind.get(&kind).copied()
    }

    /// Ids of all rounds currently in `status`.
    pub fn rounds_in(&self, status: RoundStatus) -> Vec<RoundId> {
        let mut ids: Vec<RoundId> = self
            .rounds
            .values()
            .filter(|r| r.status == status)
            .map(|r| r.round_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of CLOSED rounds still awaiting aggregation, excluding rounds
    /// whose aggregation already failed terminally.
    pub fn rounds_pending_aggregation(&self) -> Vec<RoundId> {
        let mut ids: Vec<RoundId> = self
            .rounds
            .values()
            .filter(|r| r.status == RoundStatus::Closed && !r.is_failed())
            .map(|r| r.round_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Drop terminal rounds older than the retention window as of `at`.
    ///
    /// A round is eligible once RELEASED (aged from its release time) or
    /// once terminally failed (aged from its close time). The store is
    /// untouched: retention bounds the manager's in-memory footprint, not
    /// the durable version history. Returns the ids pruned.
    pub async fn prune_expired(&mut self, at: Timestamp) -> Result<Vec<RoundId>> {
        let window = Duration::days(self.config.retention_days as i64);
        let cutoff = at - window;

        let expired: Vec<RoundId> = self
            .rounds
            .values()
            .filter_map(|r| {
                let terminal_at = match r.status {
                    RoundStatus::Released => {
                        self.results.get(&r.round_id).and_then(|res| res.released_at)
                    }
                    RoundStatus::Closed if r.is_failed() => r.closed_at,
                    _ => None,
                };
                match terminal_at {
                    Some(t) if t < cutoff => Some(r.round_id),
                    _ => None,
                }
            })
            .collect();

        for round_id in &expired {
            self.rounds.remove(round_id);
            self.results.remove(round_id);
            info!(round_id, "round pruned past retention window");
        }
        Ok(expired)
    }

    /// Lifetime counters.
    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    /// The store releases persist into.
    pub fn store(&self) -> Arc<dyn ModelStore> {
        Arc::clone(&self.store)
    }
}
