//! Aggregation rounds.
//!
//! A round is one time-boxed aggregation window with a strict lifecycle:
//! OPEN -> CLOSED -> AGGREGATED -> RELEASED. No submission may be added
//! once the round leaves OPEN.

use crate::core::{now, Error, ModelKind, Result, RoundId, Timestamp};
use crate::federation::submission::Submission;
use crate::privacy::Pseudonym;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Accepting submissions
    Open,
    /// Window expired or explicitly closed; submission set is final
    Closed,
    /// An aggregate result has been computed
    Aggregated,
    /// Release noise applied and the version persisted
    Released,
}

impl RoundStatus {
    /// The only status this one may transition to, if any.
    fn next(&self) -> Option<RoundStatus> {
        match self {
            RoundStatus::Open => Some(RoundStatus::Closed),
            RoundStatus::Closed => Some(RoundStatus::Aggregated),
            RoundStatus::Aggregated => Some(RoundStatus::Released),
            RoundStatus::Released => None,
        }
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStatus::Open => write!(f, "OPEN"),
            RoundStatus::Closed => write!(f, "CLOSED"),
            RoundStatus::Aggregated => write!(f, "AGGREGATED"),
            RoundStatus::Released => write!(f, "RELEASED"),
        }
    }
}

/// One aggregation window and its accepted submissions.
///
/// Submissions are keyed by pseudonym: each organization contributes at
/// most once per round and insertion order carries no meaning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round {
    /// Round identifier
    pub round_id: RoundId,
    /// Model kind this round aggregates
    pub model_kind: ModelKind,
    /// Current lifecycle state
    pub status: RoundStatus,
    /// When the round opened
    pub opened_at: Timestamp,
    /// When the round closed, if it has
    pub closed_at: Option<Timestamp>,
    submissions: HashMap<Pseudonym, Submission>,
    // Survives clear_submissions so released rounds keep their count.
    participants: usize,
    failed: bool,
}

impl Round {
    /// Open a new round.
    pub fn open(round_id: RoundId, model_kind: ModelKind) -> Self {
        Self {
            round_id,
            model_kind,
            status: RoundStatus::Open,
            opened_at: now(),
            closed_at: None,
            submissions: HashMap::new(),
            participants: 0,
            failed: false,
        }
    }

    /// Number of distinct contributing organizations. Preserved after the
    /// raw cohort is dropped at a terminal transition.
    pub fn participant_count(&self) -> usize {
        self.participants
    }

    /// Whether aggregation failed terminally (insufficient participants).
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Whether a pseudonym already has an accepted submission here.
    pub fn has_contribution(&self, pseudonym: &Pseudonym) -> bool {
        self.submissions.contains_key(pseudonym)
    }

    /// The accepted submissions, in no particular order.
    pub fn submissions(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.values()
    }

    /// Add an accepted submission. Caller must have validated it.
    pub(crate) fn insert(&mut self, submission: Submission) {
        self.submissions
            .insert(submission.pseudonym.clone(), submission);
        self.participants = self.submissions.len();
    }

    /// Drop the raw cohort once the round is terminal. The store holds the
    /// durable artifact; the per-organization vectors are not needed after
    /// release (or after a terminal aggregation failure).
    pub(crate) fn clear_submissions(&mut self) {
        self.submissions.clear();
        self.submissions.shrink_to_fit();
    }

    /// Mark aggregation as terminally failed for this round.
    pub(crate) fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Whether the time window has expired as of `at`.
    pub fn is_due(&self, at: Timestamp, duration: Duration) -> bool {
        self.status == RoundStatus::Open && at - self.opened_at >= duration
    }

    /// Advance to `to`, enforcing the strict lifecycle order.
    pub(crate) fn transition_to(&mut self, to: RoundStatus) -> Result<()> {
        if self.status.next() != Some(to) {
            return Err(Error::InvalidTransition {
                round_id: self.round_id,
                from: self.status,
                to,
            });
        }
        if to == RoundStatus::Closed {
            self.closed_at = Some(now());
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn submission(pseudonym: &str) -> Submission {
        use crate::federation::submission::SubmissionDraft;
        Submission::accept(
            SubmissionDraft {
                pseudonym: Pseudonym::raw(pseudonym),
                round_id: 1,
                parameter_vector: vec![1.0, 2.0],
                weight: 1.0,
                metrics: Map::new(),
            },
            10.0,
        )
    }

    #[test]
    fn test_round_opens_empty() {
        let round = Round::open(1, ModelKind::DemandForecast);
        assert_eq!(round.status, RoundStatus::Open);
        assert_eq!(round.participant_count(), 0);
        assert!(round.closed_at.is_none());
    }

    #[test]
    fn test_lifecycle_order() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        round.transition_to(RoundStatus::Closed).unwrap();
        assert!(round.closed_at.is_some());
        round.transition_to(RoundStatus::Aggregated).unwrap();
        round.transition_to(RoundStatus::Released).unwrap();
        assert_eq!(round.status, RoundStatus::Released);
    }

    #[test]
    fn test_cannot_skip_states() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        let err = round.transition_to(RoundStatus::Aggregated).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn test_cannot_go_backwards() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        round.transition_to(RoundStatus::Closed).unwrap();
        assert!(round.transition_to(RoundStatus::Closed).is_err());
    }

    #[test]
    fn test_released_is_terminal() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        round.transition_to(RoundStatus::Closed).unwrap();
        round.transition_to(RoundStatus::Aggregated).unwrap();
        round.transition_to(RoundStatus::Released).unwrap();
        for status in [
            RoundStatus::Open,
            RoundStatus::Closed,
            RoundStatus::Aggregated,
            RoundStatus::Released,
        ] {
            assert!(round.clone().transition_to(status).is_err());
        }
    }

    #[test]
    fn test_participants_counted_by_pseudonym() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        round.insert(submission("org-a"));
        round.insert(submission("org-b"));
        assert_eq!(round.participant_count(), 2);
        assert!(round.has_contribution(&Pseudonym::raw("org-a")));
        assert!(!round.has_contribution(&Pseudonym::raw("org-c")));
    }

    #[test]
    fn test_clear_submissions_preserves_count() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        round.insert(submission("org-a"));
        round.insert(submission("org-b"));
        round.clear_submissions();
        assert_eq!(round.participant_count(), 2);
        assert_eq!(round.submissions().count(), 0);
        assert!(!round.has_contribution(&Pseudonym::raw("org-a")));
    }

    #[test]
    fn test_mark_failed() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        assert!(!round.is_failed());
        round.mark_failed();
        assert!(round.is_failed());
    }

    #[test]
    fn test_is_due_after_window() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        round.opened_at = now() - Duration::seconds(120);
        assert!(round.is_due(now(), Duration::seconds(60)));
        assert!(!round.is_due(now(), Duration::seconds(600)));
    }

    #[test]
    fn test_closed_round_never_due() {
        let mut round = Round::open(1, ModelKind::DemandForecast);
        round.opened_at = now() - Duration::seconds(120);
        round.transition_to(RoundStatus::Closed).unwrap();
        assert!(!round.is_due(now(), Duration::seconds(60)));
    }
}
