//! Submissions and vector schemas.

use crate::core::{now, ModelKind, RoundId, Timestamp};
use crate::privacy::Pseudonym;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Identifier assigned to a submission at acceptance.
pub type SubmissionId = Uuid;

/// Declared shape of a model kind's parameter vector.
///
/// `allowed_metrics` is a closed key set: `None` accepts any metric name,
/// `Some(keys)` rejects submissions reporting anything else, and an empty
/// set forbids metrics entirely.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorSchema {
    /// Model kind this schema describes
    pub model_kind: ModelKind,
    /// Required parameter-vector length
    pub expected_length: usize,
    /// Declared metric keys, if the deployment closes the set
    pub allowed_metrics: Option<HashSet<String>>,
}

impl VectorSchema {
    /// Schema accepting any metric keys.
    pub fn new(model_kind: ModelKind, expected_length: usize) -> Self {
        Self {
            model_kind,
            expected_length,
            allowed_metrics: None,
        }
    }

    /// Close the metric set to the given keys.
    pub fn with_metrics<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_metrics = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a metric key is acceptable under this schema.
    pub fn allows_metric(&self, key: &str) -> bool {
        match &self.allowed_metrics {
            Some(keys) => keys.contains(key),
            None => true,
        }
    }
}

/// What an organization submits: not yet validated or accepted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionDraft {
    /// Non-reversible contributor identifier
    pub pseudonym: Pseudonym,
    /// Round this contribution targets
    pub round_id: RoundId,
    /// Locally-noised parameter vector
    pub parameter_vector: Vec<f32>,
    /// Sample count or confidence, used for weighted averaging
    pub weight: f32,
    /// Locally-computed aggregate metrics (e.g. validation accuracy)
    pub metrics: HashMap<String, f32>,
}

/// An accepted, immutable contribution to one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    /// Unique id assigned at acceptance
    pub id: SubmissionId,
    /// Non-reversible contributor identifier
    pub pseudonym: Pseudonym,
    /// Round this contribution belongs to
    pub round_id: RoundId,
    /// Locally-noised parameter vector
    pub parameter_vector: Vec<f32>,
    /// Averaging weight, capped at the configured sensitivity bound
    pub weight: f32,
    /// Locally-computed aggregate metrics
    pub metrics: HashMap<String, f32>,
    /// Acceptance timestamp
    pub submitted_at: Timestamp,
}

impl Submission {
    /// Seal a validated draft into an accepted submission.
    pub(crate) fn accept(draft: SubmissionDraft, weight_cap: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            pseudonym: draft.pseudonym,
            round_id: draft.round_id,
            parameter_vector: draft.parameter_vector,
            weight: draft.weight.min(weight_cap),
            metrics: draft.metrics,
            submitted_at: now(),
        }
    }
}
