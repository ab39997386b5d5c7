//! Submission validation.
//!
//! A submission is atomic: it passes every check or is rejected in full
//! with a stable reason code. No partial acceptance.

use crate::federation::round::RoundStatus;
use crate::federation::submission::{SubmissionDraft, VectorSchema};
use serde::{Deserialize, Serialize};

/// Why a submission was rejected.
///
/// Reason codes are stable; the intake boundary reports them verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Vector length does not match the schema
    ShapeMismatch,
    /// A vector component or metric value is NaN or infinite
    NonFiniteValue,
    /// Weight is not a positive finite number
    InvalidWeight,
    /// The targeted round exists but is no longer accepting submissions
    RoundNotOpen,
    /// The targeted round does not exist
    RoundUnknown,
    /// A metric key is not in the schema's declared set
    UnknownMetric,
    /// The pseudonym already contributed to this round
    DuplicateContribution,
}

impl RejectReason {
    /// Stable code reported at the intake boundary.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::ShapeMismatch => "SHAPE_MISMATCH",
            RejectReason::NonFiniteValue => "NON_FINITE_VALUE",
            RejectReason::InvalidWeight => "INVALID_WEIGHT",
            RejectReason::RoundNotOpen => "ROUND_NOT_OPEN",
            RejectReason::RoundUnknown => "ROUND_UNKNOWN",
            RejectReason::UnknownMetric => "UNKNOWN_METRIC",
            RejectReason::DuplicateContribution => "DUPLICATE_CONTRIBUTION",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validates drafts against one vector schema.
#[derive(Clone, Debug)]
pub struct SubmissionValidator {
    schema: VectorSchema,
}

impl SubmissionValidator {
    /// Create a validator for the given schema.
    pub fn new(schema: VectorSchema) -> Self {
        Self { schema }
    }

    /// The schema this validator enforces.
    pub fn schema(&self) -> &VectorSchema {
        &self.schema
    }

    /// Check a draft in full.
    ///
    /// `round_status` is the current status of the targeted round (`None`
    /// if the round is unknown); `already_contributed` reports whether the
    /// draft's pseudonym has an accepted submission in that round.
    pub fn validate(
        &self,
        draft: &SubmissionDraft,
        round_status: Option<RoundStatus>,
        already_contributed: bool,
    ) -> Result<(), RejectReason> {
        match round_status {
            None => return Err(RejectReason::RoundUnknown),
            Some(RoundStatus::Open) => {}
            Some(_) => return Err(RejectReason::RoundNotOpen),
        }

        if already_contributed {
            return Err(RejectReason::DuplicateContribution);
        }

        if draft.parameter_vector.len() != self.schema.expected_length {
            return Err(RejectReason::ShapeMismatch);
        }

        if draft.parameter_vector.iter().any(|v| !v.is_finite()) {
            return Err(RejectReason::NonFiniteValue);
        }

        if !draft.weight.is_finite() || draft.weight <= 0.0 {
            return Err(RejectReason::InvalidWeight);
        }

        for (key, value) in &draft.metrics {
            if !self.schema.allows_metric(key) {
                return Err(RejectReason::UnknownMetric);
            }
            if !value.is_finite() {
                return Err(RejectReason::NonFiniteValue);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModelKind;
    use crate::privacy::Pseudonym;
    use std::collections::HashMap;

    fn draft(vector: Vec<f32>, weight: f32) -> SubmissionDraft {
        SubmissionDraft {
            pseudonym: Pseudonym::raw("deadbeef"),
            round_id: 1,
            parameter_vector: vector,
            weight,
            metrics: HashMap::new(),
        }
    }

    fn validator() -> SubmissionValidator {
        SubmissionValidator::new(VectorSchema::new(ModelKind::DemandForecast, 2))
    }

    #[test]
    fn test_valid_draft_passes() {
        let v = validator();
        assert!(v
            .validate(&draft(vec![1.0, 2.0], 1.0), Some(RoundStatus::Open), false)
            .is_ok());
    }

    #[test]
    fn test_unknown_round() {
        let v = validator();
        assert_eq!(
            v.validate(&draft(vec![1.0, 2.0], 1.0), None, false),
            Err(RejectReason::RoundUnknown)
        );
    }

    #[test]
    fn test_closed_round() {
        let v = validator();
        assert_eq!(
            v.validate(&draft(vec![1.0, 2.0], 1.0), Some(RoundStatus::Closed), false),
            Err(RejectReason::RoundNotOpen)
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let v = validator();
        assert_eq!(
            v.validate(
                &draft(vec![1.0, 2.0, 3.0], 1.0),
                Some(RoundStatus::Open),
                false
            ),
            Err(RejectReason::ShapeMismatch)
        );
    }

    #[test]
    fn test_non_finite_component() {
        let v = validator();
        assert_eq!(
            v.validate(
                &draft(vec![1.0, f32::NAN], 1.0),
                Some(RoundStatus::Open),
                false
            ),
            Err(RejectReason::NonFiniteValue)
        );
        assert_eq!(
            v.validate(
                &draft(vec![f32::INFINITY, 0.0], 1.0),
                Some(RoundStatus::Open),
                false
            ),
            Err(RejectReason::NonFiniteValue)
        );
    }

    #[test]
    fn test_invalid_weight() {
        let v = validator();
        for bad in [0.0, -1.0, f32::NAN] {
            assert_eq!(
                v.validate(&draft(vec![1.0, 2.0], bad), Some(RoundStatus::Open), false),
                Err(RejectReason::InvalidWeight)
            );
        }
    }

    #[test]
    fn test_duplicate_contribution() {
        let v = validator();
        assert_eq!(
            v.validate(&draft(vec![1.0, 2.0], 1.0), Some(RoundStatus::Open), true),
            Err(RejectReason::DuplicateContribution)
        );
    }

    #[test]
    fn test_undeclared_metric_rejected() {
        let schema =
            VectorSchema::new(ModelKind::DemandForecast, 2).with_metrics(["mse"]);
        let v = SubmissionValidator::new(schema);
        let mut d = draft(vec![1.0, 2.0], 1.0);
        d.metrics.insert("accuracy".to_string(), 0.9);
        assert_eq!(
            v.validate(&d, Some(RoundStatus::Open), false),
            Err(RejectReason::UnknownMetric)
        );
    }

    #[test]
    fn test_non_finite_metric_rejected() {
        let v = validator();
        let mut d = draft(vec![1.0, 2.0], 1.0);
        d.metrics.insert("mse".to_string(), f32::NAN);
        assert_eq!(
            v.validate(&d, Some(RoundStatus::Open), false),
            Err(RejectReason::NonFiniteValue)
        );
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(RejectReason::ShapeMismatch.code(), "SHAPE_MISMATCH");
        assert_eq!(RejectReason::RoundNotOpen.to_string(), "ROUND_NOT_OPEN");
    }
}
