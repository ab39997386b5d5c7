//! Federated averaging.
//!
//! Combines a closed round's submissions into a single weight-normalized
//! mean vector plus aggregated metrics. Summation uses Kahan compensation
//! so the result does not drift with cohort size and is independent of
//! submission order within floating-point tolerance.

use crate::core::{Error, Result, RoundId, Timestamp};
use crate::federation::submission::Submission;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Kahan compensated accumulator.
#[derive(Clone, Copy, Debug, Default)]
struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum
    }
}

/// Combined vector and metrics for one cohort.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateOutput {
    /// Weight-normalized mean parameter vector
    pub vector: Vec<f32>,
    /// Weighted mean per metric key, over submissions reporting that key
    pub metrics: HashMap<String, f32>,
}

/// Output of combining one round's submissions.
///
/// Immutable once created: corrections require a new round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Round this result belongs to
    pub round_id: RoundId,
    /// Aggregated parameter vector (pre-release, un-noised)
    pub aggregated_vector: Vec<f32>,
    /// Aggregated metrics
    pub aggregated_metrics: HashMap<String, f32>,
    /// Number of distinct contributing organizations
    pub participant_count: usize,
    /// Whether release noise has been applied
    pub noise_applied: bool,
    /// When the result was released, if it has been
    pub released_at: Option<Timestamp>,
}

/// Compute the weighted federated mean of a cohort.
///
/// For each component index `k` the output is
/// `sum(w_i * v_i[k]) / sum(w_i)`. Metrics are aggregated per key with the
/// same weighted mean, restricted to the submissions that report the key;
/// absent keys contribute nothing (no zero-fill). Fails with
/// [`Error::EmptyCohort`] on an empty input; the minimum-participant gate
/// should fire first, but the check is made here regardless.
pub fn aggregate(submissions: &[&Submission]) -> Result<AggregateOutput> {
    let first = submissions.first().ok_or(Error::EmptyCohort)?;
    let dim = first.parameter_vector.len();

    let mut total_weight = KahanSum::default();
    for submission in submissions {
        if submission.parameter_vector.len() != dim {
            return Err(Error::Aggregation(format!(
                "vector length mismatch in cohort: expected {dim}, got {}",
                submission.parameter_vector.len()
            )));
        }
        total_weight.add(submission.weight as f64);
    }
    let total = total_weight.value();
    if total <= 0.0 {
        return Err(Error::Aggregation("total weight must be positive".to_string()));
    }

    let mut components = vec![KahanSum::default(); dim];
    for submission in submissions {
        let w = submission.weight as f64;
        for (acc, v) in components.iter_mut().zip(&submission.parameter_vector) {
            acc.add(w * *v as f64);
        }
    }
    let vector = components
        .iter()
        .map(|acc| (acc.value() / total) as f32)
        .collect();

    // Metric keys sorted so metric aggregation order is deterministic.
    let keys: BTreeSet<&str> = submissions
        .iter()
        .flat_map(|s| s.metrics.keys().map(String::as_str))
        .collect();

    let mut metrics = HashMap::new();
    for key in keys {
        let mut value_sum = KahanSum::default();
        let mut weight_sum = KahanSum::default();
        for submission in submissions {
            if let Some(value) = submission.metrics.get(key) {
                value_sum.add(submission.weight as f64 * *value as f64);
                weight_sum.add(submission.weight as f64);
            }
        }
        if weight_sum.value() > 0.0 {
            metrics.insert(
                key.to_string(),
                (value_sum.value() / weight_sum.value()) as f32,
            );
        }
    }

    Ok(AggregateOutput { vector, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::federation::submission::SubmissionDraft;
    use crate::privacy::Pseudonym;

    fn submission(pseudonym: &str, vector: Vec<f32>, weight: f32) -> Submission {
        Submission::accept(
            SubmissionDraft {
                pseudonym: Pseudonym::raw(pseudonym),
                round_id: 1,
                parameter_vector: vector,
                weight,
                metrics: HashMap::new(),
            },
            f32::MAX,
        )
    }

    fn with_metric(mut s: Submission, key: &str, value: f32) -> Submission {
        s.metrics.insert(key.to_string(), value);
        s
    }

    #[test]
    fn test_empty_cohort_rejected() {
        let err = aggregate(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptyCohort));
    }

    #[test]
    fn test_unit_weights_give_arithmetic_mean() {
        let subs = vec![
            submission("a", vec![10.0, 0.0], 1.0),
            submission("b", vec![20.0, 0.0], 1.0),
            submission("c", vec![30.0, 0.0], 1.0),
            submission("d", vec![40.0, 0.0], 1.0),
            submission("e", vec![50.0, 0.0], 1.0),
        ];
        let refs: Vec<&Submission> = subs.iter().collect();
        let out = aggregate(&refs).unwrap();
        assert!((out.vector[0] - 30.0).abs() < 1e-4);
        assert!(out.vector[1].abs() < 1e-6);
    }

    #[test]
    fn test_weighted_mean() {
        let subs = vec![
            submission("a", vec![1.0, 1.0], 0.8),
            submission("b", vec![2.0, 2.0], 0.2),
        ];
        let refs: Vec<&Submission> = subs.iter().collect();
        let out = aggregate(&refs).unwrap();
        assert!((out.vector[0] - 1.2).abs() < 1e-5);
        assert!((out.vector[1] - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_order_independent() {
        let subs = vec![
            submission("a", vec![0.1, 9.5], 1.5),
            submission("b", vec![2.7, -3.25], 0.5),
            submission("c", vec![-8.25, 4.125], 2.25),
            submission("d", vec![5.5, 0.75], 1.0),
        ];
        let forward: Vec<&Submission> = subs.iter().collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = aggregate(&forward).unwrap();
        let b = aggregate(&reversed).unwrap();
        for (x, y) in a.vector.iter().zip(&b.vector) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_large_cohort_stays_stable() {
        // 10k unit-weight copies of the same vector must average to itself.
        let subs: Vec<Submission> = (0..10_000)
            .map(|i| submission(&format!("org-{i}"), vec![0.1, 1000.5], 1.0))
            .collect();
        let refs: Vec<&Submission> = subs.iter().collect();
        let out = aggregate(&refs).unwrap();
        assert!((out.vector[0] - 0.1).abs() < 1e-5);
        assert!((out.vector[1] - 1000.5).abs() < 1e-2);
    }

    #[test]
    fn test_metrics_weighted_over_reporting_subset() {
        let subs = vec![
            with_metric(submission("a", vec![0.0], 1.0), "mse", 4.0),
            with_metric(submission("b", vec![0.0], 3.0), "mse", 8.0),
            submission("c", vec![0.0], 100.0), // does not report mse
        ];
        let refs: Vec<&Submission> = subs.iter().collect();
        let out = aggregate(&refs).unwrap();
        // (1*4 + 3*8) / 4 = 7; org c contributes nothing to the key
        assert!((out.metrics["mse"] - 7.0).abs() < 1e-5);
    }

    #[test]
    fn test_absent_metric_key_not_zero_filled() {
        let subs = vec![
            with_metric(submission("a", vec![0.0], 1.0), "r2", 0.9),
            submission("b", vec![0.0], 1.0),
        ];
        let refs: Vec<&Submission> = subs.iter().collect();
        let out = aggregate(&refs).unwrap();
        assert!((out.metrics["r2"] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_mismatch_in_cohort() {
        let subs = vec![
            submission("a", vec![1.0, 2.0], 1.0),
            submission("b", vec![1.0], 1.0),
        ];
        let refs: Vec<&Submission> = subs.iter().collect();
        assert!(matches!(aggregate(&refs), Err(Error::Aggregation(_))));
    }
}
