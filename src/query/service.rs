//! Read-only query service over released model versions.
//!
//! Never mutates store state; results change only when a new round is
//! released, so they are safe to cache at the serving boundary.

use crate::core::{Error, Result, RoundId};
use crate::store::{ModelStore, ModelVersion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One point of a per-metric trend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Round the value was released in
    pub round_id: RoundId,
    /// Released metric value
    pub value: f32,
}

/// One projected future value of a metric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Rounds ahead of the last released round (1-based)
    pub step: usize,
    /// Projected metric value
    pub value: f32,
    /// Confidence, decaying with distance
    pub confidence: f32,
}

/// Read-only facade over a model store.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn ModelStore>,
}

impl QueryService {
    /// Create a service over the given store.
    pub fn new(store: Arc<dyn ModelStore>) -> Self {
        Self { store }
    }

    /// The latest released model version.
    pub async fn get_current_model(&self) -> Result<ModelVersion> {
        self.store
            .get_latest()
            .await?
            .ok_or(Error::NoReleasedModel)
    }

    /// The version released by a specific round.
    pub async fn get_model(&self, round_id: RoundId) -> Result<ModelVersion> {
        self.store
            .get(round_id)
            .await?
            .ok_or(Error::VersionNotFound(round_id))
    }

    /// The released values of one metric, ascending by round.
    ///
    /// Rounds that did not release the metric are skipped. Rebuilt from the
    /// store on every call, so re-querying yields the same sequence unless
    /// new rounds have been released.
    pub async fn get_trend(&self, metric_name: &str) -> Result<Vec<TrendPoint>> {
        let mut points = Vec::new();
        for round_id in self.store.round_ids().await? {
            if let Some(version) = self.store.get(round_id).await? {
                if let Some(&value) = version.aggregated_metrics.get(metric_name) {
                    points.push(TrendPoint { round_id, value });
                }
            }
        }
        Ok(points)
    }

    /// Project a metric `steps` rounds past the last release.
    ///
    /// Least-squares line over the released trend; with fewer than two
    /// points the projection is flat. Confidence starts at 0.9 and decays
    /// 0.05 per step with a floor of 0.5. Returns an empty sequence when
    /// the metric has never been released.
    pub async fn project_trend(
        &self,
        metric_name: &str,
        steps: usize,
    ) -> Result<Vec<Projection>> {
        let trend = self.get_trend(metric_name).await?;
        if trend.is_empty() {
            return Ok(Vec::new());
        }

        let (slope, intercept) = fit_line(&trend);
        let n = trend.len() as f32;

        Ok((1..=steps)
            .map(|step| Projection {
                step,
                value: intercept + slope * (n - 1.0 + step as f32),
                confidence: (0.9 - 0.05 * step as f32).max(0.5),
            })
            .collect())
    }
}

/// Least-squares fit of `value` against the point index. Returns
/// `(slope, intercept)`; a single point yields a flat line through it.
fn fit_line(points: &[TrendPoint]) -> (f32, f32) {
    let n = points.len() as f32;
    if points.len() < 2 {
        return (0.0, points[0].value);
    }

    let mean_x = (n - 1.0) / 2.0;
    let mean_y = points.iter().map(|p| p.value).sum::<f32>() / n;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, point) in points.iter().enumerate() {
        let dx = i as f32 - mean_x;
        cov += dx * (point.value - mean_y);
        var += dx * dx;
    }

    let slope = cov / var;
    (slope, mean_y - slope * mean_x)
}
