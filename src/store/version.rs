//! The queryable, versioned model artifact.

use crate::core::{ModelKind, RoundId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One released aggregate, as served to external collaborators.
///
/// Created only from a RELEASED round's result; the vector is already
/// noised by the release filter. Versions are never mutated after storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelVersion {
    /// Round that produced this version (primary key)
    pub round_id: RoundId,
    /// Model kind the round aggregated
    pub model_kind: ModelKind,
    /// Released (noised) parameter vector
    pub aggregated_vector: Vec<f32>,
    /// Released metrics
    pub aggregated_metrics: HashMap<String, f32>,
    /// When the version was released
    pub released_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now;

    #[test]
    fn test_version_json_roundtrip() {
        let version = ModelVersion {
            round_id: 3,
            model_kind: ModelKind::DemandForecast,
            aggregated_vector: vec![1.5, -2.25],
            aggregated_metrics: HashMap::from([("mse".to_string(), 0.12)]),
            released_at: now(),
        };
        let json = serde_json::to_string(&version).unwrap();
        let parsed: ModelVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.round_id, 3);
        assert_eq!(parsed.aggregated_vector, version.aggregated_vector);
        assert_eq!(parsed.aggregated_metrics["mse"], 0.12);
    }
}
