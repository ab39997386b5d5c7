//! Federation and privacy configuration.

use crate::core::{Error, ModelKind, Result};
use crate::federation::submission::VectorSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Round-management policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Minimum distinct participants before a round may aggregate.
    /// Guards against small-cohort re-identification.
    pub min_participants: usize,
    /// Round auto-closes this many seconds after opening
    pub round_duration_secs: u64,
    /// Allow at most one OPEN round per model kind
    pub single_open_round: bool,
    /// Terminal rounds older than this are pruned from memory
    pub retention_days: u32,
    /// Declared vector schema per model kind
    pub schemas: HashMap<ModelKind, VectorSchema>,
}

impl FederationConfig {
    /// Register a schema for its model kind.
    pub fn with_schema(mut self, schema: VectorSchema) -> Self {
        self.schemas.insert(schema.model_kind, schema);
        self
    }

    /// Look up the schema for a model kind.
    pub fn schema(&self, kind: ModelKind) -> Result<&VectorSchema> {
        self.schemas
            .get(&kind)
            .ok_or_else(|| Error::SchemaMissing(kind.to_string()))
    }
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            min_participants: 3,
            round_duration_secs: 3600,
            single_open_round: true,
            retention_days: 90,
            schemas: HashMap::new(),
        }
    }
}

/// Privacy parameters shared by the noise injector, the weight cap, and the
/// release filter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrivacyConfig {
    /// Std-dev of the local Gaussian noise the submitting organization
    /// applies before upload; see `NoiseInjector::from_config`
    pub local_noise_scale: f32,
    /// Differential-privacy budget per released round (smaller = stronger)
    pub epsilon: f32,
    /// Bound on one participant's influence; also the submission weight cap
    pub sensitivity: f32,
    /// Iterations of the pseudonym hash; see `Anonymizer::from_config`
    pub hash_iterations: u32,
}

impl PrivacyConfig {
    /// Reject unusable parameters. Called at round-open time so a
    /// misconfigured deployment fails before any submission is accepted.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(Error::InvalidPrivacyParameter(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(Error::InvalidPrivacyParameter(format!(
                "sensitivity must be finite and positive, got {}",
                self.sensitivity
            )));
        }
        if !self.local_noise_scale.is_finite() || self.local_noise_scale <= 0.0 {
            return Err(Error::InvalidPrivacyParameter(format!(
                "local noise scale must be finite and positive, got {}",
                self.local_noise_scale
            )));
        }
        if self.hash_iterations == 0 {
            return Err(Error::InvalidPrivacyParameter(
                "hash iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            local_noise_scale: 0.01,
            epsilon: 1.0,
            sensitivity: 1.0,
            hash_iterations: 1000,
        }
    }
}
