//! Local noise injection.
//!
//! Perturbs a parameter vector with zero-mean Gaussian noise before it
//! leaves the submitting organization's boundary. This is a policy step,
//! not an optimization: every submission must pass through it exactly once.

use crate::core::{Error, Result};
use crate::federation::config::PrivacyConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Adds independent zero-mean Gaussian noise to every vector component.
///
/// `scale` is the standard deviation: higher protects privacy more but
/// degrades aggregate accuracy. Re-invoking on the same vector adds fresh,
/// additional noise, so callers invoke once per submission.
pub struct NoiseInjector {
    distribution: Normal<f32>,
    rng: StdRng,
}

impl NoiseInjector {
    /// Create an injector with the given noise scale (standard deviation).
    pub fn new(scale: f32) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidPrivacyParameter(format!(
                "noise scale must be finite and positive, got {scale}"
            )));
        }
        let distribution = Normal::new(0.0, scale)
            .map_err(|e| Error::InvalidPrivacyParameter(e.to_string()))?;
        Ok(Self {
            distribution,
            rng: StdRng::from_entropy(),
        })
    }

    /// Create an injector using the deployment's configured local noise
    /// scale. The submitting organization applies this before upload.
    pub fn from_config(config: &PrivacyConfig) -> Result<Self> {
        Self::new(config.local_noise_scale)
    }

    /// Use a deterministic seed (for testing).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Return a copy of `vector` with independent noise on every component.
    pub fn inject(&mut self, vector: &[f32]) -> Vec<f32> {
        vector
            .iter()
            .map(|v| v + self.distribution.sample(&mut self.rng))
            .collect()
    }
}
