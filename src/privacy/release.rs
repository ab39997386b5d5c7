//! Differential-privacy release filter.
//!
//! Adds calibrated Laplace noise to an aggregate before it becomes
//! externally queryable. Scale is `sensitivity / epsilon`: `sensitivity`
//! bounds how much one participant can move the aggregate (derived from the
//! per-submission weight cap) and `epsilon` is the round's privacy budget.

use crate::core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Laplace release mechanism applied exactly once per round.
pub struct ReleaseFilter {
    epsilon: f32,
    sensitivity: f32,
    rng: StdRng,
}

impl ReleaseFilter {
    /// Create a filter for the given privacy budget and sensitivity bound.
    ///
    /// Both values must be finite and positive; a smaller `epsilon` means
    /// stronger privacy at the cost of accuracy.
    pub fn new(epsilon: f32, sensitivity: f32) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidPrivacyParameter(format!(
                "epsilon must be finite and positive, got {epsilon}"
            )));
        }
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(Error::InvalidPrivacyParameter(format!(
                "sensitivity must be finite and positive, got {sensitivity}"
            )));
        }
        Ok(Self {
            epsilon,
            sensitivity,
            rng: StdRng::from_entropy(),
        })
    }

    /// Use a deterministic seed (for testing).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The Laplace scale parameter `b = sensitivity / epsilon`.
    pub fn scale(&self) -> f32 {
        self.sensitivity / self.epsilon
    }

    /// Return `vector` with independent Laplace(0, b) noise per component.
    ///
    /// Noise is freshly sampled on every call, so the output differs from
    /// the input with probability 1.
    pub fn release_noise(&mut self, vector: &[f32]) -> Vec<f32> {
        let scale = self.scale();
        vector
            .iter()
            .map(|v| v + sample_laplace(&mut self.rng, scale))
            .collect()
    }
}

/// Sample from Laplace(0, scale) via the inverse CDF.
fn sample_laplace(rng: &mut StdRng, scale: f32) -> f32 {
    let u: f32 = rng.gen::<f32>() - 0.5;
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_epsilon() {
        assert!(ReleaseFilter::new(0.0, 1.0).is_err());
        assert!(ReleaseFilter::new(-1.0, 1.0).is_err());
        assert!(ReleaseFilter::new(f32::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_rejects_bad_sensitivity() {
        assert!(ReleaseFilter::new(1.0, 0.0).is_err());
        assert!(ReleaseFilter::new(1.0, f32::NAN).is_err());
    }

    #[test]
    fn test_scale_is_sensitivity_over_epsilon() {
        let filter = ReleaseFilter::new(0.5, 2.0).unwrap();
        assert!((filter.scale() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_noise_is_fresh_per_call() {
        let mut filter = ReleaseFilter::new(1.0, 1.0).unwrap().with_seed(9);
        let vector = vec![10.0_f32; 16];
        let first = filter.release_noise(&vector);
        let second = filter.release_noise(&vector);
        assert_ne!(first, vector);
        assert_ne!(first, second);
    }

    #[test]
    fn test_noise_error_scales_with_budget() {
        // Laplace(0, b) has variance 2b^2, so quadrupling b should raise the
        // mean squared error by roughly 16x.
        let mse = |epsilon: f32| {
            let mut filter = ReleaseFilter::new(epsilon, 1.0).unwrap().with_seed(123);
            let zeros = vec![0.0_f32; 20_000];
            let noised = filter.release_noise(&zeros);
            noised.iter().map(|v| v * v).sum::<f32>() / noised.len() as f32
        };

        let tight = mse(4.0); // b = 0.25
        let loose = mse(1.0); // b = 1.0
        let ratio = loose / tight;
        assert!(
            (8.0..32.0).contains(&ratio),
            "expected ~16x MSE ratio, got {ratio}"
        );
    }
}
