//! Identity anonymization.
//!
//! Derives a stable, non-reversible pseudonym from an organization's real
//! identifier and a salt that only the organization holds.

use crate::core::{Error, Hash256, Result};
use crate::federation::config::PrivacyConfig;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// Length of the hex pseudonym exposed to the aggregation side.
const PSEUDONYM_LEN: usize = 32;

/// Default number of hash iterations.
const DEFAULT_ITERATIONS: u32 = 1000;

/// Opaque, non-reversible organization identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pseudonym(String);

impl Pseudonym {
    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Pseudonym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
impl Pseudonym {
    /// Build a pseudonym directly, bypassing derivation. Test use only.
    pub fn raw(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Derives pseudonyms via iterated SHA3-256.
///
/// Deterministic for a given `(real_id, org_salt)` pair, so repeated
/// submissions from the same organization map to the same pseudonym, while
/// inversion requires breaking the hash. The salt is stored only at the
/// organization, never centrally.
#[derive(Clone, Debug)]
pub struct Anonymizer {
    iterations: u32,
}

impl Anonymizer {
    /// Create an anonymizer with the default iteration count.
    pub fn new() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }

    /// Override the iteration count. Values below 1 are raised to 1.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    /// Create an anonymizer using the deployment's configured iteration
    /// count. Organizations derive their pseudonyms with this so every
    /// party in a federation hashes identically.
    pub fn from_config(config: &PrivacyConfig) -> Self {
        Self::new().with_iterations(config.hash_iterations)
    }

    /// Derive the pseudonym for `real_id` under `org_salt`.
    pub fn anonymize(&self, real_id: &str, org_salt: &str) -> Result<Pseudonym> {
        if real_id.trim().is_empty() {
            return Err(Error::InvalidIdentity("empty identifier".to_string()));
        }
        if org_salt.trim().is_empty() {
            return Err(Error::InvalidIdentity("empty salt".to_string()));
        }

        let chunks: &[&[u8]] = &[real_id.as_bytes(), b"_", org_salt.as_bytes()];
        let mut digest = sha3_256_multi(chunks);
        for _ in 0..self.iterations {
            digest = sha3_256(digest.as_bytes());
        }

        let hex = digest.to_hex();
        Ok(Pseudonym(hex[..PSEUDONYM_LEN].to_string()))
    }
}

impl Default for Anonymizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute SHA3-256 hash of data.
pub fn sha3_256(data: &[u8]) -> Hash256 {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash256::new(bytes)
}

/// Compute SHA3-256 hash of multiple data chunks.
pub fn sha3_256_multi(chunks: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha3_256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&result);
    Hash256::new(bytes)
}
