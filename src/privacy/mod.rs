//! Privacy Module
//!
//! Everything that keeps individual organizations unidentifiable:
//! - Pseudonym derivation from real identifiers
//! - Local Gaussian noise applied before a vector leaves the organization
//! - Laplace release noise applied to aggregates before publication

pub mod anonymizer;
pub mod noise;
pub mod release;

pub use anonymizer::{Anonymizer, Pseudonym};
pub use noise::NoiseInjector;
pub use release::ReleaseFilter;
