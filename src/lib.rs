//! # tourfed - Privacy-preserving federated aggregation
//!
//! A federated aggregation core for collaborative tourism-sector models:
//! - **privacy**: pseudonym derivation, local Gaussian noise, Laplace
//!   release filter
//! - **federation**: validated submissions, time-boxed rounds, weighted
//!   federated averaging
//! - **store**: append-only versioned model storage
//! - **query**: read-only access to released versions and metric trends
//!
//! Raw per-company data never enters this crate: organizations submit
//! pseudonymous, locally-noised parameter vectors, and only noised
//! aggregates ever leave it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tourfed::core::ModelKind;
//! use tourfed::federation::{
//!     FederationConfig, FederationService, PrivacyConfig, SubmissionDraft, VectorSchema,
//! };
//! use tourfed::privacy::Anonymizer;
//! use tourfed::store::MemoryModelStore;
//!
//! #[tokio::main]
//! async fn main() -> tourfed::Result<()> {
//!     let config = FederationConfig::default()
//!         .with_schema(VectorSchema::new(ModelKind::DemandForecast, 8));
//!     let service = FederationService::new(
//!         config,
//!         PrivacyConfig::default(),
//!         Arc::new(MemoryModelStore::new()),
//!     );
//!
//!     let round_id = service.open_round(ModelKind::DemandForecast).await?;
//!     let pseudonym = Anonymizer::new().anonymize("hotel-regina", "org-local-salt")?;
//!     service
//!         .accept_submission(
//!             round_id,
//!             SubmissionDraft {
//!                 pseudonym,
//!                 round_id,
//!                 parameter_vector: vec![0.0; 8],
//!                 weight: 1.0,
//!                 metrics: HashMap::new(),
//!             },
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod federation;
pub mod privacy;
pub mod query;
pub mod store;

pub use crate::core::error::{Error, Result};
