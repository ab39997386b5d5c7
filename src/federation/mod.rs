//! Federation Module
//!
//! The aggregation pipeline itself:
//! - Submissions and per-kind vector schemas
//! - Full-or-nothing submission validation
//! - Time-boxed round lifecycle (OPEN -> CLOSED -> AGGREGATED -> RELEASED)
//! - Weighted federated averaging with compensated summation
//! - Concurrency wrapper and round scheduler

pub mod aggregator;
pub mod config;
pub mod manager;
pub mod round;
pub mod service;
pub mod submission;
pub mod validator;

pub use aggregator::{aggregate, AggregateOutput, AggregateResult};
pub use config::{FederationConfig, PrivacyConfig};
pub use manager::{ManagerStats, RoundManager};
pub use round::{Round, RoundStatus};
pub use service::FederationService;
pub use submission::{Submission, SubmissionDraft, SubmissionId, VectorSchema};
pub use validator::{RejectReason, SubmissionValidator};
