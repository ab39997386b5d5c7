//! Query Module
//!
//! Read-only access to released model versions and metric trends.

pub mod service;

pub use service::{Projection, QueryService, TrendPoint};
