//! Core utilities and common types for the federation core.

pub mod error;
pub mod logging;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
