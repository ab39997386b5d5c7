//! Store Module
//!
//! Append-only persistence of released model versions, keyed by round id:
//! - `ModelStore` trait all backends implement
//! - In-memory backend for tests and embedded use
//! - JSON-directory backend (one document per round)
//! - Configuration-driven factory

pub mod backend;
pub mod factory;
pub mod json_dir;
pub mod memory;
pub mod version;

pub use backend::ModelStore;
pub use factory::{create_model_store, StoreConfig};
pub use json_dir::JsonDirStore;
pub use memory::MemoryModelStore;
pub use version::ModelVersion;
