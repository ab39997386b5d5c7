//! Configuration-driven store construction.

use crate::core::Result;
use crate::store::backend::ModelStore;
use crate::store::json_dir::JsonDirStore;
use crate::store::memory::MemoryModelStore;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Which persistence backend to use.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StoreConfig {
    /// In-process map; versions live for the process lifetime
    Memory,
    /// One JSON document per round under `dir`
    JsonDir {
        /// Root directory for version documents
        dir: PathBuf,
    },
}

/// Build the store a config names.
pub fn create_model_store(config: &StoreConfig) -> BoxFuture<'_, Result<Arc<dyn ModelStore>>> {
    async move {
        match config {
            StoreConfig::Memory => {
                Ok(Arc::new(MemoryModelStore::new()) as Arc<dyn ModelStore>)
            }
            StoreConfig::JsonDir { dir } => {
                let store = JsonDirStore::open(dir.clone()).await?;
                Ok(Arc::new(store) as Arc<dyn ModelStore>)
            }
        }
    }
    .boxed()
}
