//! JSON-directory model store.
//!
//! One JSON document per released round under a single directory. Writes
//! go to a temp file first and are renamed into place, so a crashed write
//! never leaves a partially-visible version.

use crate::core::{Error, Result, RoundId};
use crate::store::backend::ModelStore;
use crate::store::version::ModelVersion;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Store persisting each version as `round_<id>.json`.
pub struct JsonDirStore {
    dir: PathBuf,
    // Serializes the exists-check against the rename in `put`.
    write_lock: Mutex<()>,
}

impl JsonDirStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, round_id: RoundId) -> PathBuf {
        self.dir.join(format!("round_{round_id:08}.json"))
    }

    fn round_id_from(path: &Path) -> Option<RoundId> {
        let name = path.file_name()?.to_str()?;
        let id = name.strip_prefix("round_")?.strip_suffix(".json")?;
        id.parse().ok()
    }
}

#[async_trait]
impl ModelStore for JsonDirStore {
    async fn put(&self, version: ModelVersion) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let path = self.path_for(version.round_id);
        if tokio::fs::try_exists(&path).await? {
            return Err(Error::DuplicateRound(version.round_id));
        }

        let json = serde_json::to_string_pretty(&version)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, round_id: RoundId) -> Result<Option<ModelVersion>> {
        match tokio::fs::read_to_string(self.path_for(round_id)).await {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_latest(&self) -> Result<Option<ModelVersion>> {
        match self.round_ids().await?.last() {
            Some(&round_id) => self.get(round_id).await,
            None => Ok(None),
        }
    }

    async fn round_ids(&self) -> Result<Vec<RoundId>> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = Self::round_id_from(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}
