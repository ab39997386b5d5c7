//! ModelStore trait definition.
//!
//! Contract every persistence backend must satisfy: append-only storage of
//! model versions keyed by round id, durable once `put` returns Ok.

use crate::core::{Result, RoundId};
use crate::store::version::ModelVersion;
use async_trait::async_trait;

/// Append-only store of released model versions.
///
/// `put` is the only writer entry point; a `round_id` that already has a
/// version fails with `Error::DuplicateRound` and leaves the stored value
/// unchanged. If `put` errors, the caller must treat the release as not
/// having happened.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Persist a version. Fails on a duplicate round id.
    async fn put(&self, version: ModelVersion) -> Result<()>;

    /// Fetch the version for a round, if stored.
    async fn get(&self, round_id: RoundId) -> Result<Option<ModelVersion>>;

    /// Fetch the version with the highest round id, if any.
    async fn get_latest(&self) -> Result<Option<ModelVersion>>;

    /// All stored round ids, ascending.
    async fn round_ids(&self) -> Result<Vec<RoundId>>;
}
