use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wordbook_core::{DictionaryEntry, Tier};

pub mod ingest;
pub mod sqlite;

pub use sqlite::SqliteWordStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("entry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("bulk ingestion cancelled")]
    Cancelled,
}

/// Per-tier provisioning record, consulted by the data-provisioning
/// collaborator to decide whether a re-ingest is needed
#[derive(Debug, Clone)]
pub struct TierMetadata {
    pub tier: Tier,
    /// Unix seconds of the last completed ingestion
    pub ingested_at: i64,
    pub entry_count: u64,
}

/// Durable word storage contract.
///
/// A store that has never been populated is a valid state: `get` answers
/// `None` and `count_all` answers 0. Only backend faults are errors.
#[async_trait]
pub trait WordStore: Send + Sync {
    async fn get(&self, word: &str) -> Result<Option<DictionaryEntry>, StoreError>;

    /// Upsert one entry under the tier's merge priority; true if the row
    /// was inserted or replaced
    async fn put(&self, tier: Tier, entry: &DictionaryEntry) -> Result<bool, StoreError>;

    /// Atomically upsert a batch: either every surviving row is visible to
    /// readers afterwards or none of it is. Returns rows written.
    async fn bulk_put(
        &self,
        tier: Tier,
        entries: &[DictionaryEntry],
        cancel: &CancellationToken,
    ) -> Result<usize, StoreError>;

    async fn count_all(&self) -> Result<u64, StoreError>;

    async fn delete_all(&self) -> Result<(), StoreError>;

    async fn tier_metadata(&self, tier: Tier) -> Result<Option<TierMetadata>, StoreError>;

    async fn record_tier_metadata(
        &self,
        tier: Tier,
        entry_count: u64,
    ) -> Result<(), StoreError>;
}
