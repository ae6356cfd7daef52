use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection};
use tokio_util::sync::CancellationToken;
use wordbook_core::{DictionaryEntry, Tier};

use crate::{StoreError, TierMetadata, WordStore};

/// Rank sentinel inlined into SQL so unknown ranks (0) sort last
const SQL_RANK_SENTINEL: &str = "4294967295";

const SCHEMA: [&str; 6] = [
    "CREATE TABLE IF NOT EXISTS entries (
        word TEXT PRIMARY KEY,
        phonetic TEXT NOT NULL DEFAULT '',
        definition TEXT NOT NULL DEFAULT '',
        translation TEXT NOT NULL DEFAULT '',
        part_of_speech TEXT NOT NULL DEFAULT '',
        quality_star INTEGER NOT NULL DEFAULT 0,
        frequency_rank INTEGER NOT NULL DEFAULT 0,
        is_core INTEGER NOT NULL DEFAULT 0,
        tags TEXT NOT NULL DEFAULT '[]',
        forms TEXT NOT NULL DEFAULT '{}',
        tier_rank INTEGER NOT NULL DEFAULT 3
    )",
    "CREATE INDEX IF NOT EXISTS idx_entries_quality ON entries (quality_star)",
    "CREATE INDEX IF NOT EXISTS idx_entries_core ON entries (is_core)",
    "CREATE TABLE IF NOT EXISTS entry_tags (
        word TEXT NOT NULL,
        tag TEXT NOT NULL,
        PRIMARY KEY (word, tag)
    )",
    "CREATE INDEX IF NOT EXISTS idx_entry_tags_tag ON entry_tags (tag)",
    "CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        ingested_at INTEGER NOT NULL,
        entry_count INTEGER NOT NULL
    )",
];

/// Upsert with the cross-tier merge rule: the incoming row wins only when
/// its tier outranks the stored one, or ties on tier and wins the
/// quality/frequency ordering. RETURNING tells us whether it took effect.
const UPSERT_SQL: &str = "INSERT INTO entries \
        (word, phonetic, definition, translation, part_of_speech, \
         quality_star, frequency_rank, is_core, tags, forms, tier_rank) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
     ON CONFLICT(word) DO UPDATE SET \
        phonetic = excluded.phonetic, \
        definition = excluded.definition, \
        translation = excluded.translation, \
        part_of_speech = excluded.part_of_speech, \
        quality_star = excluded.quality_star, \
        frequency_rank = excluded.frequency_rank, \
        is_core = excluded.is_core, \
        tags = excluded.tags, \
        forms = excluded.forms, \
        tier_rank = excluded.tier_rank \
     WHERE excluded.tier_rank < entries.tier_rank \
        OR (excluded.tier_rank = entries.tier_rank \
            AND (excluded.quality_star > entries.quality_star \
                 OR (excluded.quality_star = entries.quality_star \
                     AND (CASE WHEN excluded.frequency_rank = 0 THEN 4294967295 \
                               ELSE excluded.frequency_rank END) \
                       < (CASE WHEN entries.frequency_rank = 0 THEN 4294967295 \
                               ELSE entries.frequency_rank END)))) \
     RETURNING word";

const SELECT_COLUMNS: &str = "entries.word, entries.phonetic, entries.definition, \
     entries.translation, entries.part_of_speech, entries.quality_star, \
     entries.frequency_rank, entries.is_core, entries.tags, entries.forms";

/// SQLite-backed durable store for the full corpus
pub struct SqliteWordStore {
    pool: SqlitePool,
}

impl SqliteWordStore {
    /// Open (creating if missing) the database at `path`. Accepts either a
    /// plain file path or a sqlite URL such as `sqlite::memory:`.
    ///
    /// Failure here is the engine's one fatal initialization path.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let options = if path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)?
        } else {
            SqliteConnectOptions::new().filename(path)
        }
        .create_if_missing(true);

        // Single connection: one logical worker owns the store, and it
        // keeps in-memory databases alive across pool checkouts.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Entries carrying `tag`, best first
    pub async fn find_by_tag(
        &self,
        tag: &str,
        limit: u32,
    ) -> Result<Vec<DictionaryEntry>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM entries \
             JOIN entry_tags ON entry_tags.word = entries.word \
             WHERE entry_tags.tag = ?1 \
             ORDER BY quality_star DESC, \
                      CASE WHEN frequency_rank = 0 THEN {SQL_RANK_SENTINEL} \
                           ELSE frequency_rank END ASC \
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(tag)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(entry_from_row).collect()
    }

    /// Entries at or above a quality star, best first
    pub async fn find_by_min_quality(
        &self,
        min_star: u8,
        limit: u32,
    ) -> Result<Vec<DictionaryEntry>, StoreError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM entries \
             WHERE quality_star >= ?1 \
             ORDER BY quality_star DESC, \
                      CASE WHEN frequency_rank = 0 THEN {SQL_RANK_SENTINEL} \
                           ELSE frequency_rank END ASC \
             LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(min_star)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(entry_from_row).collect()
    }

    pub async fn count_core_vocabulary(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM entries WHERE is_core = 1")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }
}

#[async_trait]
impl WordStore for SqliteWordStore {
    async fn get(&self, word: &str) -> Result<Option<DictionaryEntry>, StoreError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM entries WHERE word = ?1");
        let row = sqlx::query(&sql)
            .bind(word)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(entry_from_row).transpose()
    }

    async fn put(&self, tier: Tier, entry: &DictionaryEntry) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let written = upsert_entry(&mut *tx, tier, entry).await?;
        tx.commit().await?;
        Ok(written)
    }

    async fn bulk_put(
        &self,
        tier: Tier,
        entries: &[DictionaryEntry],
        cancel: &CancellationToken,
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0usize;

        for entry in entries {
            if cancel.is_cancelled() {
                tx.rollback().await?;
                tracing::warn!("bulk ingestion cancelled after {} rows staged", written);
                return Err(StoreError::Cancelled);
            }
            if upsert_entry(&mut *tx, tier, entry).await? {
                written += 1;
            }
        }

        tx.commit().await?;
        tracing::debug!(
            "bulk_put {}: {} of {} rows written",
            tier.as_str(),
            written,
            entries.len()
        );
        Ok(written)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM entries")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u64)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM entry_tags").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM entries").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM metadata").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn tier_metadata(&self, tier: Tier) -> Result<Option<TierMetadata>, StoreError> {
        let row = sqlx::query("SELECT ingested_at, entry_count FROM metadata WHERE key = ?1")
            .bind(tier.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| -> Result<TierMetadata, StoreError> {
            let ingested_at: i64 = r.try_get("ingested_at")?;
            let entry_count: i64 = r.try_get("entry_count")?;
            Ok(TierMetadata {
                tier,
                ingested_at,
                entry_count: entry_count as u64,
            })
        })
        .transpose()
    }

    async fn record_tier_metadata(
        &self,
        tier: Tier,
        entry_count: u64,
    ) -> Result<(), StoreError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        sqlx::query(
            "INSERT INTO metadata (key, ingested_at, entry_count) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET \
                ingested_at = excluded.ingested_at, \
                entry_count = excluded.entry_count",
        )
        .bind(tier.as_str())
        .bind(now)
        .bind(entry_count as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

async fn upsert_entry(
    conn: &mut SqliteConnection,
    tier: Tier,
    entry: &DictionaryEntry,
) -> Result<bool, StoreError> {
    let tags = serde_json::to_string(&entry.category_tags)?;
    let forms = serde_json::to_string(&entry.morphological_forms)?;

    let updated = sqlx::query(UPSERT_SQL)
        .bind(&entry.word)
        .bind(&entry.phonetic)
        .bind(&entry.definition)
        .bind(&entry.translation)
        .bind(&entry.part_of_speech)
        .bind(entry.quality_star as i64)
        .bind(entry.frequency_rank as i64)
        .bind(entry.is_core_vocabulary)
        .bind(&tags)
        .bind(&forms)
        .bind(tier.rank() as i64)
        .fetch_optional(&mut *conn)
        .await?
        .is_some();

    if updated {
        sqlx::query("DELETE FROM entry_tags WHERE word = ?1")
            .bind(&entry.word)
            .execute(&mut *conn)
            .await?;
        for tag in &entry.category_tags {
            sqlx::query("INSERT OR IGNORE INTO entry_tags (word, tag) VALUES (?1, ?2)")
                .bind(&entry.word)
                .bind(tag)
                .execute(&mut *conn)
                .await?;
        }
    }

    Ok(updated)
}

fn entry_from_row(row: &SqliteRow) -> Result<DictionaryEntry, StoreError> {
    let quality_star: i64 = row.try_get("quality_star")?;
    let frequency_rank: i64 = row.try_get("frequency_rank")?;
    let tags_json: String = row.try_get("tags")?;
    let forms_json: String = row.try_get("forms")?;

    let category_tags: BTreeSet<String> = serde_json::from_str(&tags_json)?;
    let morphological_forms: BTreeMap<String, String> = serde_json::from_str(&forms_json)?;

    Ok(DictionaryEntry {
        word: row.try_get("word")?,
        phonetic: row.try_get("phonetic")?,
        definition: row.try_get("definition")?,
        translation: row.try_get("translation")?,
        part_of_speech: row.try_get("part_of_speech")?,
        quality_star: quality_star as u8,
        frequency_rank: frequency_rank as u32,
        is_core_vocabulary: row.try_get("is_core")?,
        category_tags,
        morphological_forms,
    })
}
