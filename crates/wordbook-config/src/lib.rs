use std::env;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite database path (or `sqlite::memory:` for an ephemeral store)
    pub db_path: String,
    /// Maximum entries materialized into the in-memory hot tier
    pub hot_capacity: usize,
    /// Frequency ranks below this qualify an entry for the hot tier
    pub hot_rank_threshold: u32,
    /// Exam-list tag that qualifies an entry for the hot tier
    pub hot_tag: String,
}

impl EngineConfig {
    pub fn new() -> Self {
        let db_path =
            env::var("WORDBOOK_DB_PATH").unwrap_or_else(|_| "wordbook.db".to_string());

        let hot_capacity = env::var("WORDBOOK_HOT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);

        let hot_rank_threshold = env::var("WORDBOOK_HOT_RANK_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2000);

        let hot_tag = env::var("WORDBOOK_HOT_TAG").unwrap_or_else(|_| "cet4".to_string());

        EngineConfig {
            db_path,
            hot_capacity,
            hot_rank_threshold,
            hot_tag,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
