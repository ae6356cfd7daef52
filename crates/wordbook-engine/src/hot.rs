use std::collections::HashMap;

use wordbook_core::DictionaryEntry;

/// In-memory tier-1 cache: built once, immutable afterwards, no eviction.
/// Membership is fixed at ingestion time, so lookups never mutate it.
#[derive(Debug, Default)]
pub struct HotTierCache {
    entries: HashMap<String, DictionaryEntry>,
}

impl HotTierCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<DictionaryEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (e.word.clone(), e))
            .collect();
        Self { entries }
    }

    pub fn get(&self, word: &str) -> Option<&DictionaryEntry> {
        self.entries.get(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
