use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use wordbook_config::EngineConfig;
use wordbook_core::{
    DictionaryEntry, LookupResult, LookupSource, QueryKind, Tier, base_form_candidates,
    classify, normalize_word,
};
use wordbook_store::ingest::{
    IngestReport, RawEntry, ingest_records, normalize_entry, qualifies_for_hot_tier,
    rank_hot_candidates,
};
use wordbook_store::{StoreError, WordStore};

use crate::hot::HotTierCache;
use crate::stats::{EngineStats, StatsSnapshot};

const PHRASE_TOKEN_CEILING: usize = 5;

/// Tiered lookup orchestrator: hot tier, then durable store, then
/// morphological fallback. One logical worker owns an engine; every
/// lookup updates its statistics.
pub struct DictionaryEngine<S> {
    store: S,
    config: EngineConfig,
    hot: HotTierCache,
    hot_loaded: bool,
    stats: EngineStats,
}

impl<S: WordStore> DictionaryEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            hot: HotTierCache::new(),
            hot_loaded: false,
            stats: EngineStats::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Materialize the hot tier from a provisioning batch. Entries are
    /// ranked and truncated to the configured capacity, written through to
    /// the durable store, then cached. A second call is a no-op.
    pub async fn load_hot_tier(
        &mut self,
        records: &[RawEntry],
        cancel: &CancellationToken,
    ) -> Result<usize, StoreError> {
        if self.hot_loaded {
            tracing::debug!("hot tier already in memory ({} words)", self.hot.len());
            return Ok(self.hot.len());
        }

        let started = Instant::now();
        let glossed: Vec<DictionaryEntry> = records
            .iter()
            .map(normalize_entry)
            .filter(DictionaryEntry::has_gloss)
            .collect();
        let selected = rank_hot_candidates(glossed, self.config.hot_capacity);

        self.store.bulk_put(Tier::Hot, &selected, cancel).await?;
        self.store
            .record_tier_metadata(Tier::Hot, selected.len() as u64)
            .await?;

        self.hot = HotTierCache::from_entries(selected);
        self.hot_loaded = true;

        tracing::info!(
            "hot tier loaded: {} words in {:.2}ms",
            self.hot.len(),
            started.elapsed().as_secs_f64() * 1000.0
        );
        Ok(self.hot.len())
    }

    /// Ingest a cold-tier batch into the durable store
    pub async fn ingest(
        &self,
        tier: Tier,
        records: &[RawEntry],
        cancel: &CancellationToken,
    ) -> Result<IngestReport, StoreError> {
        ingest_records(&self.store, tier, records, cancel).await
    }

    /// Partition an untiered dump by the hot-tier qualification rule, then
    /// load the hot part and persist the rest as the full tier
    pub async fn ingest_auto(
        &mut self,
        records: &[RawEntry],
        cancel: &CancellationToken,
    ) -> Result<(usize, IngestReport), StoreError> {
        let (hot, cold): (Vec<RawEntry>, Vec<RawEntry>) = records
            .iter()
            .cloned()
            .partition(|r| qualifies_for_hot_tier(&normalize_entry(r), &self.config));

        let hot_size = self.load_hot_tier(&hot, cancel).await?;
        let report = self.ingest(Tier::Full, &cold, cancel).await?;
        Ok((hot_size, report))
    }

    /// Single-word lookup. A miss is a normal result; only storage faults
    /// are errors.
    pub async fn lookup(&mut self, raw: &str) -> Result<LookupResult, StoreError> {
        let started = Instant::now();
        let word = normalize_word(raw);

        if let Some(entry) = self.hot.get(&word) {
            let entry = entry.clone();
            let elapsed = started.elapsed();
            self.stats.record_hit(elapsed);
            tracing::debug!("hot-tier hit: \"{word}\" ({})", fmt_ms(elapsed));
            return Ok(hit(entry, LookupSource::HotTier, word, elapsed));
        }

        if let Some(entry) = self.store.get(&word).await? {
            let elapsed = started.elapsed();
            self.stats.record_hit(elapsed);
            tracing::debug!("durable-store hit: \"{word}\" ({})", fmt_ms(elapsed));
            return Ok(hit(entry, LookupSource::DurableStore, word, elapsed));
        }

        if let Some((matched, entry)) = self.lookup_variant(&word).await? {
            let elapsed = started.elapsed();
            self.stats.record_hit(elapsed);
            tracing::debug!(
                "morphological hit: \"{word}\" -> \"{matched}\" ({})",
                fmt_ms(elapsed)
            );
            return Ok(hit(entry, LookupSource::Morphological, matched, elapsed));
        }

        let elapsed = started.elapsed();
        self.stats.record_miss(elapsed);
        tracing::debug!("miss: \"{word}\" ({})", fmt_ms(elapsed));
        Ok(LookupResult::miss(elapsed))
    }

    /// Try derived base forms against both tiers, hot first, in the fixed
    /// rule order. First hit wins; no second-level stemming.
    async fn lookup_variant(
        &self,
        word: &str,
    ) -> Result<Option<(String, DictionaryEntry)>, StoreError> {
        for candidate in base_form_candidates(word) {
            if let Some(entry) = self.hot.get(&candidate) {
                return Ok(Some((candidate, entry.clone())));
            }
            if let Some(entry) = self.store.get(&candidate).await? {
                return Ok(Some((candidate, entry)));
            }
        }
        Ok(None)
    }

    /// Per-token lookup for 2-5 token phrases; `None` when the input is
    /// out of scope or nothing matched
    pub async fn lookup_phrase(
        &mut self,
        raw: &str,
    ) -> Result<Option<Vec<LookupResult>>, StoreError> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.is_empty() || tokens.len() > PHRASE_TOKEN_CEILING {
            return Ok(None);
        }

        let mut results = Vec::new();
        for token in tokens {
            let result = self.lookup(token).await?;
            if result.is_hit() {
                results.push(result);
            }
        }

        Ok(if results.is_empty() { None } else { Some(results) })
    }

    pub fn classify(&self, text: &str) -> QueryKind {
        classify(text)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.hot.len(), self.hot_loaded)
    }
}

fn hit(
    entry: DictionaryEntry,
    source: LookupSource,
    matched_word: String,
    elapsed: Duration,
) -> LookupResult {
    LookupResult {
        entry: Some(entry),
        source: Some(source),
        matched_word: Some(matched_word),
        elapsed,
    }
}

fn fmt_ms(elapsed: Duration) -> String {
    format!("{:.2}ms", elapsed.as_secs_f64() * 1000.0)
}
