use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use wordbook_config::EngineConfig;
use wordbook_core::{DictionaryEntry, Tier, normalize_word};

use crate::{StoreError, WordStore};

/// Raw source record as shipped by the lexical resource: every field is a
/// string, most are optional, and the morphology/tag fields are packed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntry {
    pub word: String,
    pub phonetic: String,
    pub definition: String,
    pub translation: String,
    pub pos: String,
    pub collins: String,
    pub oxford: String,
    pub tag: String,
    pub bnc: String,
    pub frq: String,
    pub exchange: String,
}

/// Outcome summary of one ingestion batch
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub received: usize,
    pub dropped_no_gloss: usize,
    pub unique: usize,
    pub written: usize,
}

/// Canonicalize a raw record. Total: unparseable numerics fall back to 0,
/// unknown morphology codes are preserved under their raw code.
pub fn normalize_entry(raw: &RawEntry) -> DictionaryEntry {
    let quality_star = raw.collins.trim().parse::<u8>().unwrap_or(0).min(5);
    let bnc = raw.bnc.trim().parse::<u32>().unwrap_or(0);
    let frq = raw.frq.trim().parse::<u32>().unwrap_or(0);

    DictionaryEntry {
        word: normalize_word(&raw.word),
        phonetic: raw.phonetic.clone(),
        definition: raw.definition.clone(),
        translation: raw.translation.clone(),
        part_of_speech: raw.pos.clone(),
        quality_star,
        // BNC rank is the primary signal; the contemporary-corpus rank
        // stands in when BNC has no data for the word
        frequency_rank: if bnc != 0 { bnc } else { frq },
        is_core_vocabulary: raw.oxford.trim().eq_ignore_ascii_case("true"),
        category_tags: raw.tag.split_whitespace().map(str::to_string).collect(),
        morphological_forms: parse_exchange(&raw.exchange),
    }
}

/// Parse the slash-delimited `kind:value` morphology field
fn parse_exchange(exchange: &str) -> std::collections::BTreeMap<String, String> {
    exchange
        .split('/')
        .filter_map(|part| part.split_once(':'))
        .filter(|(kind, value)| !kind.is_empty() && !value.is_empty())
        .map(|(kind, value)| {
            let slot = morph_slot(kind).unwrap_or(kind);
            (slot.to_string(), value.to_string())
        })
        .collect()
}

fn morph_slot(code: &str) -> Option<&str> {
    match code {
        "p" => Some("plural"),
        "d" => Some("past"),
        "3" => Some("third_person"),
        "i" => Some("present_participle"),
        "0" => Some("base"),
        "1" => Some("comparative"),
        "s" => Some("superlative"),
        _ => None,
    }
}

/// Hot-tier membership test: a union of curated-quality signals, not a
/// single frequency cutoff
pub fn qualifies_for_hot_tier(entry: &DictionaryEntry, config: &EngineConfig) -> bool {
    if !entry.has_gloss() {
        return false;
    }
    entry.quality_star >= 4
        || entry.is_core_vocabulary
        || entry.category_tags.contains(&config.hot_tag)
        || (entry.frequency_rank != 0 && entry.frequency_rank < config.hot_rank_threshold)
}

/// Deterministic priority ordering: quality star desc, frequency rank asc
/// (unknown last), core vocabulary, then word for total order
pub fn priority_cmp(a: &DictionaryEntry, b: &DictionaryEntry) -> Ordering {
    b.quality_star
        .cmp(&a.quality_star)
        .then(a.rank_or_sentinel().cmp(&b.rank_or_sentinel()))
        .then(b.is_core_vocabulary.cmp(&a.is_core_vocabulary))
        .then(a.word.cmp(&b.word))
}

/// Order hot-tier candidates and truncate to the configured capacity
pub fn rank_hot_candidates(
    mut entries: Vec<DictionaryEntry>,
    capacity: usize,
) -> Vec<DictionaryEntry> {
    entries.sort_by(priority_cmp);
    entries.truncate(capacity);
    entries
}

/// Collapse duplicate words inside one batch, keeping the entry that wins
/// the priority ordering
pub fn dedup_batch(entries: Vec<DictionaryEntry>) -> Vec<DictionaryEntry> {
    let mut best: HashMap<String, DictionaryEntry> = HashMap::new();
    for entry in entries {
        match best.get(&entry.word) {
            Some(current) if priority_cmp(current, &entry) != Ordering::Greater => {}
            _ => {
                best.insert(entry.word.clone(), entry);
            }
        }
    }
    let mut deduped: Vec<DictionaryEntry> = best.into_values().collect();
    deduped.sort_by(|a, b| a.word.cmp(&b.word));
    deduped
}

/// Full ingestion pass for one batch: normalize, drop gloss-less entries,
/// dedup, persist atomically, record tier metadata.
///
/// Re-ingesting the same batch is a no-op beyond refreshing the metadata
/// timestamp.
pub async fn ingest_records<S: WordStore>(
    store: &S,
    tier: Tier,
    raw: &[RawEntry],
    cancel: &CancellationToken,
) -> Result<IngestReport, StoreError> {
    let received = raw.len();
    let normalized: Vec<DictionaryEntry> = raw.iter().map(normalize_entry).collect();

    let glossed: Vec<DictionaryEntry> = normalized
        .into_iter()
        .filter(DictionaryEntry::has_gloss)
        .collect();
    let dropped_no_gloss = received - glossed.len();

    let deduped = dedup_batch(glossed);
    let unique = deduped.len();

    let written = store.bulk_put(tier, &deduped, cancel).await?;
    store.record_tier_metadata(tier, unique as u64).await?;

    tracing::info!(
        "ingest {}: {} received, {} without gloss, {} unique, {} written",
        tier.as_str(),
        received,
        dropped_no_gloss,
        unique,
        written
    );

    Ok(IngestReport {
        received,
        dropped_no_gloss,
        unique,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(word: &str, translation: &str) -> RawEntry {
        RawEntry {
            word: word.to_string(),
            translation: translation.to_string(),
            ..RawEntry::default()
        }
    }

    #[test]
    fn exchange_field_parses_known_codes() {
        let mut record = raw("go", "去");
        record.exchange = "p:goes/d:went/3:goes/i:going/0:go".to_string();

        let entry = normalize_entry(&record);
        assert_eq!(entry.morphological_forms["plural"], "goes");
        assert_eq!(entry.morphological_forms["past"], "went");
        assert_eq!(entry.morphological_forms["third_person"], "goes");
        assert_eq!(entry.morphological_forms["present_participle"], "going");
        assert_eq!(entry.morphological_forms["base"], "go");
    }

    #[test]
    fn unknown_exchange_codes_are_preserved() {
        let mut record = raw("run", "跑");
        record.exchange = "d:ran/x:runner".to_string();

        let entry = normalize_entry(&record);
        assert_eq!(entry.morphological_forms["past"], "ran");
        assert_eq!(entry.morphological_forms["x"], "runner");
    }

    #[test]
    fn malformed_exchange_parts_are_skipped() {
        let mut record = raw("odd", "奇");
        record.exchange = "p:/:x/plain/d:odded".to_string();

        let entry = normalize_entry(&record);
        assert_eq!(entry.morphological_forms.len(), 1);
        assert_eq!(entry.morphological_forms["past"], "odded");
    }

    #[test]
    fn numeric_fields_fall_back_to_zero() {
        let mut record = raw("word", "词");
        record.collins = "not-a-number".to_string();
        record.bnc = "".to_string();
        record.frq = "junk".to_string();

        let entry = normalize_entry(&record);
        assert_eq!(entry.quality_star, 0);
        assert_eq!(entry.frequency_rank, 0);
    }

    #[test]
    fn frq_rank_fills_in_for_missing_bnc() {
        let mut record = raw("word", "词");
        record.bnc = "0".to_string();
        record.frq = "1234".to_string();
        assert_eq!(normalize_entry(&record).frequency_rank, 1234);

        record.bnc = "500".to_string();
        assert_eq!(normalize_entry(&record).frequency_rank, 500);
    }

    #[test]
    fn tags_split_on_whitespace() {
        let mut record = raw("exam", "考试");
        record.tag = " cet4  cet6 ielts ".to_string();

        let entry = normalize_entry(&record);
        assert_eq!(entry.category_tags.len(), 3);
        assert!(entry.category_tags.contains("cet4"));

        record.tag = "   ".to_string();
        assert!(normalize_entry(&record).category_tags.is_empty());
    }

    #[test]
    fn word_is_normalized() {
        let record = raw("  Hello ", "你好");
        assert_eq!(normalize_entry(&record).word, "hello");
    }

    #[test]
    fn hot_tier_qualification_is_a_union() {
        let config = EngineConfig {
            db_path: String::new(),
            hot_capacity: 100,
            hot_rank_threshold: 2000,
            hot_tag: "cet4".to_string(),
        };

        let mut e = normalize_entry(&raw("plain", "词"));
        assert!(!qualifies_for_hot_tier(&e, &config));

        e.quality_star = 4;
        assert!(qualifies_for_hot_tier(&e, &config));

        e.quality_star = 0;
        e.is_core_vocabulary = true;
        assert!(qualifies_for_hot_tier(&e, &config));

        e.is_core_vocabulary = false;
        e.category_tags.insert("cet4".to_string());
        assert!(qualifies_for_hot_tier(&e, &config));

        e.category_tags.clear();
        e.frequency_rank = 1999;
        assert!(qualifies_for_hot_tier(&e, &config));
        e.frequency_rank = 2000;
        assert!(!qualifies_for_hot_tier(&e, &config));

        // a gloss-less entry never qualifies
        let bare = normalize_entry(&RawEntry {
            word: "bare".to_string(),
            collins: "5".to_string(),
            ..RawEntry::default()
        });
        assert!(!qualifies_for_hot_tier(&bare, &config));
    }

    #[test]
    fn hot_ranking_sorts_and_truncates() {
        let mut a = normalize_entry(&raw("aa", "一"));
        a.quality_star = 5;
        a.frequency_rank = 100;
        let mut b = normalize_entry(&raw("bb", "二"));
        b.quality_star = 5;
        b.frequency_rank = 50;
        let mut c = normalize_entry(&raw("cc", "三"));
        c.quality_star = 4;
        c.frequency_rank = 1;
        let mut d = normalize_entry(&raw("dd", "四"));
        d.quality_star = 5;
        // unknown rank sorts after every real rank
        d.frequency_rank = 0;

        let ranked = rank_hot_candidates(vec![a, b, c, d], 3);
        let words: Vec<&str> = ranked.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["bb", "aa", "dd"]);
    }

    #[test]
    fn core_vocabulary_breaks_ties() {
        let mut a = normalize_entry(&raw("aaa", "一"));
        a.quality_star = 3;
        a.frequency_rank = 10;
        let mut b = normalize_entry(&raw("bbb", "二"));
        b.quality_star = 3;
        b.frequency_rank = 10;
        b.is_core_vocabulary = true;

        let ranked = rank_hot_candidates(vec![a, b], 2);
        assert_eq!(ranked[0].word, "bbb");
    }

    #[test]
    fn dedup_keeps_the_priority_winner() {
        let mut low = normalize_entry(&raw("bank", "银行"));
        low.quality_star = 2;
        let mut high = normalize_entry(&raw("bank", "河岸"));
        high.quality_star = 4;

        // winner is independent of batch order
        let forward = dedup_batch(vec![low.clone(), high.clone()]);
        let backward = dedup_batch(vec![high.clone(), low.clone()]);
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].translation, "河岸");
    }

    #[test]
    fn dedup_is_deterministic_over_conflicting_pairs() {
        // a small matrix of conflicting attribute combinations; every pair
        // must resolve identically regardless of order
        let cases = [
            (5u8, 100u32, false, 3u8, 1u32, true),
            (4, 0, false, 4, 7, false),
            (4, 7, true, 4, 7, false),
            (2, 0, false, 2, 0, true),
        ];
        for (q1, r1, c1, q2, r2, c2) in cases {
            let mut first = normalize_entry(&raw("dup", "甲"));
            first.quality_star = q1;
            first.frequency_rank = r1;
            first.is_core_vocabulary = c1;
            let mut second = normalize_entry(&raw("dup", "乙"));
            second.quality_star = q2;
            second.frequency_rank = r2;
            second.is_core_vocabulary = c2;

            let forward = dedup_batch(vec![first.clone(), second.clone()]);
            let backward = dedup_batch(vec![second, first]);
            assert_eq!(forward, backward);
        }
    }
}
