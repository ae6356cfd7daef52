use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Rank value used when a corpus frequency rank is unknown (0 in source data).
pub const RANK_UNKNOWN_SENTINEL: u32 = u32::MAX;

/// Tags worth surfacing to the user when rendering an entry
const DISPLAY_TAGS: [&str; 5] = ["cet4", "cet6", "ielts", "toefl", "gre"];

/// A single normalized dictionary entry, keyed by its lowercase word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub phonetic: String,
    pub definition: String,
    pub translation: String,
    pub part_of_speech: String,
    /// Curated quality signal, 0-5 (higher = more authoritative)
    pub quality_star: u8,
    /// Corpus frequency rank, lower = more common; 0 = unknown
    pub frequency_rank: u32,
    pub is_core_vocabulary: bool,
    pub category_tags: BTreeSet<String>,
    /// Variant kind (plural, past, ...) to surface form
    pub morphological_forms: BTreeMap<String, String>,
}

impl DictionaryEntry {
    /// Whether the entry carries any gloss at all
    pub fn has_gloss(&self) -> bool {
        !self.definition.is_empty() || !self.translation.is_empty()
    }

    /// Frequency rank with unknown (0) pushed past every real rank
    pub fn rank_or_sentinel(&self) -> u32 {
        if self.frequency_rank == 0 {
            RANK_UNKNOWN_SENTINEL
        } else {
            self.frequency_rank
        }
    }

    /// Render the entry as a plain-text block for display
    pub fn format(&self) -> String {
        let mut out = self.word.clone();

        if !self.phonetic.is_empty() {
            out.push_str(&format!(" /{}/", self.phonetic));
        }
        if self.quality_star > 0 {
            out.push(' ');
            out.push_str(&"★".repeat(self.quality_star as usize));
        }

        let display_tags: Vec<String> = self
            .category_tags
            .iter()
            .filter(|t| DISPLAY_TAGS.contains(&t.as_str()))
            .map(|t| t.to_uppercase())
            .collect();
        if !display_tags.is_empty() {
            out.push_str(&format!(" [{}]", display_tags.join(", ")));
        }

        if !self.translation.is_empty() {
            out.push_str(&format!("\n\n{}", self.translation));
        }
        if !self.definition.is_empty() {
            out.push_str(&format!("\n\n{}", self.definition));
        }

        if !self.morphological_forms.is_empty() {
            out.push_str("\n\nforms:");
            for (kind, value) in &self.morphological_forms {
                out.push_str(&format!("\n  {}: {}", kind, value));
            }
        }

        out
    }
}

/// Corpus partition an entry was ingested into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Tier 1: in-memory hot set, capped size
    Hot,
    /// Tier 2: extended vocabulary, durable store only
    Extended,
    /// Tier 3: full corpus, durable store only
    Full,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "tier1",
            Tier::Extended => "tier2",
            Tier::Full => "tier3",
        }
    }

    /// Merge priority: lower wins on duplicate words across tiers
    pub fn rank(&self) -> u8 {
        match self {
            Tier::Hot => 1,
            Tier::Extended => 2,
            Tier::Full => 3,
        }
    }
}

/// Where a lookup hit was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    HotTier,
    DurableStore,
    /// Hit on a derived base form rather than the queried word
    Morphological,
}

/// Outcome of a single lookup; a miss is a value, not an error
#[derive(Debug, Clone)]
pub struct LookupResult {
    pub entry: Option<DictionaryEntry>,
    pub source: Option<LookupSource>,
    /// The word that actually matched; differs from the query on
    /// morphological fallback
    pub matched_word: Option<String>,
    pub elapsed: Duration,
}

impl LookupResult {
    pub fn is_hit(&self) -> bool {
        self.entry.is_some()
    }

    pub fn miss(elapsed: Duration) -> Self {
        Self {
            entry: None,
            source: None,
            matched_word: None,
            elapsed,
        }
    }
}

/// Canonical word normalization: trim, NFKC, lowercase
pub fn normalize_word(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>().to_lowercase()
}
