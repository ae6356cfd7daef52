pub mod classify;
pub mod morphology;
pub mod types;

pub use classify::{QueryKind, classify};
pub use morphology::base_form_candidates;
pub use types::{DictionaryEntry, LookupResult, LookupSource, Tier, normalize_word};
