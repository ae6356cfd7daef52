/// Derive candidate base forms for an inflected word by stripping common
/// suffixes. Rule-based and intentionally crude: candidates are guesses to
/// be checked against the dictionary tiers, not linguistic analysis.
///
/// Each strip also yields a consonant-de-doubled variant (running → runn →
/// run, bigger → bigg → big). Candidates come back in fixed rule order,
/// deduplicated, excluding the input itself and anything of two characters
/// or fewer.
pub fn base_form_candidates(word: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    let stems: [Option<String>; 7] = [
        word.strip_suffix("ing").map(str::to_string),
        word.strip_suffix("ed").map(str::to_string),
        word.strip_suffix("s").map(str::to_string),
        word.strip_suffix("es").map(str::to_string),
        word.strip_suffix("ies").map(|stem| format!("{stem}y")),
        word.strip_suffix("er").map(str::to_string),
        word.strip_suffix("est").map(str::to_string),
    ];

    let mut push = |candidate: String| {
        if candidate != word
            && candidate.chars().count() > 2
            && !candidates.contains(&candidate)
        {
            candidates.push(candidate);
        }
    };

    for stem in stems.into_iter().flatten() {
        if let Some(undoubled) = strip_doubled_consonant(&stem) {
            push(stem.clone());
            push(undoubled);
        } else {
            push(stem);
        }
    }

    candidates
}

/// "runn" → "run"; None when the stem does not end in a doubled consonant
fn strip_doubled_consonant(stem: &str) -> Option<String> {
    let mut chars = stem.chars().rev();
    let last = chars.next()?;
    let prev = chars.next()?;
    if last == prev && last.is_ascii_alphabetic() && !"aeiou".contains(last) {
        Some(stem[..stem.len() - last.len_utf8()].to_string())
    } else {
        None
    }
}
