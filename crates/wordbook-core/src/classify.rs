/// Category of a raw query string, decided before any lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    SingleWord,
    Phrase,
    Sentence,
}

/// Classify a raw input string to pick a routing strategy.
///
/// Anything the word-level engine cannot handle (CJK text, punctuation,
/// more than five tokens, empty input) falls open to `Sentence`.
pub fn classify(text: &str) -> QueryKind {
    let trimmed = text.trim();

    // Word-level matching assumes Latin-script tokenization
    if trimmed.chars().any(is_cjk_ideograph) {
        return QueryKind::Sentence;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    match tokens.len() {
        0 => QueryKind::Sentence,
        1 => {
            if is_plain_word(tokens[0]) {
                QueryKind::SingleWord
            } else {
                QueryKind::Sentence
            }
        }
        2..=5 => QueryKind::Phrase,
        _ => QueryKind::Sentence,
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Letters, hyphens and apostrophes only
fn is_plain_word(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '\'')
}
