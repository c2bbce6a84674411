use unicode_normalization::UnicodeNormalization;

/// Canonical form used for every answer comparison: NFKD-decompose, keep
/// alphanumerics only, uppercase.
pub fn normalize_answer(s: &str) -> String {
    s.nfkd()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn answers_match(guess: &str, answer: &str) -> bool {
    normalize_answer(guess) == normalize_answer(answer)
}
