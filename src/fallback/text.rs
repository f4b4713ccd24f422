//! Text helpers shared by the knowledge matcher and the intent rules.

/// Words that carry no topic on their own.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "as", "at", "be", "by", "can", "could", "did",
    "do", "does", "for", "from", "give", "had", "has", "have", "he", "her", "him", "his", "how",
    "i", "in", "is", "it", "its", "know", "me", "more", "my", "of", "on", "or", "our", "please",
    "she", "should", "so", "some", "something", "tell", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "to", "us", "want", "was", "we", "were", "what", "whats",
    "when", "where", "which", "who", "whos", "why", "will", "with", "would", "you", "your",
];

/// Lowercase, drop punctuation, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// First `n` characters of `token`, or `None` when it is shorter.
pub fn char_prefix(token: &str, n: usize) -> Option<&str> {
    match token.char_indices().nth(n) {
        Some((idx, _)) => Some(&token[..idx]),
        None if token.chars().count() == n => Some(token),
        None => None,
    }
}
