//! Tokenisation and term sets used by the heuristic metrics.

use std::collections::HashSet;

/// Minimum length of a salient term, in characters.
pub const SALIENT_MIN_CHARS: usize = 5;

/// English stop words ignored by every term comparison.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "may",
    "me", "might", "more", "most", "must", "my", "no", "nor", "not", "of", "off", "on", "once",
    "only", "or", "other", "ought", "our", "ours", "out", "over", "own", "same", "shall", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "upon", "very", "was", "we", "were", "what", "when", "where", "whether", "which", "while",
    "who", "whom", "why", "will", "with", "within", "without", "would", "you", "your", "yours",
];

/// Multi-word phrases that indicate AI/ML functionality.
const AI_PHRASES: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "computer vision",
    "facial recognition",
    "natural language processing",
    "large language model",
];

/// Single tokens that indicate AI/ML functionality.
const AI_TOKENS: &[&str] = &["ai", "ml", "llm", "llms", "gpt", "nlp", "neural"];

/// Lower-cased alphanumeric tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Distinct tokens of `text` that are not stop words.
pub fn content_terms(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().filter(|t| !is_stop_word(t)).collect()
}

/// Distinct content terms of at least [`SALIENT_MIN_CHARS`] characters.
pub fn salient_terms(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= SALIENT_MIN_CHARS && !is_stop_word(t))
        .collect()
}

/// Keyword check for AI/ML mentions, independent of any model output.
pub fn mentions_ai(text: &str) -> bool {
    let tokens = tokenize(text);
    if tokens.iter().any(|t| AI_TOKENS.contains(&t.as_str())) {
        return true;
    }
    let joined = tokens.join(" ");
    AI_PHRASES.iter().any(|phrase| joined.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(tokenize("Real-time, Biometric ID!"), ["real", "time", "biometric", "id"]);
    }

    #[test]
    fn salient_terms_skip_short_and_stop_words() {
        let terms = salient_terms("The system shall identify faces through cameras");
        let mut terms: Vec<_> = terms.into_iter().collect();
        terms.sort();
        assert_eq!(terms, ["cameras", "faces", "identify", "system"]);
    }

    #[test]
    fn detects_ai_mentions() {
        assert!(mentions_ai("Uses facial recognition at the gate"));
        assert!(mentions_ai("An AI-powered assistant"));
        assert!(mentions_ai("trained a neural-network classifier"));
        assert!(!mentions_ai("A shopping cart with a PostgreSQL database"));
        // substrings inside words do not count
        assert!(!mentions_ai("Maintain the email domain"));
    }
}
