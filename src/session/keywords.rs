//! Keyword extraction for transcript segments.
//!
//! A lightweight frequency-based extractor: tokenize, drop stopwords,
//! rank by occurrence count.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Common English stopwords excluded from keyword ranking.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "must",
    "shall", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
    "during", "before", "after", "above", "below", "between", "under", "again", "further",
    "then", "once", "here", "there", "when", "where", "why", "how", "all", "each", "few",
    "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
    "than", "too", "very", "just", "and", "but", "if", "or", "because", "until", "while",
    "this", "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "what",
    "which", "who", "whom", "its", "his", "her", "their", "our", "my", "your", "up", "out",
    "about", "over",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-zA-Z]{3,}").expect("static pattern"))
}

/// Extract up to `max_keywords` keywords from a text segment.
///
/// Words of at least three letters are counted case-insensitively; ranking
/// is by frequency with an alphabetical tie-break so the output is
/// deterministic.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();

    for word in word_pattern().find_iter(&text.to_lowercase()) {
        let word = word.as_str();
        if STOPWORDS.contains(&word) {
            continue;
        }
        *frequencies.entry(word.to_string()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = frequencies.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(word, _)| word)
        .collect()
}
