//! Text tokenization
//!
//! Turns raw document text into the normalized token sequences the
//! embedding trainer consumes. Tokens are lowercased; stopwords, short
//! tokens, pure numbers and URL-like fragments are removed.

use crate::corpus::Document;

/// Fixed stopword list applied during tokenization.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your", "yours",
];

/// Minimum token length kept after normalization; anything shorter is
/// dropped.
const MIN_TOKEN_CHARS: usize = 3;

/// Word tokenizer with the pipeline's filtering rules
#[derive(Debug, Clone)]
pub struct WordTokenizer {
    /// Minimum number of characters a token must have to survive
    pub min_token_chars: usize,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self {
            min_token_chars: MIN_TOKEN_CHARS,
        }
    }

    /// Tokenize one text: lowercase, split on word boundaries, then drop
    /// short tokens, stopwords, pure numbers and URL-like fragments.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut tokens = Vec::new();

        for chunk in lowered.split_whitespace() {
            // URL-like chunks are dropped wholesale before word splitting,
            // otherwise their fragments would leak into the vocabulary.
            if is_url_like(chunk) {
                continue;
            }

            for word in chunk.split(|c: char| !c.is_alphanumeric()) {
                if word.chars().count() < self.min_token_chars {
                    continue;
                }
                if is_stopword(word) || is_pure_numeric(word) {
                    continue;
                }
                tokens.push(word.to_string());
            }
        }

        tokens
    }

    /// Tokenize every document in order
    pub fn tokenize_corpus(&self, documents: &[Document]) -> Vec<Vec<String>> {
        documents.iter().map(|doc| self.tokenize(&doc.text)).collect()
    }
}

impl Default for WordTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

fn is_pure_numeric(word: &str) -> bool {
    word.chars().all(|c| c.is_numeric())
}

fn is_url_like(chunk: &str) -> bool {
    chunk.starts_with("http://")
        || chunk.starts_with("https://")
        || chunk.starts_with("www.")
        || chunk.contains("://")
}
