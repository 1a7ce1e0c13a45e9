//! Text preprocessing: normalization, tokenization and sentence splitting.
//!
//! Every function here is total: any string (including the empty string) is
//! accepted and empty input produces empty output.

/// Lowercase, drop every character that is neither alphanumeric nor whitespace,
/// collapse runs of whitespace into a single space and trim.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split already-normalized text into tokens.
pub fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// A token together with its char span in the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Tokenize and keep char offsets (start inclusive, end exclusive).
pub fn tokenize_with_offsets(normalized: &str) -> Vec<TokenSpan> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (idx, c) in normalized.chars().enumerate() {
        if c.is_whitespace() {
            if !current.is_empty() {
                spans.push(TokenSpan {
                    text: std::mem::take(&mut current),
                    start,
                    end: idx,
                });
            }
        } else {
            if current.is_empty() {
                start = idx;
            }
            current.push(c);
        }
    }

    if !current.is_empty() {
        let end = start + current.chars().count();
        spans.push(TokenSpan {
            text: current,
            start,
            end,
        });
    }

    spans
}

/// Split raw (non-normalized) text on `.`, `!` and `?`, dropping blank segments.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Result of running the preprocessor over one utterance.
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    pub raw: String,
    pub normalized: String,
    pub tokens: Vec<TokenSpan>,
    pub sentences: Vec<String>,
}

impl Preprocessed {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        let tokens = tokenize_with_offsets(&normalized);
        Self {
            raw: raw.to_string(),
            sentences: split_sentences(raw),
            normalized,
            tokens,
        }
    }

    pub fn token_texts(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.text.clone()).collect()
    }
}
