//! Keyword Extraction using TF-IDF.
//!
//! Ranks the tokens of a single utterance by term frequency weighted with an
//! approximated IDF. Stopwords and very short tokens are ignored.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::lexicon::{COMPONENT_KEYWORDS, TECHNOLOGY_KEYWORDS, VISUALIZATION_KEYWORDS};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "yet", "so", "i", "you", "he", "she", "it",
    "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their",
    "this", "that", "these", "those", "who", "whom", "which", "what", "whose", "is", "am", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does", "did",
    "will", "would", "shall", "should", "can", "could", "may", "might", "must", "in", "on", "at",
    "to", "from", "by", "with", "about", "into", "through", "before", "after", "up", "down",
    "out", "off", "over", "under", "again", "here", "there", "where", "when", "why", "how", "all",
    "each", "every", "both", "few", "more", "most", "other", "some", "any", "no", "not", "only",
    "own", "same", "than", "too", "very", "just", "also", "now", "then", "if", "because", "as",
    "please", "want", "need", "like", "make", "let",
];

/// Result of keyword extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    /// The keyword
    pub keyword: String,
    /// TF-IDF score
    pub score: f32,
    /// Raw frequency in the text
    pub frequency: usize,
}

/// Keyword extractor using TF-IDF
pub struct KeywordExtractor {
    stopwords: HashSet<&'static str>,
    min_word_length: usize,
    max_keywords: usize,
    /// IDF approximation for vocabulary we know to be specific
    idf_weights: HashMap<&'static str, f32>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::with_config(3, 10)
    }

    pub fn with_config(min_word_length: usize, max_keywords: usize) -> Self {
        let mut idf_weights = HashMap::new();

        for term in TECHNOLOGY_KEYWORDS {
            idf_weights.insert(*term, 2.5);
        }
        for term in COMPONENT_KEYWORDS.iter().chain(VISUALIZATION_KEYWORDS) {
            idf_weights.insert(*term, 2.0);
        }
        for term in ["create", "build", "update", "delete", "add", "remove", "change"] {
            idf_weights.insert(term, 1.2);
        }

        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
            min_word_length,
            max_keywords,
            idf_weights,
        }
    }

    fn candidates<'a>(&self, tokens: &'a [String]) -> Vec<&'a str> {
        tokens
            .iter()
            .map(String::as_str)
            .filter(|w| {
                w.chars().count() >= self.min_word_length
                    && !self.stopwords.contains(*w)
                    && !w.chars().all(|c| c.is_numeric())
            })
            .collect()
    }

    fn idf(&self, word: &str) -> f32 {
        if let Some(&weight) = self.idf_weights.get(word) {
            return weight;
        }
        // longer words tend to be more specific
        1.0 + (word.chars().count() as f32 / 6.0).min(1.5)
    }

    /// Extract the top N keywords from normalized tokens.
    pub fn extract(&self, tokens: &[String], top_k: Option<usize>) -> Vec<KeywordResult> {
        let max_results = top_k.unwrap_or(self.max_keywords);
        let words = self.candidates(tokens);
        if words.is_empty() {
            return vec![];
        }

        let total = words.len() as f32;
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for word in &words {
            *freq.entry(*word).or_insert(0) += 1;
        }

        let mut scored: Vec<KeywordResult> = freq
            .into_iter()
            .map(|(word, frequency)| KeywordResult {
                keyword: word.to_string(),
                score: (frequency as f32 / total) * self.idf(word),
                frequency,
            })
            .collect();

        // score descending, keyword ascending for a stable order
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });

        scored.into_iter().take(max_results).collect()
    }
}
