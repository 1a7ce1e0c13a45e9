//! Request Complexity Scoring.
//!
//! Scores how involved a request is from its size, vocabulary and the number of
//! domain terms it touches. The score is bucketed into a [`Complexity`] level
//! that the response engine uses for "comprehensive" answers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::lexicon::is_domain_term;

/// Coarse complexity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    pub fn from_score(score: f32) -> Self {
        if score < 0.3 {
            Complexity::Simple
        } else if score < 0.6 {
            Complexity::Moderate
        } else {
            Complexity::Complex
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }
}

/// Metrics about request complexity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexityMetrics {
    pub word_count: usize,
    pub avg_word_length: f32,
    pub sentence_count: usize,
    pub unique_words: usize,
    /// unique / total words
    pub lexical_diversity: f32,
    /// Distinct domain terms found
    pub technical_terms: Vec<String>,
    /// Normalized complexity score (0.0 - 1.0)
    pub score: f32,
    pub level: Complexity,
}

impl Default for ComplexityMetrics {
    fn default() -> Self {
        Self {
            word_count: 0,
            avg_word_length: 0.0,
            sentence_count: 0,
            unique_words: 0,
            lexical_diversity: 0.0,
            technical_terms: vec![],
            score: 0.0,
            level: Complexity::Simple,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ComplexityScorer;

impl ComplexityScorer {
    pub fn new() -> Self {
        Self
    }

    fn calculate_score(metrics: &ComplexityMetrics) -> f32 {
        const WORD_COUNT_WEIGHT: f32 = 0.25;
        const AVG_LENGTH_WEIGHT: f32 = 0.20;
        const DIVERSITY_WEIGHT: f32 = 0.20;
        const TECHNICAL_WEIGHT: f32 = 0.35;

        // 40 words = max contribution
        let word_score = (metrics.word_count as f32 / 40.0).min(1.0);
        // 8 chars = max contribution
        let length_score = (metrics.avg_word_length / 8.0).min(1.0);
        let diversity_score = metrics.lexical_diversity;
        // 5 distinct domain terms = max contribution
        let technical_score = (metrics.technical_terms.len() as f32 / 5.0).min(1.0);

        let score = word_score * WORD_COUNT_WEIGHT
            + length_score * AVG_LENGTH_WEIGHT
            + diversity_score * DIVERSITY_WEIGHT
            + technical_score * TECHNICAL_WEIGHT;

        score.clamp(0.0, 1.0)
    }

    /// Analyze normalized tokens; `sentence_count` comes from the raw text.
    pub fn analyze(&self, tokens: &[String], sentence_count: usize) -> ComplexityMetrics {
        if tokens.is_empty() {
            return ComplexityMetrics::default();
        }

        let word_count = tokens.len();
        let total_chars: usize = tokens.iter().map(|w| w.chars().count()).sum();
        let unique: HashSet<&String> = tokens.iter().collect();

        let mut technical_terms: Vec<String> = Vec::new();
        for token in tokens {
            if is_domain_term(token) && !technical_terms.contains(token) {
                technical_terms.push(token.clone());
            }
        }

        let mut metrics = ComplexityMetrics {
            word_count,
            avg_word_length: total_chars as f32 / word_count as f32,
            sentence_count: sentence_count.max(1),
            unique_words: unique.len(),
            lexical_diversity: unique.len() as f32 / word_count as f32,
            technical_terms,
            score: 0.0,
            level: Complexity::Simple,
        };

        metrics.score = Self::calculate_score(&metrics);
        metrics.level = Complexity::from_score(metrics.score);
        metrics
    }
}
