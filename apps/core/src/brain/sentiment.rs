//! Lexicon-based sentiment scoring.

use serde::{Deserialize, Serialize};

use super::lexicon::{NEGATIVE_WORDS, POSITIVE_WORDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// (positive - negative) / (positive + negative), 0 when neither occurs
    pub score: f32,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }
}

impl Sentiment {
    pub fn label_str(&self) -> &'static str {
        match self.label {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

pub fn score(tokens: &[String]) -> Sentiment {
    let positive = tokens
        .iter()
        .filter(|t| POSITIVE_WORDS.contains(&t.as_str()))
        .count() as f32;
    let negative = tokens
        .iter()
        .filter(|t| NEGATIVE_WORDS.contains(&t.as_str()))
        .count() as f32;

    if positive + negative == 0.0 {
        return Sentiment::default();
    }

    let score = (positive - negative) / (positive + negative);
    let label = if score > 0.0 {
        SentimentLabel::Positive
    } else if score < 0.0 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    Sentiment { label, score }
}
