//! Intent Classification using regex patterns.
//!
//! Fast pattern-based intent detection over normalized text.
//! No ML model required - pure Rust regex matching.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::lexicon::{is_domain_term, INTENT_PATTERNS};
use super::preprocess::tokenize;

/// Detected intent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Build a user interface (dashboard, form, page, ...)
    UiCreation,
    /// Generate backend code (API, server, database)
    BackendGeneration,
    /// Charts, graphs and other data visualizations
    DataVisualization,
    /// Translation request
    Translation,
    /// Image / vision analysis
    ImageAnalysis,
    /// Reports, summaries and exports
    ReportGeneration,
    /// Change something that was produced earlier
    Modification,
    /// Greeting (hello, hi, ...)
    Greeting,
    /// Help/Assistance
    Help,
    /// Question (what, how, why, ...)
    Question,
    /// Fallback when nothing matches
    General,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Intent {
    /// Every intent, fallback last.
    pub const ALL: [Intent; 11] = [
        Intent::UiCreation,
        Intent::BackendGeneration,
        Intent::DataVisualization,
        Intent::Translation,
        Intent::ImageAnalysis,
        Intent::ReportGeneration,
        Intent::Modification,
        Intent::Greeting,
        Intent::Help,
        Intent::Question,
        Intent::General,
    ];

    /// Returns a machine-friendly label for the intent
    pub fn label(&self) -> &'static str {
        match self {
            Intent::UiCreation => "ui_creation",
            Intent::BackendGeneration => "backend_generation",
            Intent::DataVisualization => "data_visualization",
            Intent::Translation => "translation",
            Intent::ImageAnalysis => "image_analysis",
            Intent::ReportGeneration => "report_generation",
            Intent::Modification => "modification",
            Intent::Greeting => "greeting",
            Intent::Help => "help",
            Intent::Question => "question",
            Intent::General => "general",
        }
    }
}

/// Result of intent classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMatch {
    /// Detected intent
    pub intent: Intent,
    /// Input richness score (0.0 - 1.0), see [`IntentClassifier::confidence`]
    pub confidence: f32,
    /// `"{intent}:{index}"` of the first pattern that matched for the winning intent
    pub matched_pattern_id: Option<String>,
}

/// Pattern definition for intent matching
struct IntentPattern {
    intent: Intent,
    patterns: Vec<Regex>,
}

// Compile patterns once at startup
static COMPILED_PATTERNS: LazyLock<Vec<IntentPattern>> = LazyLock::new(|| {
    INTENT_PATTERNS
        .iter()
        .map(|(intent, sources)| IntentPattern {
            intent: *intent,
            patterns: sources
                .iter()
                .map(|src| Regex::new(src).expect("Invalid regex in intent pattern table"))
                .collect(),
        })
        .collect()
});

/// Intent classifier using regex patterns
pub struct IntentClassifier {
    patterns: &'static [IntentPattern],
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a new intent classifier with all patterns
    pub fn new() -> Self {
        Self {
            patterns: COMPILED_PATTERNS.as_slice(),
        }
    }

    /// Classify normalized text.
    ///
    /// The intent with the most matching patterns wins. Ties go to the intent
    /// declared first in the pattern table; no match at all yields
    /// [`Intent::General`].
    pub fn classify(&self, normalized: &str) -> IntentMatch {
        let mut best_intent = Intent::General;
        let mut best_count = 0usize;
        let mut best_pattern = None;

        for group in self.patterns {
            let mut match_count = 0;
            let mut first_match = None;

            for (idx, pattern) in group.patterns.iter().enumerate() {
                if pattern.is_match(normalized) {
                    match_count += 1;
                    first_match.get_or_insert(idx);
                }
            }

            // strict comparison keeps the earlier intent on ties
            if match_count > best_count {
                best_count = match_count;
                best_intent = group.intent;
                best_pattern = first_match.map(|idx| format!("{}:{}", group.intent, idx));
            }
        }

        IntentMatch {
            intent: best_intent,
            confidence: Self::confidence(normalized),
            matched_pattern_id: best_pattern,
        }
    }

    /// Richness of the input, independent of the chosen intent:
    /// `0.6 * min(tokens / 10, 1) + 0.4 * min(domain_tokens / tokens * 5, 1)`,
    /// rounded to two decimals.
    pub fn confidence(normalized: &str) -> f32 {
        let tokens = tokenize(normalized);
        if tokens.is_empty() {
            return 0.0;
        }

        let token_count = tokens.len() as f32;
        let domain_count = tokens.iter().filter(|t| is_domain_term(t)).count() as f32;

        let length_score = (token_count / 10.0).min(1.0);
        let density_score = ((domain_count / token_count) * 5.0).min(1.0);
        let blended = 0.6 * length_score + 0.4 * density_score;

        (blended * 100.0).round() / 100.0
    }
}
