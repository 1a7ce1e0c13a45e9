use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::brain::{ComplexityMetrics, Entity, Intent, IntentMatch, KeywordResult, Sentiment};
use crate::memory::MemoryContext;

/// How much detail a reply should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Concise,
    #[default]
    Detailed,
    Comprehensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnicalLevel {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    Formal,
    Casual,
    #[default]
    Friendly,
}

/// Per-session reply preferences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub verbosity: Verbosity,
    pub technical_level: TechnicalLevel,
    /// Technologies to favor in suggestions.
    #[validate(length(max = 20))]
    pub preferred_technologies: Vec<String>,
    pub communication_style: CommunicationStyle,
}

/// A partial preference update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub verbosity: Option<Verbosity>,
    pub technical_level: Option<TechnicalLevel>,
    #[validate(length(max = 20))]
    pub preferred_technologies: Option<Vec<String>>,
    pub communication_style: Option<CommunicationStyle>,
}

impl UserPreferences {
    pub fn apply(&mut self, update: PreferencesUpdate) {
        if let Some(v) = update.verbosity {
            self.verbosity = v;
        }
        if let Some(v) = update.technical_level {
            self.technical_level = v;
        }
        if let Some(v) = update.preferred_technologies {
            self.preferred_technologies = v.into_iter().map(|t| t.trim().to_lowercase()).collect();
        }
        if let Some(v) = update.communication_style {
            self.communication_style = v;
        }
    }
}

/// Result of the external generation step this turn responds about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    /// Set when generation failed.
    pub error: Option<String>,
    /// Number of backend files produced.
    pub generated_files: usize,
    /// Extra template parameters supplied by the caller.
    pub parameters: HashMap<String, String>,
}

impl GenerationOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Success,
    Error,
    Clarification,
    Suggestion,
}

impl ResponseType {
    /// Strict priority: error, low confidence, question, success.
    pub fn classify(has_error: bool, confidence: f32, intent: Intent) -> Self {
        if has_error {
            ResponseType::Error
        } else if confidence < 0.5 {
            ResponseType::Clarification
        } else if intent == Intent::Question {
            ResponseType::Suggestion
        } else {
            ResponseType::Success
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalizationLevel {
    Low,
    Medium,
    High,
}

impl PersonalizationLevel {
    pub fn from_history_len(len: usize) -> Self {
        if len < 2 {
            PersonalizationLevel::Low
        } else if len < 5 {
            PersonalizationLevel::Medium
        } else {
            PersonalizationLevel::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub processing_time_ms: u64,
    /// confidence > 0.7
    pub intent_matched: bool,
    /// Recent short-term context was available
    pub context_used: bool,
    pub personalization_level: PersonalizationLevel,
}

/// Everything produced for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartResponse {
    pub session_key: String,
    pub spoken_message: String,
    pub display_message: String,
    pub response_type: ResponseType,
    pub intent: IntentMatch,
    pub entities: Vec<Entity>,
    pub keywords: Vec<KeywordResult>,
    pub complexity: ComplexityMetrics,
    pub sentiment: Sentiment,
    pub suggestions: Vec<String>,
    pub follow_ups: Vec<String>,
    pub memory: MemoryContext,
    pub metadata: ResponseMetadata,
}
