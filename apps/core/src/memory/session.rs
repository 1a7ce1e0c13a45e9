//! Per-session conversation memory.
//!
//! A bounded FIFO of recent utterances plus a frequency map of recurring
//! concepts. All time-dependent operations take `now` explicitly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::brain::embedding::{cosine_similarity, embed};
use crate::brain::lexicon::{EXPANSION_MARKERS, PROBLEM_MARKERS, REFINEMENT_MARKERS};
use crate::config::EngineConfig;

/// How many of the newest short-term entries feed pattern detection.
const PATTERN_LOOKBACK: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTermEntry {
    pub count: u32,
    pub last_seen: DateTime<Utc>,
}

/// Heuristic shape of the recent conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPattern {
    IterativeRefinement,
    FeatureExpansion,
    ProblemSolving,
}

impl ConversationPattern {
    pub fn label(&self) -> &'static str {
        match self {
            ConversationPattern::IterativeRefinement => "iterative_refinement",
            ConversationPattern::FeatureExpansion => "feature_expansion",
            ConversationPattern::ProblemSolving => "problem_solving",
        }
    }
}

/// What the rest of the pipeline sees of a session's memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContext {
    /// Recent utterances within the recency window, truncated, oldest first
    pub short_term: Vec<String>,
    /// Recurring concepts, most frequent first
    pub long_term: Vec<String>,
    pub patterns: Vec<ConversationPattern>,
    /// Total short-term entries held for the session
    pub history_len: usize,
}

/// Limits applied by [`ConversationMemory`].
#[derive(Debug, Clone)]
pub struct MemoryLimits {
    pub max_short_term: usize,
    pub decay_window: Duration,
    pub recency_window: Duration,
    pub snippet_chars: usize,
    pub long_term_min_frequency: u32,
    pub long_term_top_k: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for MemoryLimits {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_short_term: config.max_short_term,
            decay_window: config.decay_window(),
            recency_window: config.recency_window(),
            snippet_chars: config.snippet_chars,
            long_term_min_frequency: config.long_term_min_frequency,
            long_term_top_k: config.long_term_top_k,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationMemory {
    pub short_term: VecDeque<ShortTermEntry>,
    pub long_term: HashMap<String, LongTermEntry>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, evict overflow, bump concept counts and purge decayed concepts.
    pub fn record(&mut self, text: &str, concepts: &[String], now: DateTime<Utc>, limits: &MemoryLimits) {
        self.short_term.push_back(ShortTermEntry {
            text: text.to_string(),
            timestamp: now,
            vector: embed(text, concepts),
        });
        self.trim_short_term(limits);

        let mut counted = HashSet::new();
        for concept in concepts {
            if !counted.insert(concept.as_str()) {
                continue;
            }
            let entry = self
                .long_term
                .entry(concept.clone())
                .or_insert(LongTermEntry { count: 0, last_seen: now });
            entry.count += 1;
            entry.last_seen = now;
        }

        self.purge(now, limits);
    }

    fn trim_short_term(&mut self, limits: &MemoryLimits) {
        while self.short_term.len() > limits.max_short_term {
            self.short_term.pop_front();
        }
    }

    /// Bring state built under other limits (e.g. restored from storage)
    /// back within `limits`: oldest short-term entries go first, decayed
    /// concepts are purged.
    pub fn enforce_limits(&mut self, now: DateTime<Utc>, limits: &MemoryLimits) {
        self.trim_short_term(limits);
        self.purge(now, limits);
    }

    /// Drop long-term entries outside the decay window. Entries stamped in the
    /// future are clamped to `now`.
    pub fn purge(&mut self, now: DateTime<Utc>, limits: &MemoryLimits) {
        self.long_term.retain(|_, entry| now - entry.last_seen <= limits.decay_window);
        for entry in self.long_term.values_mut() {
            if entry.last_seen > now {
                entry.last_seen = now;
            }
        }
    }

    pub fn query(&self, now: DateTime<Utc>, limits: &MemoryLimits) -> MemoryContext {
        let short_term: Vec<String> = self
            .short_term
            .iter()
            .filter(|e| now - e.timestamp <= limits.recency_window)
            .map(|e| e.text.chars().take(limits.snippet_chars).collect::<String>())
            .collect();

        let mut ranked: Vec<(&String, &LongTermEntry)> = self
            .long_term
            .iter()
            .filter(|(_, e)| e.count >= limits.long_term_min_frequency)
            .filter(|(_, e)| now - e.last_seen <= limits.decay_window)
            .collect();
        // count desc, then most recent, then name for a total order
        ranked.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then_with(|| b.1.last_seen.cmp(&a.1.last_seen))
                .then_with(|| a.0.cmp(b.0))
        });
        let long_term: Vec<String> = ranked
            .into_iter()
            .take(limits.long_term_top_k)
            .map(|(concept, _)| concept.clone())
            .collect();

        MemoryContext {
            short_term,
            long_term,
            patterns: self.detect_patterns(),
            history_len: self.short_term.len(),
        }
    }

    /// Substring checks over the newest few entries.
    pub fn detect_patterns(&self) -> Vec<ConversationPattern> {
        let recent: Vec<String> = self
            .short_term
            .iter()
            .rev()
            .take(PATTERN_LOOKBACK)
            .map(|e| e.text.to_lowercase())
            .collect();

        let any_marker = |markers: &[&str]| recent.iter().any(|t| markers.iter().any(|m| t.contains(m)));

        let mut patterns = Vec::new();
        if any_marker(REFINEMENT_MARKERS) {
            patterns.push(ConversationPattern::IterativeRefinement);
        }
        if any_marker(EXPANSION_MARKERS) {
            patterns.push(ConversationPattern::FeatureExpansion);
        }
        if any_marker(PROBLEM_MARKERS) {
            patterns.push(ConversationPattern::ProblemSolving);
        }
        patterns
    }

    /// Short-term texts most similar to `text`, best first. Only positive scores.
    pub fn similar(&self, text: &str, concepts: &[String], k: usize) -> Vec<(String, f32)> {
        let probe = embed(text, concepts);
        let mut scored: Vec<(String, f32)> = self
            .short_term
            .iter()
            .map(|e| (e.text.clone(), cosine_similarity(&probe, &e.vector)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    pub fn is_empty(&self) -> bool {
        self.short_term.is_empty() && self.long_term.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_short_term: usize) -> MemoryLimits {
        MemoryLimits {
            max_short_term,
            long_term_min_frequency: 1,
            ..MemoryLimits::default()
        }
    }

    fn concepts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fifo_eviction() {
        let limits = limits(3);
        let mut memory = ConversationMemory::new();
        let now = Utc::now();
        for i in 0..5 {
            memory.record(&format!("turn {}", i), &[], now, &limits);
        }
        let texts: Vec<&str> = memory.short_term.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["turn 2", "turn 3", "turn 4"]);
    }

    #[test]
    fn test_concepts_counted_once_per_record() {
        let limits = limits(10);
        let mut memory = ConversationMemory::new();
        let now = Utc::now();
        memory.record("chart chart", &concepts(&["chart", "chart"]), now, &limits);
        assert_eq!(memory.long_term["chart"].count, 1);
    }

    #[test]
    fn test_decay_purges_on_record_and_hides_on_query() {
        let limits = limits(10);
        let mut memory = ConversationMemory::new();
        let start = Utc::now();
        memory.record("old", &concepts(&["chart"]), start, &limits);

        let later = start + Duration::hours(73);
        assert!(memory.query(later, &limits).long_term.is_empty());

        memory.record("new", &concepts(&["form"]), later, &limits);
        assert!(!memory.long_term.contains_key("chart"));
        assert!(memory.long_term.contains_key("form"));
    }

    #[test]
    fn test_query_ranking_and_threshold() {
        let limits = MemoryLimits {
            long_term_min_frequency: 2,
            ..MemoryLimits::default()
        };
        let mut memory = ConversationMemory::new();
        let t0 = Utc::now();
        memory.record("a", &concepts(&["chart", "form"]), t0, &limits);
        memory.record("b", &concepts(&["chart", "form"]), t0 + Duration::seconds(1), &limits);
        memory.record("c", &concepts(&["chart", "table"]), t0 + Duration::seconds(2), &limits);

        let context = memory.query(t0 + Duration::seconds(3), &limits);
        assert_eq!(context.long_term, vec!["chart", "form"]);
    }

    #[test]
    fn test_recency_window_and_truncation() {
        let limits = MemoryLimits {
            snippet_chars: 4,
            ..MemoryLimits::default()
        };
        let mut memory = ConversationMemory::new();
        let t0 = Utc::now();
        memory.record("stale entry", &[], t0, &limits);
        memory.record("fresh entry", &[], t0 + Duration::minutes(45), &limits);

        let context = memory.query(t0 + Duration::minutes(50), &limits);
        assert_eq!(context.short_term, vec!["fres"]);
        assert_eq!(context.history_len, 2);
    }

    #[test]
    fn test_pattern_detection_uses_last_three() {
        let limits = limits(10);
        let mut memory = ConversationMemory::new();
        let now = Utc::now();
        memory.record("please fix the error", &[], now, &limits);
        for text in ["one", "two", "three"] {
            memory.record(text, &[], now, &limits);
        }
        assert!(memory.detect_patterns().is_empty());

        memory.record("Change the colors and add a footer", &[], now, &limits);
        assert_eq!(
            memory.detect_patterns(),
            vec![ConversationPattern::IterativeRefinement, ConversationPattern::FeatureExpansion]
        );
    }

    #[test]
    fn test_enforce_limits_trims_and_purges() {
        let wide = limits(10);
        let mut memory = ConversationMemory::new();
        let t0 = Utc::now();
        memory.record("old concept", &concepts(&["chart"]), t0, &wide);
        for i in 0..5 {
            memory.record(&format!("turn {}", i), &[], t0 + Duration::hours(1), &wide);
        }
        assert!(memory.long_term.contains_key("chart"));

        memory.enforce_limits(t0 + Duration::hours(80), &limits(3));
        let texts: Vec<&str> = memory.short_term.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["turn 2", "turn 3", "turn 4"]);
        assert!(memory.long_term.is_empty());
    }

    #[test]
    fn test_similar() {
        let limits = limits(10);
        let mut memory = ConversationMemory::new();
        let now = Utc::now();
        memory.record("build a login form", &concepts(&["login", "form"]), now, &limits);
        memory.record("translate to spanish", &concepts(&["spanish"]), now, &limits);

        let hits = memory.similar("build a login form", &concepts(&["login", "form"]), 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "build a login form");
    }
}
