//! Orchestrator Tests
//!
//! End-to-end turns through the default components, plus turns through
//! injected test doubles for the memory store and the renderer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

use crate::brain::{EntityCategory, Intent, NeighborExpansion};
use crate::config::EngineConfig;
use crate::error::AssistantError;
use crate::memory::{MemoryContext, MemoryStore};
use crate::models::{
    CommunicationStyle, GenerationOutcome, PersonalizationLevel, PreferencesUpdate, ResponseType, UserPreferences,
    Verbosity,
};
use crate::orchestrator::Orchestrator;
use crate::responder::templates::FALLBACK_TEMPLATE;
use crate::responder::{RenderContext, RenderedResponse, ResponseEngine};
use crate::traits::{MemoryProvider, ResponseRenderer};

fn deterministic_config() -> EngineConfig {
    EngineConfig {
        neighbor_expansion: NeighborExpansion::Disabled,
        ..EngineConfig::default()
    }
}

fn orchestrator() -> Orchestrator {
    Orchestrator::in_memory(deterministic_config()).unwrap()
}

async fn say(orchestrator: &Orchestrator, session: &str, text: &str) -> crate::models::SmartResponse {
    orchestrator
        .handle(session, text, &GenerationOutcome::default())
        .await
        .unwrap()
}

#[cfg(test)]
mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn test_dashboard_scenario() {
        let orchestrator = orchestrator();
        let response = say(&orchestrator, "s", "create a dashboard with charts").await;

        assert_eq!(response.intent.intent, Intent::UiCreation);
        assert_eq!(response.intent.confidence, 0.7);
        assert!(response
            .entities
            .iter()
            .any(|e| e.category == EntityCategory::Component && e.value == "dashboard"));
        assert!(response
            .entities
            .iter()
            .any(|e| e.category == EntityCategory::Visualization && e.value == "chart"));
        assert!(response.spoken_message.starts_with("I've created your dashboard"));
        assert_eq!(response.response_type, ResponseType::Success);
        assert!(!response.metadata.intent_matched);
        assert!(!response.metadata.context_used);
        assert_eq!(response.metadata.personalization_level, PersonalizationLevel::Low);
        assert!(response.keywords.iter().any(|k| k.keyword == "dashboard"));
    }

    #[tokio::test]
    async fn test_empty_input_gets_fallback() {
        let orchestrator = orchestrator();
        let response = say(&orchestrator, "s", "").await;

        assert_eq!(response.intent.intent, Intent::General);
        assert_eq!(response.intent.confidence, 0.0);
        assert!(response.entities.is_empty());
        assert!(!response.spoken_message.is_empty());
        assert_eq!(response.spoken_message, FALLBACK_TEMPLATE.spoken);
        assert_eq!(response.response_type, ResponseType::Clarification);
    }

    #[tokio::test]
    async fn test_punctuation_only_input() {
        let response = say(&orchestrator(), "s", "?!...").await;
        assert_eq!(response.intent.intent, Intent::General);
        assert!(response.entities.is_empty());
        assert!(!response.display_message.is_empty());
    }

    #[tokio::test]
    async fn test_error_outcome_wins() {
        let orchestrator = orchestrator();
        let outcome = GenerationOutcome::failed("model timed out");
        let response = orchestrator
            .handle("s", "create a react dashboard with charts and tables", &outcome)
            .await
            .unwrap();
        assert_eq!(response.response_type, ResponseType::Error);
    }

    #[tokio::test]
    async fn test_question_is_a_suggestion_when_confident() {
        let orchestrator = orchestrator();
        let response = say(
            &orchestrator,
            "s",
            "what is the difference between a react component and a vue component",
        )
        .await;
        assert_eq!(response.intent.intent, Intent::Question);
        assert!(response.intent.confidence >= 0.5);
        assert_eq!(response.response_type, ResponseType::Suggestion);
    }
}

#[cfg(test)]
mod memory_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_personalization_and_context_grow_with_turns() {
        let orchestrator = orchestrator();
        let mut levels = Vec::new();
        let mut context_used = Vec::new();
        for n in 0..6 {
            let response = say(&orchestrator, "s", &format!("build form number {}", n)).await;
            levels.push(response.metadata.personalization_level);
            context_used.push(response.metadata.context_used);
        }

        assert_eq!(
            levels,
            vec![
                PersonalizationLevel::Low,
                PersonalizationLevel::Low,
                PersonalizationLevel::Medium,
                PersonalizationLevel::Medium,
                PersonalizationLevel::Medium,
                PersonalizationLevel::High,
            ]
        );
        assert_eq!(context_used, vec![false, true, true, true, true, true]);
    }

    #[tokio::test]
    async fn test_recurring_concepts_reach_long_term() {
        let orchestrator = orchestrator();
        say(&orchestrator, "s", "build a login form").await;
        say(&orchestrator, "s", "make the form wider").await;
        let response = say(&orchestrator, "s", "thanks").await;

        assert_eq!(response.memory.long_term, vec!["form"]);
        assert_eq!(response.memory.short_term, vec!["build a login form", "make the form wider"]);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let orchestrator = orchestrator();
        say(&orchestrator, "alice", "build a login form").await;
        let bob = say(&orchestrator, "bob", "hello").await;
        assert!(bob.memory.short_term.is_empty());
        assert_eq!(bob.metadata.personalization_level, PersonalizationLevel::Low);
    }

    #[tokio::test]
    async fn test_reset_forgets_memory_and_preferences() {
        let orchestrator = orchestrator();
        orchestrator
            .update_preferences(
                "s",
                PreferencesUpdate {
                    verbosity: Some(Verbosity::Concise),
                    ..PreferencesUpdate::default()
                },
            )
            .unwrap();
        say(&orchestrator, "s", "build a login form").await;

        orchestrator.reset("s").unwrap();

        assert_eq!(orchestrator.preferences("s"), UserPreferences::default());
        assert_eq!(orchestrator.memory("s").await.unwrap().history_len, 0);
    }

    #[tokio::test]
    async fn test_similar_turns() {
        let orchestrator = orchestrator();
        say(&orchestrator, "s", "translate the page into spanish").await;
        say(&orchestrator, "s", "build a login form").await;

        let hits = orchestrator.similar("s", "build a login form", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "build a login form");
    }

    #[tokio::test]
    async fn test_memory_persists_across_instances() {
        let dir = tempdir().unwrap();
        let config = EngineConfig {
            database_path: Some(dir.path().join("assistant.db")),
            ..deterministic_config()
        };

        let first = Orchestrator::from_config(config.clone()).await.unwrap();
        say(&first, "s", "build a login form").await;
        first.flush().await;

        let second = Orchestrator::from_config(config).await.unwrap();
        let memory = second.memory("s").await.unwrap();
        assert_eq!(memory.short_term, vec!["build a login form"]);
        assert_eq!(memory.history_len, 1);
    }
}

#[cfg(test)]
mod preference_tests {
    use super::*;

    #[tokio::test]
    async fn test_preferences_shape_the_reply() {
        let orchestrator = orchestrator();
        orchestrator
            .update_preferences(
                "s",
                PreferencesUpdate {
                    verbosity: Some(Verbosity::Concise),
                    communication_style: Some(CommunicationStyle::Formal),
                    ..PreferencesUpdate::default()
                },
            )
            .unwrap();

        let response = say(&orchestrator, "s", "create a dashboard with charts").await;
        assert_eq!(response.spoken_message, "I have created your dashboard with a responsive layout.");

        let other = say(&orchestrator, "other", "create a dashboard with charts").await;
        assert!(other.spoken_message.starts_with("I've created"));
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let orchestrator = orchestrator();
        orchestrator
            .update_preferences(
                "s",
                PreferencesUpdate {
                    verbosity: Some(Verbosity::Comprehensive),
                    ..PreferencesUpdate::default()
                },
            )
            .unwrap();
        let prefs = orchestrator
            .update_preferences(
                "s",
                PreferencesUpdate {
                    preferred_technologies: Some(vec!["Rust".to_string()]),
                    ..PreferencesUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(prefs.verbosity, Verbosity::Comprehensive);
        assert_eq!(prefs.preferred_technologies, vec!["rust"]);
    }

    #[test]
    fn test_too_many_technologies_rejected() {
        let orchestrator = orchestrator();
        let techs: Vec<String> = (0..21).map(|n| format!("tech{}", n)).collect();
        let result = orchestrator.update_preferences(
            "s",
            PreferencesUpdate {
                preferred_technologies: Some(techs),
                ..PreferencesUpdate::default()
            },
        );
        assert!(matches!(result, Err(AssistantError::InvalidInput(_))));
        assert_eq!(orchestrator.preferences("s"), UserPreferences::default());
    }
}

/// Memory double returning a fixed context and recording what it was given.
#[derive(Default)]
struct ScriptedMemory {
    history_len: usize,
    calls: Mutex<Vec<String>>,
    recorded: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait::async_trait]
impl MemoryProvider for ScriptedMemory {
    async fn hydrate(&self, _session_key: &str) {
        self.calls.lock().unwrap().push("hydrate".to_string());
    }

    fn context(&self, _session_key: &str) -> MemoryContext {
        self.calls.lock().unwrap().push("context".to_string());
        MemoryContext {
            short_term: vec!["earlier".to_string()],
            history_len: self.history_len,
            ..MemoryContext::default()
        }
    }

    fn record(&self, _session_key: &str, text: &str, concepts: &[String]) {
        self.calls.lock().unwrap().push("record".to_string());
        self.recorded.lock().unwrap().push((text.to_string(), concepts.to_vec()));
    }

    fn clear(&self, _session_key: &str) {
        self.calls.lock().unwrap().push("clear".to_string());
    }

    fn similar(&self, _session_key: &str, _text: &str, _concepts: &[String], _k: usize) -> Vec<(String, f32)> {
        vec![]
    }
}

/// Renderer double echoing the parameters it was handed.
struct EchoRenderer;

impl ResponseRenderer for EchoRenderer {
    fn render(
        &self,
        intent: Intent,
        _matched_text: &str,
        params: &HashMap<String, String>,
        _prefs: &UserPreferences,
        ctx: &RenderContext,
    ) -> RenderedResponse {
        RenderedResponse {
            spoken: format!("{} {}", intent, params.get("component").cloned().unwrap_or_default()),
            display: ctx.technologies.join(","),
            suggestions: vec![],
            follow_ups: vec![],
        }
    }
}

#[cfg(test)]
mod injection_tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_double_drives_metadata_and_order() {
        let memory = Arc::new(ScriptedMemory {
            history_len: 7,
            ..ScriptedMemory::default()
        });
        let renderer = Arc::new(ResponseEngine::builtin().unwrap());
        let orchestrator = Orchestrator::new(deterministic_config(), memory.clone(), renderer);

        let response = say(&orchestrator, "s", "create a dashboard with charts").await;

        assert_eq!(response.metadata.personalization_level, PersonalizationLevel::High);
        assert!(response.metadata.context_used);
        assert_eq!(*memory.calls.lock().unwrap(), vec!["hydrate", "context", "record"]);

        let recorded = memory.recorded.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, "create a dashboard with charts");
        assert_eq!(recorded[0].1, vec!["dashboard", "chart"]);
    }

    #[tokio::test]
    async fn test_renderer_double_receives_parameters() {
        let memory = Arc::new(MemoryStore::new(&deterministic_config(), None));
        let orchestrator = Orchestrator::new(deterministic_config(), memory, Arc::new(EchoRenderer));

        let response = say(&orchestrator, "s", "build a react login form").await;
        assert_eq!(response.spoken_message, "ui_creation form");
        assert_eq!(response.display_message, "react");
    }

    #[tokio::test]
    async fn test_invalid_calls_do_not_touch_memory() {
        let memory = Arc::new(ScriptedMemory::default());
        let orchestrator = Orchestrator::new(
            deterministic_config(),
            memory.clone(),
            Arc::new(ResponseEngine::builtin().unwrap()),
        );

        let result = orchestrator.handle("", "hello", &GenerationOutcome::default()).await;
        assert!(matches!(result, Err(AssistantError::InvalidInput(_))));
        assert!(orchestrator.reset(" ").is_err());
        assert!(memory.calls.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod degraded_tests {
    use super::*;

    #[tokio::test]
    async fn test_unopenable_database_keeps_memory_in_process() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let config = EngineConfig {
            database_path: Some(blocker.join("assistant.db")),
            ..deterministic_config()
        };

        let orchestrator = Orchestrator::from_config(config).await.unwrap();
        say(&orchestrator, "s", "build a login form").await;
        let response = say(&orchestrator, "s", "make the form wider").await;
        orchestrator.flush().await;

        assert_eq!(response.memory.short_term, vec!["build a login form"]);
        assert!(response.metadata.context_used);
    }

    #[tokio::test]
    async fn test_looking_up_unknown_sessions_keeps_live_ones() {
        let config = EngineConfig {
            max_sessions: 2,
            ..deterministic_config()
        };
        let orchestrator = Orchestrator::in_memory(config).unwrap();
        say(&orchestrator, "alice", "build a login form").await;
        say(&orchestrator, "bob", "hello").await;

        assert_eq!(orchestrator.memory("carol").await.unwrap().history_len, 0);
        assert!(orchestrator.similar("dave", "build a login form", 3).await.unwrap().is_empty());

        assert_eq!(orchestrator.memory("alice").await.unwrap().history_len, 1);
        assert_eq!(orchestrator.memory("bob").await.unwrap().history_len, 1);
    }

    #[tokio::test]
    async fn test_recall_matches_recorded_turn_under_expansion() {
        let config = EngineConfig {
            neighbor_expansion: NeighborExpansion::Probabilistic { probability: 1.0 },
            rng_seed: Some(11),
            ..EngineConfig::default()
        };
        let orchestrator = Orchestrator::in_memory(config).unwrap();
        let response = say(&orchestrator, "s", "build a login form").await;
        assert!(response.entities.iter().any(|e| e.score < 1.0));

        let hits = orchestrator.similar("s", "build a login form", 1).await.unwrap();
        assert_eq!(hits[0].0, "build a login form");
        assert!(hits[0].1 > 0.9999, "score was {}", hits[0].1);
    }

    #[test]
    fn test_in_memory_rejects_invalid_config() {
        let config = EngineConfig {
            max_short_term: 0,
            ..EngineConfig::default()
        };
        let result = Orchestrator::in_memory(config);
        assert!(matches!(result, Err(AssistantError::Validation(_))));
    }
}
