//! Orchestrator.
//!
//! Runs one conversational turn end to end: preprocess, classify, extract,
//! fetch memory, render, record. Every component is injected so tests can
//! substitute the memory store or the renderer independently.

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::brain::lexicon::TRANSLATION_KEYWORDS;
use crate::brain::{
    sentiment, ComplexityScorer, Entity, EntityCategory, EntityExtractor, IntentClassifier,
    KeywordExtractor, KeywordResult, Preprocessed,
};
use crate::config::EngineConfig;
use crate::error::{AssistantError, Result};
use crate::memory::store::lock;
use crate::memory::{MemoryContext, MemoryStore};
use crate::models::{
    GenerationOutcome, PersonalizationLevel, PreferencesUpdate, ResponseMetadata, ResponseType,
    SmartResponse, UserPreferences,
};
use crate::persistence::{InMemoryBackend, MemoryBackend, PersistenceHandle, SqliteBackend};
use crate::responder::{RenderContext, ResponseEngine};
use crate::traits::{MemoryProvider, ResponseRenderer};

/// Confidence above which the intent counts as matched in the metadata.
const INTENT_MATCHED_THRESHOLD: f32 = 0.7;
const MAX_KEYWORDS: usize = 10;

/// Translation vocabulary that names the task rather than a language.
const TRANSLATION_TASK_TERMS: &[&str] = &["translate", "translation", "language", "locale"];

pub struct Orchestrator {
    config: EngineConfig,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    keywords: KeywordExtractor,
    scorer: ComplexityScorer,
    memory: Arc<dyn MemoryProvider>,
    renderer: Arc<dyn ResponseRenderer>,
    preferences: Mutex<LruCache<String, UserPreferences>>,
    persistence: Option<PersistenceHandle>,
}

impl Orchestrator {
    /// Assemble from injected components. The config is used as given;
    /// `in_memory` and `from_config` validate it first.
    pub fn new(
        config: EngineConfig,
        memory: Arc<dyn MemoryProvider>,
        renderer: Arc<dyn ResponseRenderer>,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            extractor: EntityExtractor::new(config.neighbor_expansion, config.rng_seed),
            classifier: IntentClassifier::new(),
            keywords: KeywordExtractor::new(),
            scorer: ComplexityScorer::new(),
            memory,
            renderer,
            preferences: Mutex::new(LruCache::new(capacity)),
            persistence: None,
            config,
        }
    }

    /// Built-in components with memory kept in process only.
    pub fn in_memory(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let memory = Arc::new(MemoryStore::new(&config, None));
        let renderer = Arc::new(ResponseEngine::builtin()?);
        Ok(Self::new(config, memory, renderer))
    }

    /// Built-in components with persisted memory: SQLite when a database path
    /// is configured and can be opened, a process-local backend otherwise.
    /// Must run inside a tokio runtime.
    pub async fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let backend: Arc<dyn MemoryBackend> = match &config.database_path {
            Some(path) => match SqliteBackend::connect(path).await {
                Ok(sqlite) => Arc::new(sqlite),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        "Memory database unavailable, keeping memory in process only: {}", e
                    );
                    Arc::new(InMemoryBackend::new())
                }
            },
            None => {
                info!("No database configured, memory will not outlive the process");
                Arc::new(InMemoryBackend::new())
            }
        };
        let persistence = PersistenceHandle::spawn(backend);

        let memory = Arc::new(MemoryStore::new(&config, Some(persistence.clone())));
        let renderer = Arc::new(ResponseEngine::builtin()?);
        let mut orchestrator = Self::new(config, memory, renderer);
        orchestrator.persistence = Some(persistence);
        Ok(orchestrator)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn check_session_key(session_key: &str) -> Result<()> {
        if session_key.trim().is_empty() {
            return Err(AssistantError::InvalidInput("session key must not be blank".to_string()));
        }
        Ok(())
    }

    fn check_input(&self, raw_text: &str) -> Result<()> {
        let len = raw_text.chars().count();
        if len > self.config.max_input_chars {
            return Err(AssistantError::InvalidInput(format!(
                "input is {} chars, the maximum is {}",
                len, self.config.max_input_chars
            )));
        }
        Ok(())
    }

    /// Handle one turn.
    ///
    /// Only malformed calls fail (blank session key, oversized input). Any text,
    /// including an empty string, yields a response.
    #[instrument(skip(self, raw_text, outcome), fields(chars = raw_text.len()))]
    pub async fn handle(
        &self,
        session_key: &str,
        raw_text: &str,
        outcome: &GenerationOutcome,
    ) -> Result<SmartResponse> {
        let started = Instant::now();
        Self::check_session_key(session_key)?;
        self.check_input(raw_text)?;

        let input = Preprocessed::new(raw_text);
        let tokens = input.token_texts();

        let intent = self.classifier.classify(&input.normalized);
        let entities = self.extractor.extract(&input.tokens);
        let keywords = self.keywords.extract(&tokens, Some(MAX_KEYWORDS));
        let complexity = self.scorer.analyze(&tokens, input.sentences.len());
        let sentiment = sentiment::score(&tokens);
        debug!(
            intent = %intent.intent,
            confidence = intent.confidence,
            entities = entities.len(),
            "Input analyzed"
        );

        self.memory.hydrate(session_key).await;
        let memory = self.memory.context(session_key);
        let prefs = self.preferences(session_key);

        let mut params = build_params(&entities, &keywords, &memory, outcome);
        params.insert("intent".to_string(), intent.intent.label().to_string());
        params.insert("sentiment".to_string(), sentiment.label_str().to_string());
        params.extend(outcome.parameters.clone());

        let ctx = RenderContext {
            technologies: values_in(&entities, EntityCategory::Technology),
            complexity: complexity.level,
            generated_files: outcome.generated_files,
        };
        let rendered = self.renderer.render(intent.intent, raw_text, &params, &prefs, &ctx);

        let concepts = self.extractor.concepts(&input.tokens);
        self.memory.record(session_key, raw_text, &concepts);

        let response_type = ResponseType::classify(outcome.error.is_some(), intent.confidence, intent.intent);
        let metadata = ResponseMetadata {
            processing_time_ms: started.elapsed().as_millis() as u64,
            intent_matched: intent.confidence > INTENT_MATCHED_THRESHOLD,
            context_used: !memory.short_term.is_empty(),
            personalization_level: PersonalizationLevel::from_history_len(memory.history_len),
        };

        info!(
            session = %session_key,
            intent = %intent.intent,
            response_type = ?response_type,
            elapsed_ms = metadata.processing_time_ms,
            "Turn handled"
        );

        Ok(SmartResponse {
            session_key: session_key.to_string(),
            spoken_message: rendered.spoken,
            display_message: rendered.display,
            response_type,
            intent,
            entities,
            keywords,
            complexity,
            sentiment,
            suggestions: rendered.suggestions,
            follow_ups: rendered.follow_ups,
            memory,
            metadata,
        })
    }

    /// The session's preferences, or the defaults if none were set.
    pub fn preferences(&self, session_key: &str) -> UserPreferences {
        lock(&self.preferences)
            .get(session_key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn update_preferences(&self, session_key: &str, update: PreferencesUpdate) -> Result<UserPreferences> {
        Self::check_session_key(session_key)?;
        update
            .validate()
            .map_err(|e| AssistantError::InvalidInput(format!("Invalid preferences: {}", e)))?;

        let mut preferences = lock(&self.preferences);
        let mut updated = preferences.get(session_key).cloned().unwrap_or_default();
        updated.apply(update);
        updated.validate()?;
        preferences.put(session_key.to_string(), updated.clone());

        info!(session = %session_key, "Preferences updated");
        Ok(updated)
    }

    /// Forget everything about the session: memory, persisted state and preferences.
    pub fn reset(&self, session_key: &str) -> Result<()> {
        Self::check_session_key(session_key)?;
        self.memory.clear(session_key);
        lock(&self.preferences).pop(session_key);
        info!(session = %session_key, "Session reset");
        Ok(())
    }

    /// Earlier turns of the session most similar to `text`.
    pub async fn similar(&self, session_key: &str, text: &str, k: usize) -> Result<Vec<(String, f32)>> {
        Self::check_session_key(session_key)?;
        self.check_input(text)?;

        let input = Preprocessed::new(text);
        let concepts = self.extractor.concepts(&input.tokens);

        self.memory.hydrate(session_key).await;
        Ok(self.memory.similar(session_key, text, &concepts, k))
    }

    /// The session's current memory context.
    pub async fn memory(&self, session_key: &str) -> Result<MemoryContext> {
        Self::check_session_key(session_key)?;
        self.memory.hydrate(session_key).await;
        Ok(self.memory.context(session_key))
    }

    /// Wait until queued memory writes reach the backend.
    pub async fn flush(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.flush().await;
        }
    }
}

fn values_in(entities: &[Entity], category: EntityCategory) -> Vec<String> {
    entities
        .iter()
        .filter(|e| e.category == category)
        .map(|e| e.value.clone())
        .collect()
}

fn first_in(entities: &[Entity], category: EntityCategory) -> Option<String> {
    entities.iter().find(|e| e.category == category).map(|e| e.value.clone())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Template parameters derived from the turn. Callers' own parameters are
/// layered on top by the orchestrator.
fn build_params(
    entities: &[Entity],
    keywords: &[KeywordResult],
    memory: &MemoryContext,
    outcome: &GenerationOutcome,
) -> HashMap<String, String> {
    let mut params = HashMap::new();

    params.insert(
        "component".to_string(),
        first_in(entities, EntityCategory::Component).unwrap_or_else(|| "interface".to_string()),
    );
    params.insert(
        "visualization".to_string(),
        first_in(entities, EntityCategory::Visualization).unwrap_or_else(|| "chart".to_string()),
    );
    params.insert(
        "report".to_string(),
        match first_in(entities, EntityCategory::Report).as_deref() {
            None | Some("report") | Some("export") => "report".to_string(),
            Some(kind) => format!("{} report", kind),
        },
    );
    if let Some(tech) = first_in(entities, EntityCategory::Technology) {
        params.insert("technology".to_string(), tech);
    }

    let language = keywords
        .iter()
        .map(|k| k.keyword.as_str())
        .chain(entities.iter().map(|e| e.value.as_str()))
        .find(|w| TRANSLATION_KEYWORDS.contains(w) && !TRANSLATION_TASK_TERMS.contains(w));
    params.insert(
        "language".to_string(),
        language.map(capitalize).unwrap_or_else(|| "the target language".to_string()),
    );

    params.insert(
        "topic".to_string(),
        keywords
            .first()
            .map(|k| k.keyword.clone())
            .unwrap_or_else(|| "that".to_string()),
    );
    if let Some(recent) = memory.long_term.first() {
        params.insert("recent_topic".to_string(), recent.clone());
    }

    params.insert("files".to_string(), outcome.generated_files.to_string());
    if let Some(error) = &outcome.error {
        params.insert("error".to_string(), error.clone());
    }
    params
}
