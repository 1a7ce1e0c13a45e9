use async_trait::async_trait;
use std::collections::HashMap;

use crate::brain::Intent;
use crate::memory::{MemoryContext, MemoryStore};
use crate::models::UserPreferences;
use crate::responder::{RenderContext, RenderedResponse, ResponseEngine};

/// Defines the interface the orchestrator uses for conversational memory.
///
/// Implementations must keep sessions isolated and must never surface
/// persistence failures to the caller.
#[async_trait]
pub trait MemoryProvider: Send + Sync + 'static {
    /// Makes any persisted state for the session available before it is queried.
    async fn hydrate(&self, session_key: &str);

    /// Returns the memory context for the session as of now.
    fn context(&self, session_key: &str) -> MemoryContext;

    /// Records one turn and the concepts it mentioned.
    fn record(&self, session_key: &str, text: &str, concepts: &[String]);

    /// Empties the session's memory, including persisted state.
    fn clear(&self, session_key: &str);

    /// Short-term texts most similar to `text`, best first.
    fn similar(&self, session_key: &str, text: &str, concepts: &[String], k: usize) -> Vec<(String, f32)>;
}

/// Defines the interface for turning an intent and its parameters into reply text.
pub trait ResponseRenderer: Send + Sync + 'static {
    fn render(
        &self,
        intent: Intent,
        matched_text: &str,
        params: &HashMap<String, String>,
        prefs: &UserPreferences,
        ctx: &RenderContext,
    ) -> RenderedResponse;
}

#[async_trait]
impl MemoryProvider for MemoryStore {
    async fn hydrate(&self, session_key: &str) {
        MemoryStore::hydrate(self, session_key).await
    }

    fn context(&self, session_key: &str) -> MemoryContext {
        self.query(session_key)
    }

    fn record(&self, session_key: &str, text: &str, concepts: &[String]) {
        MemoryStore::record(self, session_key, text, concepts)
    }

    fn clear(&self, session_key: &str) {
        MemoryStore::clear(self, session_key)
    }

    fn similar(&self, session_key: &str, text: &str, concepts: &[String], k: usize) -> Vec<(String, f32)> {
        MemoryStore::similar(self, session_key, text, concepts, k)
    }
}

impl ResponseRenderer for ResponseEngine {
    fn render(
        &self,
        intent: Intent,
        matched_text: &str,
        params: &HashMap<String, String>,
        prefs: &UserPreferences,
        ctx: &RenderContext,
    ) -> RenderedResponse {
        ResponseEngine::render(self, intent, matched_text, params, prefs, ctx)
    }
}
