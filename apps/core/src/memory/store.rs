//! Session-keyed memory store.
//!
//! Each session owns a [`ConversationMemory`] behind its own mutex, so a
//! `record` is applied atomically and sessions never share state. Live
//! sessions are kept in an LRU; persisted sessions are rehydrated on demand.

use chrono::{DateTime, Utc};
use lru::LruCache;
use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::session::{ConversationMemory, LongTermEntry, MemoryContext, MemoryLimits, ShortTermEntry};
use crate::config::EngineConfig;
use crate::persistence::{PersistenceError, PersistenceHandle, PersistenceKeys};

type SharedMemory = Arc<Mutex<ConversationMemory>>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MemoryStore {
    sessions: Mutex<LruCache<String, SharedMemory>>,
    limits: MemoryLimits,
    persistence: Option<PersistenceHandle>,
}

impl MemoryStore {
    pub fn new(config: &EngineConfig, persistence: Option<PersistenceHandle>) -> Self {
        let capacity = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            limits: MemoryLimits::from(config),
            persistence,
        }
    }

    pub fn limits(&self) -> &MemoryLimits {
        &self.limits
    }

    /// The live session, created if missing. Only writers call this.
    fn session(&self, session_key: &str) -> SharedMemory {
        let mut sessions = lock(&self.sessions);
        sessions
            .get_or_insert(session_key.to_string(), || {
                debug!(session = %session_key, "Creating conversation memory");
                Arc::new(Mutex::new(ConversationMemory::new()))
            })
            .clone()
    }

    /// The live session, if any. Reads never create or evict sessions.
    fn existing(&self, session_key: &str) -> Option<SharedMemory> {
        lock(&self.sessions).get(session_key).cloned()
    }

    /// Load persisted memory for a session that is not live yet.
    /// Failures are logged and leave the session empty.
    pub async fn hydrate(&self, session_key: &str) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if lock(&self.sessions).contains(session_key) {
            return;
        }

        let memory = match load_memory(persistence, session_key).await {
            Ok(Some(mut memory)) => {
                // limits may have shrunk since the blobs were written
                memory.enforce_limits(Utc::now(), &self.limits);
                info!(
                    session = %session_key,
                    short_term = memory.short_term.len(),
                    long_term = memory.long_term.len(),
                    "Restored conversation memory"
                );
                memory
            }
            Ok(None) => ConversationMemory::new(),
            Err(e) => {
                warn!(session = %session_key, "Could not restore conversation memory: {}", e);
                ConversationMemory::new()
            }
        };

        let mut sessions = lock(&self.sessions);
        // another turn may have created the session while we were loading
        if !sessions.contains(session_key) {
            sessions.put(session_key.to_string(), Arc::new(Mutex::new(memory)));
        }
    }

    pub fn record(&self, session_key: &str, text: &str, concepts: &[String]) {
        self.record_at(session_key, text, concepts, Utc::now());
    }

    pub fn record_at(&self, session_key: &str, text: &str, concepts: &[String], now: DateTime<Utc>) {
        let shared = self.session(session_key);
        let mut memory = lock(&shared);
        memory.record(text, concepts, now, &self.limits);
        self.persist(session_key, &memory);
    }

    pub fn query(&self, session_key: &str) -> MemoryContext {
        self.query_at(session_key, Utc::now())
    }

    pub fn query_at(&self, session_key: &str, now: DateTime<Utc>) -> MemoryContext {
        match self.existing(session_key) {
            Some(shared) => lock(&shared).query(now, &self.limits),
            None => MemoryContext::default(),
        }
    }

    /// Empty both stores for the session and drop its persisted state.
    pub fn clear(&self, session_key: &str) {
        let removed = lock(&self.sessions).pop(session_key);
        if let Some(shared) = removed {
            let mut memory = lock(&shared);
            *memory = ConversationMemory::new();
        }

        if let Some(persistence) = &self.persistence {
            let keys = PersistenceKeys::for_session(session_key);
            persistence.remove(keys.short_term);
            persistence.remove(keys.long_term);
        }
        info!(session = %session_key, "Conversation memory cleared");
    }

    pub fn similar(&self, session_key: &str, text: &str, concepts: &[String], k: usize) -> Vec<(String, f32)> {
        match self.existing(session_key) {
            Some(shared) => lock(&shared).similar(text, concepts, k),
            None => Vec::new(),
        }
    }

    /// Copy of the session's memory, if the session is live.
    pub fn snapshot(&self, session_key: &str) -> Option<ConversationMemory> {
        let shared = lock(&self.sessions).peek(session_key).cloned()?;
        let memory = lock(&shared).clone();
        Some(memory)
    }

    pub fn live_sessions(&self) -> usize {
        lock(&self.sessions).len()
    }

    fn persist(&self, session_key: &str, memory: &ConversationMemory) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let keys = PersistenceKeys::for_session(session_key);

        match serde_json::to_string(&memory.short_term) {
            Ok(json) => persistence.save(keys.short_term, json),
            Err(e) => warn!(session = %session_key, "Failed to serialize short-term memory: {}", e),
        }
        match serde_json::to_string(&memory.long_term) {
            Ok(json) => persistence.save(keys.long_term, json),
            Err(e) => warn!(session = %session_key, "Failed to serialize long-term memory: {}", e),
        }
    }
}

async fn load_memory(
    persistence: &PersistenceHandle,
    session_key: &str,
) -> Result<Option<ConversationMemory>, PersistenceError> {
    let keys = PersistenceKeys::for_session(session_key);
    let short_term = persistence.load(&keys.short_term).await?;
    let long_term = persistence.load(&keys.long_term).await?;

    if short_term.is_none() && long_term.is_none() {
        return Ok(None);
    }

    let short_term: VecDeque<ShortTermEntry> = match short_term {
        Some(json) => serde_json::from_str(&json)?,
        None => VecDeque::new(),
    };
    let long_term: HashMap<String, LongTermEntry> = match long_term {
        Some(json) => serde_json::from_str(&json)?,
        None => HashMap::new(),
    };

    Ok(Some(ConversationMemory {
        short_term,
        long_term,
    }))
}
