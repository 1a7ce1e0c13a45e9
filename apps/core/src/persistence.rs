//! Memory persistence.
//!
//! Conversation memory is saved as JSON blobs under session-qualified keys.
//! Writes go through a [`PersistenceHandle`] actor which applies them in
//! submission order; callers never wait on, or see errors from, a write.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence unavailable: {0}")]
    Unavailable(String),
}

/// Storage keys for one session's memory blobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceKeys {
    pub short_term: String,
    pub long_term: String,
}

impl PersistenceKeys {
    const PREFIX: &'static str = "assistant_memory";

    pub fn for_session(session_key: &str) -> Self {
        Self {
            short_term: format!("{}:{}:short_term", Self::PREFIX, session_key),
            long_term: format!("{}:{}:long_term", Self::PREFIX, session_key),
        }
    }
}

/// Key-value store for serialized memory.
#[async_trait]
pub trait MemoryBackend: Send + Sync + 'static {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    async fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// SQLite-backed store (one `memory_blobs` table).
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub async fn connect(path: &Path) -> Result<Self, PersistenceError> {
        let db_url = format!("sqlite://{}", path.to_string_lossy());
        info!("Opening memory database at: {}", db_url);

        let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memory_blobs (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MemoryBackend for SqliteBackend {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM memory_blobs WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO memory_blobs (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM memory_blobs WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Default, Clone)]
pub struct InMemoryBackend {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.blobs.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.blobs.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.blobs.lock().await.remove(key);
        Ok(())
    }
}

#[derive(Debug)]
enum PersistenceMessage {
    Save {
        key: String,
        value: String,
    },
    Remove {
        key: String,
    },
    Load {
        key: String,
        responder: oneshot::Sender<Result<Option<String>, PersistenceError>>,
    },
    Flush {
        responder: oneshot::Sender<()>,
    },
}

/// A handle to the persistence actor.
///
/// `save`/`remove` are fire-and-forget and callable from synchronous code;
/// `load`/`flush` are request/response.
#[derive(Clone)]
pub struct PersistenceHandle {
    sender: mpsc::Sender<PersistenceMessage>,
}

impl PersistenceHandle {
    /// Spawns the actor on the current tokio runtime.
    pub fn spawn(backend: Arc<dyn MemoryBackend>) -> Self {
        let (sender, receiver) = mpsc::channel(256);
        let runner = PersistenceRunner { receiver, backend };
        tokio::spawn(async move { runner.run().await });
        Self { sender }
    }

    fn enqueue(&self, msg: PersistenceMessage) {
        if let Err(e) = self.sender.try_send(msg) {
            warn!("Dropping memory write, persistence queue unavailable: {}", e);
        }
    }

    pub fn save(&self, key: String, value: String) {
        self.enqueue(PersistenceMessage::Save { key, value });
    }

    pub fn remove(&self, key: String) {
        self.enqueue(PersistenceMessage::Remove { key });
    }

    pub async fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let (send, recv) = oneshot::channel();
        let msg = PersistenceMessage::Load {
            key: key.to_string(),
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|_| PersistenceError::Unavailable("persistence actor closed".to_string()))?;
        recv.await
            .map_err(|_| PersistenceError::Unavailable("persistence actor failed to respond".to_string()))?
    }

    /// Resolves once every write queued before this call has been applied.
    pub async fn flush(&self) {
        let (send, recv) = oneshot::channel();
        if self.sender.send(PersistenceMessage::Flush { responder: send }).await.is_err() {
            warn!("Persistence actor closed before flush");
            return;
        }
        let _ = recv.await;
    }
}

struct PersistenceRunner {
    receiver: mpsc::Receiver<PersistenceMessage>,
    backend: Arc<dyn MemoryBackend>,
}

impl PersistenceRunner {
    async fn run(mut self) {
        debug!("Persistence actor started");
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }
        debug!("Persistence actor stopped");
    }

    async fn handle_message(&self, msg: PersistenceMessage) {
        match msg {
            PersistenceMessage::Save { key, value } => {
                if let Err(e) = self.backend.save(&key, &value).await {
                    error!(key = %key, "Failed to persist memory: {}", e);
                }
            }
            PersistenceMessage::Remove { key } => {
                if let Err(e) = self.backend.remove(&key).await {
                    error!(key = %key, "Failed to remove persisted memory: {}", e);
                }
            }
            PersistenceMessage::Load { key, responder } => {
                let _ = responder.send(self.backend.load(&key).await);
            }
            PersistenceMessage::Flush { responder } => {
                let _ = responder.send(());
            }
        }
    }
}
