//! Engine configuration.
//!
//! Defaults cover every setting; [`EngineConfig::from_env`] overlays
//! `ASSISTANT_*` environment variables (a `.env` file is read first when present).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

use crate::brain::NeighborExpansion;
use crate::error::{AssistantError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" | "bunyan" => Ok(LogFormat::Json),
            other => Err(AssistantError::Config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Parse `random:P`, `top:K` or `off`.
pub fn parse_neighbor_expansion(s: &str) -> Result<NeighborExpansion> {
    let s = s.trim().to_lowercase();
    if s == "off" || s == "none" || s == "disabled" {
        return Ok(NeighborExpansion::Disabled);
    }

    let (mode, value) = s
        .split_once(':')
        .ok_or_else(|| AssistantError::Config(format!("Invalid neighbor expansion: {}", s)))?;

    match mode {
        "random" => {
            let probability: f64 = value
                .parse()
                .map_err(|_| AssistantError::Config(format!("Invalid probability: {}", value)))?;
            if !(0.0..=1.0).contains(&probability) {
                return Err(AssistantError::Config(format!(
                    "Expansion probability out of range: {}",
                    probability
                )));
            }
            Ok(NeighborExpansion::Probabilistic { probability })
        }
        "top" => {
            let k: usize = value
                .parse()
                .map_err(|_| AssistantError::Config(format!("Invalid neighbor count: {}", value)))?;
            Ok(NeighborExpansion::TopK { k })
        }
        other => Err(AssistantError::Config(format!("Unknown expansion mode: {}", other))),
    }
}

/// Runtime settings for the memory store, extractor and orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Short-term queue capacity per session.
    #[validate(range(min = 1, max = 1000))]
    pub max_short_term: usize,
    /// Long-term entries not seen for this long are purged.
    #[validate(range(min = 1))]
    pub decay_window_hours: i64,
    /// Short-term entries older than this are left out of the query context.
    #[validate(range(min = 1))]
    pub recency_window_minutes: i64,
    /// Short-term texts are truncated to this many chars in the query context.
    #[validate(range(min = 1))]
    pub snippet_chars: usize,
    #[validate(range(min = 1))]
    pub long_term_min_frequency: u32,
    #[validate(range(min = 1))]
    pub long_term_top_k: usize,
    /// Live sessions kept in memory; the least recently used is dropped beyond this.
    #[validate(range(min = 1))]
    pub max_sessions: usize,
    pub neighbor_expansion: NeighborExpansion,
    pub rng_seed: Option<u64>,
    #[validate(range(min = 1))]
    pub max_input_chars: usize,
    /// SQLite file for memory persistence. `None` keeps state in process only.
    pub database_path: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_short_term: 50,
            decay_window_hours: 72,
            recency_window_minutes: 30,
            snippet_chars: 100,
            long_term_min_frequency: 2,
            long_term_top_k: 10,
            max_sessions: 1024,
            neighbor_expansion: NeighborExpansion::default(),
            rng_seed: None,
            max_input_chars: 10_000,
            database_path: None,
            log_format: LogFormat::Pretty,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AssistantError::Config(format!("Invalid value for {}: {}", key, raw))),
        _ => Ok(None),
    }
}

impl EngineConfig {
    /// Load from the environment on top of the defaults, then validate.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_current_env()
    }

    /// Same as [`from_env`](Self::from_env) without touching `.env`.
    pub fn from_current_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = env_parse("ASSISTANT_MAX_SHORT_TERM")? {
            config.max_short_term = v;
        }
        if let Some(v) = env_parse("ASSISTANT_DECAY_HOURS")? {
            config.decay_window_hours = v;
        }
        if let Some(v) = env_parse("ASSISTANT_RECENCY_MINUTES")? {
            config.recency_window_minutes = v;
        }
        if let Some(v) = env_parse("ASSISTANT_SNIPPET_CHARS")? {
            config.snippet_chars = v;
        }
        if let Some(v) = env_parse("ASSISTANT_LONG_TERM_MIN_FREQUENCY")? {
            config.long_term_min_frequency = v;
        }
        if let Some(v) = env_parse("ASSISTANT_LONG_TERM_TOP_K")? {
            config.long_term_top_k = v;
        }
        if let Some(v) = env_parse("ASSISTANT_MAX_SESSIONS")? {
            config.max_sessions = v;
        }
        if let Ok(raw) = env::var("ASSISTANT_NEIGHBOR_EXPANSION") {
            config.neighbor_expansion = parse_neighbor_expansion(&raw)?;
        }
        config.rng_seed = env_parse("ASSISTANT_RNG_SEED")?;
        if let Some(v) = env_parse("ASSISTANT_MAX_INPUT_CHARS")? {
            config.max_input_chars = v;
        }
        config.database_path = env::var("ASSISTANT_DB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        if let Some(v) = env_parse("ASSISTANT_LOG_FORMAT")? {
            config.log_format = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn decay_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.decay_window_hours)
    }

    pub fn recency_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.recency_window_minutes)
    }
}
