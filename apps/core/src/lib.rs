// Assistant Core
// Intent classification, entity extraction, conversational memory and templated replies

pub mod brain;
pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod persistence;
pub mod responder;
pub mod traits;

pub use config::EngineConfig;
pub use error::{AssistantError, Result};
pub use models::{GenerationOutcome, SmartResponse, UserPreferences};
pub use orchestrator::Orchestrator;

#[cfg(test)]
mod tests;
