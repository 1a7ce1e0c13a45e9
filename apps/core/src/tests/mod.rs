//! Test Module
//!
//! Integration-level tests for the assistant core.
//!
//! ## Test Categories
//! - `brain_tests`: preprocessing, intent classification, entity extraction, keywords, sentiment
//! - `memory_tests`: short-term capacity, long-term decay and ranking, session isolation
//! - `responder_tests`: template selection, interpolation, verbosity and style transforms
//! - `persistence_tests`: SQLite and in-process backends, broken-backend resilience
//! - `orchestrator_tests`: end-to-end turns and injected test doubles
//! - `config_tests`: environment overlay and validation

pub mod memory_tests;
pub mod orchestrator_tests;
