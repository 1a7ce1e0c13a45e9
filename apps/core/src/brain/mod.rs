//! # Brain Module
//!
//! Fast, non-ML text understanding for the assistant.
//! Everything here is deterministic given its configuration (the only
//! randomness is the optional probabilistic neighbor expansion).
//!
//! ## Components
//! - `lexicon`: static pattern tables and keyword lists
//! - `preprocess`: normalization, tokenization, sentence splitting
//! - `intent`: regex intent classification
//! - `entities`: concept graph and entity extraction
//! - `keywords`: TF-IDF keyword extraction
//! - `complexity`: request complexity scoring
//! - `sentiment`: lexicon sentiment
//! - `embedding`: hashed text vectors for memory entries

pub mod complexity;
pub mod embedding;
pub mod entities;
pub mod intent;
pub mod keywords;
pub mod lexicon;
pub mod preprocess;
pub mod sentiment;

pub use complexity::{Complexity, ComplexityMetrics, ComplexityScorer};
pub use entities::{ConceptGraph, Entity, EntityCategory, EntityExtractor, NeighborExpansion};
pub use intent::{Intent, IntentClassifier, IntentMatch};
pub use keywords::{KeywordExtractor, KeywordResult};
pub use preprocess::{normalize, split_sentences, tokenize, Preprocessed, TokenSpan};
pub use sentiment::{Sentiment, SentimentLabel};
