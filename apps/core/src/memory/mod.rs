//! Conversational memory: a bounded short-term queue and a decaying,
//! frequency-ranked long-term concept map, kept per session.

pub mod session;
pub mod store;

pub use session::{
    ConversationMemory, ConversationPattern, LongTermEntry, MemoryContext, MemoryLimits,
    ShortTermEntry,
};
pub use store::MemoryStore;
