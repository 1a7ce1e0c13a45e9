//! Memory Store Tests
//!
//! Capacity, eviction order, decay, ranking and session isolation of the
//! session-keyed memory store.

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::memory::{ConversationPattern, MemoryStore};
use crate::models::PersonalizationLevel;

fn store_with(config: EngineConfig) -> MemoryStore {
    MemoryStore::new(&config, None)
}

fn concepts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod capacity_tests {
    use super::*;

    #[test]
    fn test_short_term_length_is_min_of_records_and_capacity() {
        let store = store_with(EngineConfig {
            max_short_term: 5,
            ..EngineConfig::default()
        });
        for n in 1..=12usize {
            store.record("s", &format!("turn {}", n), &[]);
            let memory = store.snapshot("s").unwrap();
            assert_eq!(memory.short_term.len(), n.min(5));
        }
    }

    #[test]
    fn test_fifty_one_records_evict_the_first() {
        let store = store_with(EngineConfig::default());
        for n in 0..51 {
            store.record("s", &format!("turn {}", n), &[]);
        }

        let memory = store.snapshot("s").unwrap();
        let texts: Vec<String> = memory.short_term.iter().map(|e| e.text.clone()).collect();
        let expected: Vec<String> = (1..51).map(|n| format!("turn {}", n)).collect();
        assert_eq!(texts.len(), 50);
        assert!(!texts.contains(&"turn 0".to_string()));
        assert_eq!(texts, expected);
    }

    #[test]
    fn test_identical_text_twice() {
        let store = store_with(EngineConfig::default());
        let shared = concepts(&["dashboard", "chart"]);

        store.record("s", "create a dashboard with charts", &shared);
        let before = store.snapshot("s").unwrap();
        store.record("s", "create a dashboard with charts", &shared);
        let after = store.snapshot("s").unwrap();

        assert_eq!(after.short_term.len(), before.short_term.len() + 1);
        for concept in &shared {
            assert_eq!(after.long_term[concept].count, before.long_term[concept].count + 1);
        }

        let context = store.query("s");
        assert_eq!(context.short_term.len(), 2);
        assert_eq!(context.long_term, vec!["chart", "dashboard"]);
    }
}

#[cfg(test)]
mod decay_tests {
    use super::*;

    #[test]
    fn test_decayed_entry_absent_from_next_query() {
        let store = store_with(EngineConfig {
            long_term_min_frequency: 1,
            ..EngineConfig::default()
        });
        let start = Utc::now() - Duration::hours(100);
        store.record_at("s", "show sales chart", &concepts(&["chart"]), start);

        let context = store.query_at("s", start + Duration::hours(71));
        assert_eq!(context.long_term, vec!["chart"]);

        let context = store.query_at("s", start + Duration::hours(73));
        assert!(context.long_term.is_empty());
    }

    #[test]
    fn test_last_seen_never_in_the_future() {
        let store = store_with(EngineConfig::default());
        let now = Utc::now();
        store.record_at("s", "chart", &concepts(&["chart"]), now + Duration::minutes(10));
        store.record_at("s", "form", &concepts(&["form"]), now);

        let memory = store.snapshot("s").unwrap();
        assert!(memory.long_term.values().all(|e| e.last_seen <= now));
    }

    #[test]
    fn test_recency_window_filters_short_term_only() {
        let store = store_with(EngineConfig::default());
        let start = Utc::now() - Duration::hours(2);
        store.record_at("s", "old turn", &[], start);
        store.record_at("s", "new turn", &[], start + Duration::minutes(90));

        let context = store.query_at("s", start + Duration::minutes(100));
        assert_eq!(context.short_term, vec!["new turn"]);
        assert_eq!(context.history_len, 2);
    }
}

#[cfg(test)]
mod context_tests {
    use super::*;

    #[test]
    fn test_long_term_ties_broken_by_recency() {
        let store = store_with(EngineConfig {
            long_term_min_frequency: 1,
            ..EngineConfig::default()
        });
        let t0 = Utc::now() - Duration::minutes(5);
        store.record_at("s", "a", &concepts(&["form"]), t0);
        store.record_at("s", "b", &concepts(&["chart"]), t0 + Duration::seconds(1));

        let context = store.query_at("s", t0 + Duration::seconds(2));
        assert_eq!(context.long_term, vec!["chart", "form"]);
    }

    #[test]
    fn test_top_k_limit() {
        let store = store_with(EngineConfig {
            long_term_min_frequency: 1,
            long_term_top_k: 2,
            ..EngineConfig::default()
        });
        store.record("s", "many", &concepts(&["a", "b", "c", "d"]));
        assert_eq!(store.query("s").long_term.len(), 2);
    }

    #[test]
    fn test_patterns_from_recent_turns() {
        let store = store_with(EngineConfig::default());
        store.record("s", "build a login page", &[]);
        store.record("s", "there is an error on submit, please fix it", &[]);
        assert_eq!(store.query("s").patterns, vec![ConversationPattern::ProblemSolving]);
    }

    #[test]
    fn test_personalization_follows_history() {
        let store = store_with(EngineConfig::default());
        let mut levels = Vec::new();
        for n in 0..6 {
            levels.push(PersonalizationLevel::from_history_len(store.query("s").history_len));
            store.record("s", &format!("turn {}", n), &[]);
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
    }

    #[test]
    fn test_similar_ranks_matching_turn_first() {
        let store = store_with(EngineConfig::default());
        store.record("s", "translate the page into spanish", &concepts(&["translate", "spanish"]));
        store.record("s", "build a login form", &concepts(&["login", "form"]));

        let hits = store.similar("s", "build a login form", &concepts(&["login", "form"]), 2);
        assert_eq!(hits[0].0, "build a login form");
        assert!(hits.iter().all(|(_, score)| *score > 0.0));
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    #[test]
    fn test_concurrent_records_are_atomic_per_session() {
        let store = Arc::new(store_with(EngineConfig {
            max_short_term: 1000,
            ..EngineConfig::default()
        }));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for n in 0..25 {
                        store.record("shared", &format!("w{} n{}", worker, n), &concepts(&["chart"]));
                        store.record(&format!("own-{}", worker), "private", &concepts(&["form"]));
                    }
                });
            }
        });

        let shared = store.snapshot("shared").unwrap();
        assert_eq!(shared.short_term.len(), 200);
        assert_eq!(shared.long_term["chart"].count, 200);
        assert!(!shared.long_term.contains_key("form"));

        for worker in 0..8 {
            let own = store.snapshot(&format!("own-{}", worker)).unwrap();
            assert_eq!(own.short_term.len(), 25);
            assert!(!own.long_term.contains_key("chart"));
        }
    }
}
