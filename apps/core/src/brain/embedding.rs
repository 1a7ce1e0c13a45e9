//! Deterministic hashed text embedding.
//!
//! Layout of the 128 dimensions:
//! - `0..32`: char codes of the first 32 characters, divided by 255
//! - `32..64`: rolling hash of the first 32 words, `mod 1000 / 1000`
//! - `64..96`: rolling hash of up to 32 concepts, same scaling
//! - `96..100`: text length, word count, concept count and sentence count, scaled and capped at 1
//! - `100..128`: `sin(pi * (v[i - 100] + v[i - 68])) / 2`
//!
//! The vector is L2-normalized unless its magnitude is zero.

use std::f32::consts::PI;

use super::preprocess::split_sentences;

pub const EMBEDDING_DIM: usize = 128;

const SLOT: usize = 32;
const WORDS_AT: usize = 32;
const CONCEPTS_AT: usize = 64;
const STATS_AT: usize = 96;
const MIXED_AT: usize = 100;

/// `h = h * 31 + code` over chars, 32-bit wrapping.
fn rolling_hash(s: &str) -> i32 {
    s.chars()
        .fold(0i32, |h, c| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32))
}

fn hash_unit(s: &str) -> f32 {
    (rolling_hash(s).unsigned_abs() % 1000) as f32 / 1000.0
}

pub fn embed(text: &str, concepts: &[String]) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];

    for (i, c) in text.chars().take(SLOT).enumerate() {
        v[i] = (c as u32 as f32 / 255.0).min(1.0);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    for (i, word) in words.iter().take(SLOT).enumerate() {
        v[WORDS_AT + i] = hash_unit(&word.to_lowercase());
    }

    for (i, concept) in concepts.iter().take(SLOT).enumerate() {
        v[CONCEPTS_AT + i] = hash_unit(concept);
    }

    v[STATS_AT] = (text.chars().count() as f32 / 1000.0).min(1.0);
    v[STATS_AT + 1] = (words.len() as f32 / 100.0).min(1.0);
    v[STATS_AT + 2] = (concepts.len() as f32 / 10.0).min(1.0);
    v[STATS_AT + 3] = (split_sentences(text).len() as f32 / 10.0).min(1.0);

    for i in MIXED_AT..EMBEDDING_DIM {
        v[i] = (PI * (v[i - 100] + v[i - 68])).sin() * 0.5;
    }

    let magnitude = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in v.iter_mut() {
            *x /= magnitude;
        }
    }

    v
}

/// Cosine similarity; 0 when either vector has zero magnitude or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_and_norm() {
        let v = embed("Create a dashboard with charts", &["dashboard".into(), "chart".into()]);
        assert_eq!(v.len(), EMBEDDING_DIM);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_deterministic() {
        let a = embed("same text", &[]);
        let b = embed("same text", &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_stays_zero() {
        let v = embed("", &[]);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_similarity() {
        let a = embed("build a login form", &["login".into(), "form".into()]);
        let b = embed("build a login form", &["login".into(), "form".into()]);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-4);
        assert_eq!(cosine_similarity(&a, &[]), 0.0);
    }

    #[test]
    fn test_rolling_hash_matches_reference() {
        // "ab": (0 * 31 + 97) * 31 + 98
        assert_eq!(rolling_hash("ab"), 3105);
        assert_eq!(hash_unit("ab"), 0.105);
    }
}
