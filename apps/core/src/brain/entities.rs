//! Entity and concept extraction.
//!
//! Tokens are looked up in a static concept graph built from the lexicon's
//! relationship groups. Direct hits become entities; their graph neighbors can
//! be pulled in as well according to the configured [`NeighborExpansion`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;
use tracing::warn;

use super::lexicon::{
    COMPONENT_KEYWORDS, CONCEPT_GROUPS, REPORT_KEYWORDS, TECHNOLOGY_KEYWORDS,
    TRANSLATION_KEYWORDS, VISION_KEYWORDS, VISUALIZATION_KEYWORDS,
};
use super::preprocess::TokenSpan;

/// Entity category, declared in tagging priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Technology,
    Component,
    Visualization,
    Translation,
    Vision,
    Report,
    Other,
}

impl EntityCategory {
    /// Categories with a keyword list, in priority order.
    const TAGGED: [(EntityCategory, &'static [&'static str]); 6] = [
        (EntityCategory::Technology, TECHNOLOGY_KEYWORDS),
        (EntityCategory::Component, COMPONENT_KEYWORDS),
        (EntityCategory::Visualization, VISUALIZATION_KEYWORDS),
        (EntityCategory::Translation, TRANSLATION_KEYWORDS),
        (EntityCategory::Vision, VISION_KEYWORDS),
        (EntityCategory::Report, REPORT_KEYWORDS),
    ];

    /// First category whose keyword list has an entry contained in `value`.
    pub fn tag(value: &str) -> Self {
        Self::TAGGED
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| value.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(EntityCategory::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityCategory::Technology => "technology",
            EntityCategory::Component => "component",
            EntityCategory::Visualization => "visualization",
            EntityCategory::Translation => "translation",
            EntityCategory::Vision => "vision",
            EntityCategory::Report => "report",
            EntityCategory::Other => "other",
        }
    }
}

/// A tagged concept found in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub category: EntityCategory,
    pub value: String,
    /// Char offset into the normalized text of the token that produced this entity
    pub start_offset: usize,
    pub end_offset: usize,
    pub score: f32,
}

/// Undirected concept graph. Edge weight is the number of relationship groups
/// a pair of concepts appears in together.
#[derive(Debug, Clone, Default)]
pub struct ConceptGraph {
    edges: HashMap<String, BTreeMap<String, u32>>,
}

impl ConceptGraph {
    /// Build the graph from the static relationship groups.
    pub fn builtin() -> Self {
        Self::from_groups(CONCEPT_GROUPS)
    }

    pub fn from_groups(groups: &[&[&str]]) -> Self {
        let mut edges: HashMap<String, BTreeMap<String, u32>> = HashMap::new();

        for group in groups {
            for a in group.iter() {
                let neighbors = edges.entry(a.to_string()).or_default();
                for b in group.iter().filter(|b| *b != a) {
                    *neighbors.entry(b.to_string()).or_insert(0) += 1;
                }
            }
        }

        Self { edges }
    }

    pub fn contains(&self, concept: &str) -> bool {
        self.edges.contains_key(concept)
    }

    /// Neighbors ranked by edge weight descending, then alphabetically.
    pub fn neighbors(&self, concept: &str) -> Vec<(&str, u32)> {
        let mut ranked: Vec<(&str, u32)> = self
            .edges
            .get(concept)
            .map(|n| n.iter().map(|(k, w)| (k.as_str(), *w)).collect())
            .unwrap_or_default();
        // BTreeMap iteration is already alphabetical, a stable sort keeps it for ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Resolve a token to a concept key, trying the token itself and then its
    /// singular form.
    pub fn resolve<'a>(&self, token: &'a str) -> Option<&'a str> {
        if self.contains(token) {
            return Some(token);
        }
        token.strip_suffix('s').filter(|s| self.contains(s))
    }
}

/// How graph neighbors of a directly matched concept are pulled in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NeighborExpansion {
    /// Each matched concept independently expands to all its neighbors with this probability.
    Probabilistic { probability: f64 },
    /// Always expand to the `k` heaviest neighbors.
    TopK { k: usize },
    /// Never expand.
    Disabled,
}

impl Default for NeighborExpansion {
    fn default() -> Self {
        NeighborExpansion::Probabilistic { probability: 0.3 }
    }
}

const DIRECT_SCORE: f32 = 1.0;
const NEIGHBOR_SCORE: f32 = 0.5;

/// Extracts tagged entities from tokens.
pub struct EntityExtractor {
    graph: ConceptGraph,
    expansion: NeighborExpansion,
    rng: Mutex<StdRng>,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new(NeighborExpansion::default(), None)
    }
}

impl EntityExtractor {
    pub fn new(expansion: NeighborExpansion, seed: Option<u64>) -> Self {
        Self::with_graph(ConceptGraph::builtin(), expansion, seed)
    }

    pub fn with_graph(graph: ConceptGraph, expansion: NeighborExpansion, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            graph,
            expansion,
            rng: Mutex::new(rng),
        }
    }

    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    fn should_expand(&self) -> bool {
        match self.expansion {
            NeighborExpansion::Probabilistic { probability } => {
                let p = probability.clamp(0.0, 1.0);
                match self.rng.lock() {
                    Ok(mut rng) => rng.gen_bool(p),
                    Err(poisoned) => poisoned.into_inner().gen_bool(p),
                }
            }
            NeighborExpansion::TopK { k } => k > 0,
            NeighborExpansion::Disabled => false,
        }
    }

    fn expansion_limit(&self) -> usize {
        match self.expansion {
            NeighborExpansion::TopK { k } => k,
            _ => usize::MAX,
        }
    }

    /// Concepts the tokens name directly, deduplicated and in the order
    /// `extract` reports them. Neighbor expansion never applies, so the
    /// same tokens always give the same list.
    pub fn concepts(&self, tokens: &[TokenSpan]) -> Vec<String> {
        let tagged: BTreeSet<(EntityCategory, &str)> = tokens
            .iter()
            .filter_map(|t| self.graph.resolve(&t.text))
            .map(|c| (EntityCategory::tag(c), c))
            .collect();
        tagged.into_iter().map(|(_, c)| c.to_string()).collect()
    }

    /// Extract entities from tokens.
    ///
    /// The result is deduplicated by `(category, value)` (the first, i.e.
    /// direct, occurrence wins) and sorted by category priority, then value.
    pub fn extract(&self, tokens: &[TokenSpan]) -> Vec<Entity> {
        let mut seen: BTreeSet<(EntityCategory, String)> = BTreeSet::new();
        let mut entities = Vec::new();

        let mut push = |value: &str, span: &TokenSpan, score: f32| {
            let category = EntityCategory::tag(value);
            if seen.insert((category, value.to_string())) {
                entities.push(Entity {
                    category,
                    value: value.to_string(),
                    start_offset: span.start,
                    end_offset: span.end,
                    score,
                });
            }
        };

        let mut expansions = Vec::new();
        for span in tokens {
            let Some(concept) = self.graph.resolve(&span.text) else {
                continue;
            };
            push(concept, span, DIRECT_SCORE);

            if self.should_expand() {
                expansions.push((concept, span));
            }
        }

        // neighbors come after every direct hit so a direct match always wins dedup
        let limit = self.expansion_limit();
        for (concept, span) in expansions {
            for (neighbor, _) in self.graph.neighbors(concept).into_iter().take(limit) {
                push(neighbor, span, NEIGHBOR_SCORE);
            }
        }

        if entities.len() > 64 {
            warn!(count = entities.len(), "Unusually large entity set extracted");
        }

        entities.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.value.cmp(&b.value)));
        entities
    }
}
