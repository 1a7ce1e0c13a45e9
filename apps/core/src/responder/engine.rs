//! Response Template Engine.
//!
//! Selects a template for the intent, interpolates `{key}` placeholders, then
//! applies the user's verbosity and communication style, in that order.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use super::templates::TemplateLibrary;
use crate::brain::{Complexity, Intent};
use crate::error::Result;
use crate::models::{CommunicationStyle, TechnicalLevel, UserPreferences, Verbosity};

pub const MAX_SUGGESTIONS: usize = 3;
pub const MAX_FOLLOW_UPS: usize = 2;
/// Contextual suggestions appended after a template's own list.
const MAX_CONTEXTUAL: usize = 2;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("Invalid placeholder regex"));

/// (contracted, expanded) pairs. Forms starting with "I" keep the capital.
const CONTRACTIONS: &[(&str, &str)] = &[
    ("I've", "I have"),
    ("I'm", "I am"),
    ("I'll", "I will"),
    ("I'd", "I would"),
    ("you're", "you are"),
    ("you've", "you have"),
    ("you'd", "you would"),
    ("we're", "we are"),
    ("we'll", "we will"),
    ("they're", "they are"),
    ("it's", "it is"),
    ("that's", "that is"),
    ("here's", "here is"),
    ("there's", "there is"),
    ("what's", "what is"),
    ("let's", "let us"),
    ("don't", "do not"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("isn't", "is not"),
    ("aren't", "are not"),
    ("can't", "cannot"),
    ("won't", "will not"),
];

fn build_rules(expand: bool) -> Vec<(Regex, &'static str)> {
    CONTRACTIONS
        .iter()
        .map(|(short, long)| {
            let (from, to) = if expand { (*short, *long) } else { (*long, *short) };
            let pattern = format!(r"(?i)\b{}\b", regex::escape(from));
            (Regex::new(&pattern).expect("Invalid contraction regex"), to)
        })
        .collect()
}

static EXPAND_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| build_rules(true));
static CONTRACT_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| build_rules(false));

/// Context flags the transforms and contextual suggestions depend on.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Technology entity values detected this turn
    pub technologies: Vec<String>,
    pub complexity: Complexity,
    pub generated_files: usize,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            technologies: vec![],
            complexity: Complexity::Simple,
            generated_files: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResponse {
    pub spoken: String,
    pub display: String,
    pub suggestions: Vec<String>,
    pub follow_ups: Vec<String>,
}

/// Replace `{key}` with `params[key]`. Unknown keys are left as written.
pub fn interpolate(template: &str, params: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Text up to and including the first sentence terminator followed by
/// whitespace or the end of the text.
pub fn first_sentence(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match chars.peek() {
                Some((_, next)) => next.is_whitespace(),
                None => true,
            };
            if at_boundary {
                return text[..i + c.len_utf8()].trim();
            }
        }
    }
    text.trim()
}

pub fn apply_verbosity(text: &str, verbosity: Verbosity, ctx: &RenderContext) -> String {
    match verbosity {
        Verbosity::Concise => first_sentence(text).to_string(),
        Verbosity::Detailed => text.to_string(),
        Verbosity::Comprehensive => {
            let mut out = text.trim_end().to_string();
            if ctx.complexity == Complexity::Complex {
                out.push_str(" Since this is a complex request, I've broken the work into smaller steps you can review one at a time.");
            }
            if ctx.generated_files > 0 {
                out.push_str(&format!(
                    " In total, {} backend files were generated for you to review.",
                    ctx.generated_files
                ));
            }
            out
        }
    }
}

fn replace_preserving_case(text: &str, rules: &[(Regex, &'static str)]) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in rules {
        out = pattern
            .replace_all(&out, |caps: &Captures| {
                let matched = &caps[0];
                let capitalized = matched.chars().next().is_some_and(char::is_uppercase);
                if capitalized {
                    let mut chars = replacement.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                } else {
                    replacement.to_string()
                }
            })
            .into_owned();
    }
    out
}

pub fn apply_style(text: &str, style: CommunicationStyle) -> String {
    match style {
        CommunicationStyle::Formal => replace_preserving_case(text, &EXPAND_RULES),
        CommunicationStyle::Casual => replace_preserving_case(text, &CONTRACT_RULES),
        CommunicationStyle::Friendly => text.to_string(),
    }
}

fn contextual_suggestions(prefs: &UserPreferences, ctx: &RenderContext) -> Vec<String> {
    let mut out = Vec::new();
    match ctx.technologies.first() {
        Some(tech) => out.push(format!("Add {} best practices", tech)),
        None => {
            if let Some(tech) = prefs.preferred_technologies.first() {
                out.push(format!("Build it with {}", tech));
            }
        }
    }
    match prefs.technical_level {
        TechnicalLevel::Beginner => out.push("Walk me through it step by step".to_string()),
        TechnicalLevel::Expert => out.push("Show advanced configuration options".to_string()),
        TechnicalLevel::Intermediate => {}
    }
    out.truncate(MAX_CONTEXTUAL);
    out
}

fn contextual_follow_ups(ctx: &RenderContext) -> Vec<String> {
    ctx.technologies
        .first()
        .map(|tech| vec![format!("Should I keep using {}?", tech)])
        .unwrap_or_default()
}

/// Keep order, drop repeats, cap at `limit`.
fn merge_capped(base: &[String], extra: Vec<String>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(limit);
    for item in base.iter().cloned().chain(extra) {
        if out.len() == limit {
            break;
        }
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

pub struct ResponseEngine {
    library: TemplateLibrary,
}

impl ResponseEngine {
    pub fn new(library: TemplateLibrary) -> Self {
        Self { library }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(TemplateLibrary::builtin()?))
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn render(
        &self,
        intent: Intent,
        matched_text: &str,
        params: &HashMap<String, String>,
        prefs: &UserPreferences,
        ctx: &RenderContext,
    ) -> RenderedResponse {
        let template = self.library.select(intent, matched_text);
        debug!(intent = %intent, pattern = template.match_pattern.as_str(), "Template selected");

        let finish = |raw: &str| {
            let text = interpolate(raw, params);
            let text = apply_verbosity(&text, prefs.verbosity, ctx);
            apply_style(&text, prefs.communication_style)
        };

        RenderedResponse {
            spoken: finish(&template.spoken_template),
            display: finish(&template.display_template),
            suggestions: merge_capped(
                &template.suggestions,
                contextual_suggestions(prefs, ctx),
                MAX_SUGGESTIONS,
            ),
            follow_ups: merge_capped(&template.follow_ups, contextual_follow_ups(ctx), MAX_FOLLOW_UPS),
        }
    }
}
