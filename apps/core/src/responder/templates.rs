//! Response templates.
//!
//! Templates are grouped by intent and tried in order; the first whose pattern
//! matches the utterance wins. A universal fallback answers anything no group
//! handles and must always be present.

use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use crate::brain::Intent;
use crate::error::{AssistantError, Result};

#[derive(Debug, Clone)]
pub struct ResponseTemplate {
    pub match_pattern: Regex,
    pub spoken_template: String,
    pub display_template: String,
    pub suggestions: Vec<String>,
    pub follow_ups: Vec<String>,
}

/// Uncompiled template, as written in the built-in table.
pub struct TemplateSpec {
    pub pattern: &'static str,
    pub spoken: &'static str,
    pub display: &'static str,
    pub suggestions: &'static [&'static str],
    pub follow_ups: &'static [&'static str],
}

impl TryFrom<&TemplateSpec> for ResponseTemplate {
    type Error = AssistantError;

    fn try_from(spec: &TemplateSpec) -> Result<Self> {
        Ok(Self {
            match_pattern: Regex::new(spec.pattern)?,
            spoken_template: spec.spoken.to_string(),
            display_template: spec.display.to_string(),
            suggestions: spec.suggestions.iter().map(|s| s.to_string()).collect(),
            follow_ups: spec.follow_ups.iter().map(|s| s.to_string()).collect(),
        })
    }
}

pub struct TemplateLibrary {
    groups: HashMap<Intent, Vec<ResponseTemplate>>,
    fallback: ResponseTemplate,
}

impl TemplateLibrary {
    /// Fails fast when no fallback template is supplied.
    pub fn new(
        groups: HashMap<Intent, Vec<ResponseTemplate>>,
        fallback: Option<ResponseTemplate>,
    ) -> Result<Self> {
        let fallback = fallback.ok_or_else(|| {
            AssistantError::TemplateMissing("universal fallback template is not configured".to_string())
        })?;
        Ok(Self { groups, fallback })
    }

    pub fn builtin() -> Result<Self> {
        let mut groups = HashMap::new();
        for (intent, specs) in BUILTIN_TEMPLATES {
            let templates = specs
                .iter()
                .map(ResponseTemplate::try_from)
                .collect::<Result<Vec<_>>>()?;
            groups.insert(*intent, templates);
        }
        let fallback = ResponseTemplate::try_from(&FALLBACK_TEMPLATE)?;
        debug!(groups = groups.len(), "Loaded built-in response templates");
        Self::new(groups, Some(fallback))
    }

    /// First template of the intent's group matching `text`, else the fallback.
    pub fn select(&self, intent: Intent, text: &str) -> &ResponseTemplate {
        self.groups
            .get(&intent)
            .and_then(|group| group.iter().find(|t| t.match_pattern.is_match(text)))
            .unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &ResponseTemplate {
        &self.fallback
    }

    pub fn group_len(&self, intent: Intent) -> usize {
        self.groups.get(&intent).map_or(0, Vec::len)
    }
}

pub const FALLBACK_TEMPLATE: TemplateSpec = TemplateSpec {
    pattern: r"(?s).*",
    spoken: "I'm not sure I understood that. Could you tell me a bit more about what you'd like to build?",
    display: "I didn't quite catch that. Try describing a UI, an API, a chart, a translation or a report.",
    suggestions: &["Create a dashboard", "Build a REST API", "Generate a sales chart"],
    follow_ups: &["What would you like to build today?"],
};

pub const BUILTIN_TEMPLATES: &[(Intent, &[TemplateSpec])] = &[
    (
        Intent::UiCreation,
        &[
            TemplateSpec {
                pattern: r"(?i)dashboard|admin",
                spoken: "I've created your dashboard with a responsive layout. It's ready for widgets and live data.",
                display: "Dashboard created: responsive grid, navigation sidebar and widget slots.",
                suggestions: &["Add a chart widget", "Add a data table", "Add a dark mode toggle"],
                follow_ups: &["Which metrics should the dashboard show first?", "Should the data refresh automatically?"],
            },
            TemplateSpec {
                pattern: r"(?i)form|login|sign ?up|register",
                spoken: "I've built the {component} for you. It's got field validation and a clear submit flow.",
                display: "Form ready: labelled inputs, inline validation and a submit handler.",
                suggestions: &["Add password strength hints", "Connect the form to an API"],
                follow_ups: &["Where should submissions be sent?"],
            },
            TemplateSpec {
                pattern: r"(?i)landing|home ?page|website",
                spoken: "Your page is ready. I've laid out a hero section, features and a call to action.",
                display: "Page created: hero, feature grid, call to action and footer.",
                suggestions: &["Add a pricing section", "Add a testimonials carousel"],
                follow_ups: &["Do you have brand colors I should use?"],
            },
            TemplateSpec {
                pattern: r"(?s).*",
                spoken: "I've created the {component} you asked for. Let's refine it together.",
                display: "Interface generated. Review the layout and tell me what to adjust.",
                suggestions: &["Make it responsive", "Add navigation"],
                follow_ups: &["What should happen when users interact with it?"],
            },
        ],
    ),
    (
        Intent::BackendGeneration,
        &[
            TemplateSpec {
                pattern: r"(?i)auth|login|user",
                spoken: "I've set up the authentication backend. It's generated {files} files including login and session handling.",
                display: "Auth backend: {files} files, login, logout and session endpoints.",
                suggestions: &["Add password reset", "Add role-based access"],
                follow_ups: &["Which identity providers do you need?"],
            },
            TemplateSpec {
                pattern: r"(?s).*",
                spoken: "I've generated your backend. That's {files} files covering routes, models and validation.",
                display: "Backend generated: {files} files (routes, models, validation).",
                suggestions: &["Add API documentation", "Add request logging"],
                follow_ups: &["Which database should it use?", "Do you need authentication?"],
            },
        ],
    ),
    (
        Intent::DataVisualization,
        &[
            TemplateSpec {
                pattern: r"(?i)pie|donut",
                spoken: "Here's your pie chart. I've labelled each slice with its share.",
                display: "Pie chart rendered with percentage labels.",
                suggestions: &["Switch to a bar chart", "Add a legend"],
                follow_ups: &["Should small slices be grouped as Other?"],
            },
            TemplateSpec {
                pattern: r"(?s).*",
                spoken: "I've built the {visualization} for your data. Hover over it to see exact values.",
                display: "Visualization ready: {visualization} with tooltips and axis labels.",
                suggestions: &["Add a date range filter", "Export the chart as an image"],
                follow_ups: &["Which time period should it cover?"],
            },
        ],
    ),
    (
        Intent::Translation,
        &[TemplateSpec {
            pattern: r"(?s).*",
            spoken: "I'll translate that into {language} for you.",
            display: "Translation requested: {language}.",
            suggestions: &["Translate the whole interface", "Add a language switcher"],
            follow_ups: &["Should I keep technical terms in English?"],
        }],
    ),
    (
        Intent::ImageAnalysis,
        &[TemplateSpec {
            pattern: r"(?s).*",
            spoken: "I'm analyzing the image now. I'll describe what I find.",
            display: "Image analysis started: objects, text and layout.",
            suggestions: &["Extract text from the image", "Generate a UI from this screenshot"],
            follow_ups: &["Is there anything specific I should look for?"],
        }],
    ),
    (
        Intent::ReportGeneration,
        &[
            TemplateSpec {
                pattern: r"(?i)pdf|export|download",
                spoken: "Your report is ready to export. I've formatted it for printing.",
                display: "Report exported with summary, charts and appendix.",
                suggestions: &["Schedule this report weekly", "Email the report"],
                follow_ups: &["Who should receive this report?"],
            },
            TemplateSpec {
                pattern: r"(?s).*",
                spoken: "I've put together the {report} with the key figures up front.",
                display: "Report generated: executive summary, key metrics and details.",
                suggestions: &["Add charts to the report", "Export as PDF"],
                follow_ups: &["Which period should the report cover?"],
            },
        ],
    ),
    (
        Intent::Modification,
        &[TemplateSpec {
            pattern: r"(?s).*",
            spoken: "Done. I've applied your changes. Let me know if it's not quite right.",
            display: "Changes applied to the current design.",
            suggestions: &["Undo the last change", "Preview on mobile"],
            follow_ups: &["Anything else you'd like to change?"],
        }],
    ),
    (
        Intent::Greeting,
        &[TemplateSpec {
            pattern: r"(?s).*",
            spoken: "Hi there! I'm ready to help. What are we building today?",
            display: "Hello! I can create interfaces, APIs, charts, translations and reports.",
            suggestions: &["Create a dashboard", "Build a login form"],
            follow_ups: &["What are we building today?"],
        }],
    ),
    (
        Intent::Help,
        &[TemplateSpec {
            pattern: r"(?s).*",
            spoken: "I can build interfaces, generate backends, draw charts, translate text and write reports. Just describe what you need.",
            display: "Capabilities: UI creation, backend generation, data visualization, translation, image analysis, reports.",
            suggestions: &["Create a dashboard", "Build a REST API", "Generate a monthly report"],
            follow_ups: &["Which of these would you like to try?"],
        }],
    ),
    (
        Intent::Question,
        &[TemplateSpec {
            pattern: r"(?s).*",
            spoken: "Good question about {topic}. Here's what I'd suggest.",
            display: "Answering your question about {topic}.",
            suggestions: &["Show me an example", "Explain it step by step"],
            follow_ups: &["Would you like me to build an example?"],
        }],
    ),
];
