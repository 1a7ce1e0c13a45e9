//! Static lexicon and pattern tables.
//!
//! Pure configuration: intent patterns, category keyword lists, concept
//! relationship groups and sentiment words. All patterns are written against
//! *normalized* text (lowercase, no punctuation).

use super::intent::Intent;

/// Intent pattern table. Declaration order is the classifier's tie-break order.
pub const INTENT_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::UiCreation,
        &[
            r"\b(create|build|make|generate|design|develop)\b.*\b(ui|interface|page|dashboard|form|component|app|application|website|site|layout|screen|panel|landing)s?\b",
            r"\b(dashboard|admin|landing page|sidebar|navbar|navigation|form|modal|button|card|layout|homepage)s?\b",
            r"\b(user interface|front ?end|web app|mobile app)\b",
        ],
    ),
    (
        Intent::BackendGeneration,
        &[
            r"\b(api|apis|endpoint|endpoints|backend|back end|server|servers|microservice|microservices)\b",
            r"\b(database|schema|crud|rest|graphql|authentication|auth)\b",
            r"\b(create|build|generate|set up|setup)\b.*\b(api|backend|server|database|endpoint)s?\b",
        ],
    ),
    (
        Intent::DataVisualization,
        &[
            r"\b(chart|graph|plot|diagram|histogram|heatmap|visuali[sz]ation)s?\b",
            r"\b(show|display|visuali[sz]e|plot)\b.*\b(data|metrics|statistics|stats|trends|sales)\b",
            r"\b(pie|bar|line|scatter|area)\s+(chart|graph|plot)s?\b",
        ],
    ),
    (
        Intent::Translation,
        &[
            r"\b(translate|translation|translating)\b",
            r"\b(in|into|to)\s+(spanish|french|german|italian|portuguese|chinese|japanese|korean|arabic|russian|hindi|english)\b",
            r"\b(how do you say)\b",
        ],
    ),
    (
        Intent::ImageAnalysis,
        &[
            r"\b(image|images|photo|photos|picture|pictures|screenshot|screenshots)\b",
            r"\b(analy[sz]e|describe|detect|recogni[sz]e|identify)\b.*\b(image|photo|picture|object|objects|face|faces)\b",
            r"\b(what do you see|ocr)\b",
        ],
    ),
    (
        Intent::ReportGeneration,
        &[
            r"\b(report|reports|summary|summaries|summari[sz]e)\b",
            r"\b(export|download|generate)\b.*\b(pdf|csv|excel|spreadsheet|report|document)\b",
            r"\b(weekly|monthly|quarterly|annual|sales|financial)\s+(report|summary|review)\b",
        ],
    ),
    (
        Intent::Modification,
        &[
            r"^(change|modify|update|edit|adjust|tweak|rename|replace|remove|fix)\b",
            r"\b(make it|make the|can you change|instead of|rather than)\b",
            r"\b(bigger|smaller|darker|lighter|wider|narrower|colou?r|font|style)\b",
        ],
    ),
    (
        Intent::Greeting,
        &[
            r"^(hello|hi|hey|greetings|good morning|good afternoon|good evening|howdy)\b",
            r"\b(nice to meet you|how are you)\b",
        ],
    ),
    (
        Intent::Help,
        &[
            r"^help\b",
            r"\b(help me|i need help|what can you do|how do i use|assist|assistance|support)\b",
            r"\b(capabilities|features|commands)\b",
        ],
    ),
    (
        Intent::Question,
        &[
            r"^(what|why|how|when|where|who|which|whose|is|are|can|could|does|do|should|would)\b",
            r"\b(what is|what are|how do|how does|how can|how to|tell me about)\b",
            r"\b(explain|difference between|meaning of)\b",
        ],
    ),
];

pub const TECHNOLOGY_KEYWORDS: &[&str] = &[
    "react", "vue", "angular", "svelte", "nextjs", "node", "express", "python", "django", "flask",
    "fastapi", "typescript", "javascript", "rust", "java", "kotlin", "swift", "tailwind",
    "bootstrap", "postgres", "mysql", "sqlite", "mongodb", "redis", "graphql", "docker",
    "kubernetes", "aws", "firebase", "supabase", "html", "css",
];

pub const COMPONENT_KEYWORDS: &[&str] = &[
    "dashboard", "form", "button", "modal", "table", "navbar", "sidebar", "card", "layout",
    "page", "header", "footer", "menu", "panel", "admin", "login", "component", "input", "widget",
];

pub const VISUALIZATION_KEYWORDS: &[&str] = &[
    "chart", "graph", "plot", "diagram", "histogram", "heatmap", "visualization", "analytics",
    "metric", "trend",
];

pub const TRANSLATION_KEYWORDS: &[&str] = &[
    "translate", "translation", "language", "spanish", "french", "german", "italian",
    "japanese", "chinese", "locale",
];

pub const VISION_KEYWORDS: &[&str] = &[
    "image", "photo", "picture", "vision", "camera", "ocr", "detect", "recognition",
    "screenshot", "object",
];

pub const REPORT_KEYWORDS: &[&str] = &[
    "report", "summary", "export", "pdf", "csv", "excel", "document", "invoice",
];

/// Relationship groups. Every pair of concepts inside a group is connected in
/// the concept graph; a pair shared by several groups gets a heavier edge.
pub const CONCEPT_GROUPS: &[&[&str]] = &[
    &["react", "component", "state", "hook", "jsx"],
    &["dashboard", "chart", "analytics", "metric", "admin", "table"],
    &["form", "input", "validation", "button", "submit"],
    &["api", "endpoint", "backend", "server", "rest", "graphql"],
    &["database", "schema", "query", "postgres", "mongodb", "sql"],
    &["chart", "graph", "plot", "diagram", "visualization", "trend"],
    &["translate", "translation", "language", "spanish", "french", "german", "locale"],
    &["image", "photo", "picture", "vision", "ocr", "screenshot", "detect"],
    &["report", "summary", "export", "pdf", "csv", "document"],
    &["layout", "navbar", "sidebar", "header", "footer", "page", "menu"],
    &["login", "authentication", "user", "password", "session"],
    &["typescript", "javascript", "node", "express", "react"],
    &["python", "django", "flask", "fastapi", "api"],
    &["tailwind", "css", "html", "layout", "styling"],
    &["docker", "kubernetes", "deployment", "server"],
];

pub const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "awesome", "excellent", "love", "like", "nice", "perfect", "amazing",
    "thanks", "thank", "helpful", "beautiful", "clean", "happy", "wonderful", "cool",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "bad", "wrong", "broken", "hate", "ugly", "terrible", "awful", "error", "fail", "failed",
    "slow", "confusing", "annoying", "bug", "issue", "problem", "crash",
];

/// Substring markers for conversation pattern detection over recent turns.
pub const REFINEMENT_MARKERS: &[&str] = &["change", "modify", "update", "edit", "adjust", "tweak"];
pub const EXPANSION_MARKERS: &[&str] = &["add", "include", "also", "extend"];
pub const PROBLEM_MARKERS: &[&str] = &["fix", "error", "issue", "bug", "broken", "problem"];

/// Whether a token (or its singular form) belongs to any domain vocabulary.
pub fn is_domain_term(token: &str) -> bool {
    let singular = token.strip_suffix('s').unwrap_or(token);
    [
        TECHNOLOGY_KEYWORDS,
        COMPONENT_KEYWORDS,
        VISUALIZATION_KEYWORDS,
        TRANSLATION_KEYWORDS,
        VISION_KEYWORDS,
        REPORT_KEYWORDS,
    ]
    .iter()
    .any(|list| list.contains(&token) || list.contains(&singular))
        || CONCEPT_GROUPS
            .iter()
            .any(|group| group.contains(&token) || group.contains(&singular))
}
