//! Template-based response generation.

pub mod engine;
pub mod templates;

pub use engine::{
    apply_style, apply_verbosity, interpolate, RenderContext, RenderedResponse, ResponseEngine,
    MAX_FOLLOW_UPS, MAX_SUGGESTIONS,
};
pub use templates::{ResponseTemplate, TemplateLibrary};
