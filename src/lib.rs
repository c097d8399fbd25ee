//! Megamacros - reusable components with slots for Django-style templates
//!
//! This library provides a lexer, parser and renderer for a small template
//! language whose centerpiece is the component layer: `definecomponent`
//! registers a named fragment with default parameters and slots,
//! `usecomponent` instantiates it, overriding parameters and filling slots.
//!
//! # Example
//!
//! ```rust
//! use megamacros::render;
//!
//! let html = render(
//!     "{% definecomponent greet who='world' %}Hello, {{ who }}!{% enddefinecomponent %}\
//!      {% usecomponent greet who='Ada' %}{% endusecomponent %}",
//! )
//! .unwrap();
//! assert_eq!(html, "Hello, Ada!");
//! ```

pub mod component;
pub mod context;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod value;

pub use component::{ComponentDefinition, ComponentError, ComponentRegistry};
pub use context::{Context, Scope};
pub use error::ParseError;
pub use parser::{parse, Document};
pub use renderer::{render_document, ConfigError, RenderConfig};
pub use value::Value;

use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// Error during parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Error while instantiating a component
    #[error("component error: {0}")]
    Component(#[from] ComponentError),

    /// Error while loading configuration
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<Vec<ParseError>> for RenderError {
    fn from(errors: Vec<ParseError>) -> Self {
        RenderError::Parse(errors)
    }
}

impl RenderError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            RenderError::Parse(errors) => errors
                .iter()
                .map(|e| e.format(source, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            RenderError::Component(err) => err.format(source, filename),
            RenderError::Config(err) => format!("Error: {}\n", err),
        }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Render template source with default configuration
///
/// This is the main entry point for the library. It parses the source and
/// renders it against a fresh context, so component definitions never leak
/// from one call into the next.
///
/// # Example
///
/// ```rust
/// use megamacros::{render, RenderError};
///
/// let html = render("{{ missing }}<b>{{ 'x'|upper }}</b>").unwrap();
/// assert_eq!(html, "<b>X</b>");
///
/// let err = render("{% usecomponent ghost %}{% endusecomponent %}").unwrap_err();
/// assert!(matches!(err, RenderError::Component(_)));
/// ```
pub fn render(source: &str) -> Result<String, RenderError> {
    render_with_config(source, &RenderConfig::default())
}

/// Render template source with custom configuration
///
/// # Example
///
/// ```rust
/// use megamacros::{render_with_config, RenderConfig};
///
/// let config = RenderConfig::new()
///     .with_autoescape(false)
///     .with_global("site", "<Example>");
///
/// let html = render_with_config("{{ site }}", &config).unwrap();
/// assert_eq!(html, "<Example>");
/// ```
pub fn render_with_config(source: &str, config: &RenderConfig) -> Result<String, RenderError> {
    let doc = parse(source)?;

    let mut context = Context::from_config(config);
    let output = render_document(&doc, &mut context)?;

    tracing::debug!(
        components = context.registry().len(),
        bytes = output.len(),
        "rendered template"
    );
    Ok(output)
}
