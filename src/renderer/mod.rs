//! Template renderer
//!
//! Walks a parsed [`Document`](crate::parser::Document) against a
//! [`Context`](crate::context::Context), evaluating expressions, registering
//! component definitions and instantiating component uses as they are reached.

pub mod config;
mod eval;
mod nodes;

pub use config::{ConfigError, RenderConfig};
pub use eval::{evaluate, resolve_params};
pub use nodes::{render_document, render_nodes};
