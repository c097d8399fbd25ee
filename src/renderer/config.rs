//! Configuration for template rendering

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::context::Scope;
use crate::value::Value;

/// Errors that can occur when loading render configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration options for one render call
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Whether `{{ }}` output is HTML-escaped
    pub autoescape: bool,

    /// Variables bound in the root scope
    pub globals: Scope,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            autoescape: true,
            globals: Scope::new(),
        }
    }
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
struct TomlConfig {
    autoescape: Option<bool>,
    #[serde(default)]
    globals: toml::Table,
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether output is escaped
    pub fn with_autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }

    /// Bind a single global variable
    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }

    /// Bind several global variables, replacing existing ones of the same name
    pub fn with_globals(mut self, globals: Scope) -> Self {
        self.globals.extend(globals);
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    ///
    /// ```toml
    /// autoescape = false
    ///
    /// [globals]
    /// site = "Example"
    /// ```
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;

        Ok(RenderConfig {
            autoescape: parsed.autoescape.unwrap_or(true),
            globals: parsed
                .globals
                .into_iter()
                .map(|(name, value)| (name, Value::from(value)))
                .collect(),
        })
    }
}
