//! Error types for the core building blocks.

use std::path::PathBuf;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized back to TOML.
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration file could not be read.
    #[error("Failed to read engine config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A field holds a value outside its accepted range.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
