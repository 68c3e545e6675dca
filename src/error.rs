//! Error types for the query gate.
//!
//! Validation outcomes are never errors: every query yields a [`Verdict`].
//! These types cover initialization only, where a failure must abort startup
//! rather than leave an unconfigured gate in place.
//!
//! [`Verdict`]: crate::security::Verdict

use std::path::PathBuf;
use thiserror::Error;

/// Initialization errors for the query gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An injection signature failed to compile
    #[error("Invalid injection pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration document could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GateError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(name: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            name: name.into(),
            source,
        }
    }

    /// Create an I/O error for a configuration path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get a user-friendly suggestion for how to fix this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Config(_) => Some("Check your environment variables and configuration file"),
            Self::InvalidPattern { .. } => {
                Some("Fix the regular expression in the injection_patterns section")
            }
            Self::Io { .. } => Some("Check that SQLGATE_CONFIG points to a readable file"),
            Self::Parse(_) => Some("Check the configuration file is valid JSON"),
        }
    }
}
