//! Configuration management for the query gate.
//!
//! Configuration comes from an optional JSON file named by `SQLGATE_CONFIG`,
//! with individual settings overridable by environment variables following
//! the 12-factor app pattern. Any configuration problem is fatal: the gate
//! refuses to start rather than run with an empty or permissive rule set.

use crate::constants::{
    DEFAULT_DANGEROUS_KEYWORDS, DEFAULT_MAX_QUERY_LENGTH, DEFAULT_MAX_RESULT_ROWS,
    ENV_ALLOW_WRITE, ENV_CONFIG_PATH, ENV_DIALECT, ENV_MAX_QUERY_LENGTH, ENV_MAX_ROWS,
};
use crate::error::GateError;
use crate::security::{default_patterns, DialectOptions, KeywordSets, PatternSpec, StatementKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Security configuration
    pub security: SecurityConfig,

    /// Lexical dialect options
    pub dialect: DialectOptions,

    /// Query rewriting configuration
    pub query: QueryConfig,
}

/// Security configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum query length (bytes)
    pub max_query_length: usize,

    /// Write operations are never permitted; `true` is a startup error.
    pub allow_write: bool,

    /// Safe and dangerous keyword sets
    pub keywords: KeywordConfig,

    /// Injection signatures, in evaluation order
    pub injection_patterns: Vec<PatternSpec>,
}

/// Keyword set configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Leading keywords of read-only statements and the kind each introduces
    pub safe: BTreeMap<String, StatementKind>,

    /// Keywords that reject a query wherever they appear in code
    pub dangerous: Vec<String>,
}

/// Query rewriting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Row limit appended to unbounded reads
    pub max_result_rows: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SQLGATE_CONFIG`: Path to a JSON configuration file (default: built-in rules)
    /// - `SQLGATE_DIALECT`: Dialect preset (generic, ansi, postgres, sqlite, mssql, mysql)
    /// - `SQLGATE_MAX_QUERY_LENGTH`: Maximum query length in bytes (default: 100000)
    /// - `SQLGATE_MAX_ROWS`: Row limit for unbounded reads (default: 100)
    /// - `SQLGATE_ALLOW_WRITE`: Must be unset or false
    pub fn from_env() -> Result<Self, GateError> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(name) = std::env::var(ENV_DIALECT) {
            config.dialect = DialectOptions::preset(&name).ok_or_else(|| {
                GateError::config(format!("{} has unknown dialect '{}'", ENV_DIALECT, name))
            })?;
        }

        if let Some(max_query_length) = parse_env(ENV_MAX_QUERY_LENGTH)? {
            config.security.max_query_length = max_query_length;
        }

        if let Some(max_result_rows) = parse_env(ENV_MAX_ROWS)? {
            config.query.max_result_rows = max_result_rows;
        }

        if let Ok(v) = std::env::var(ENV_ALLOW_WRITE) {
            config.security.allow_write = v.to_lowercase() == "true" || v == "1";
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GateError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Parse configuration from a JSON document. Missing sections take defaults.
    pub fn from_json_str(text: &str) -> Result<Self, GateError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration describes a usable, read-only gate.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.security.allow_write {
            return Err(GateError::config(
                "SQL write operations are not allowed for security reasons",
            ));
        }
        if self.security.max_query_length == 0 {
            return Err(GateError::config("max_query_length must be greater than zero"));
        }
        if self.query.max_result_rows == 0 {
            return Err(GateError::config("max_result_rows must be greater than zero"));
        }
        KeywordSets::from_config(&self.security.keywords)?;
        Ok(())
    }
}

/// Read and parse an optional numeric environment variable.
fn parse_env(name: &str) -> Result<Option<usize>, GateError> {
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GateError::config(format!("{} must be a positive integer, got '{}'", name, v))),
        Err(_) => Ok(None),
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
            allow_write: false,
            keywords: KeywordConfig::default(),
            injection_patterns: default_patterns(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let safe = [
            ("SELECT", StatementKind::Select),
            ("WITH", StatementKind::Cte),
            ("SHOW", StatementKind::Show),
            ("DESCRIBE", StatementKind::Describe),
            ("DESC", StatementKind::Describe),
            ("EXPLAIN", StatementKind::Describe),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            safe,
            dangerous: DEFAULT_DANGEROUS_KEYWORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_result_rows: DEFAULT_MAX_RESULT_ROWS,
        }
    }
}
