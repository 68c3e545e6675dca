//! Query validation: the single public entry point of the gate.

use super::classifier::StatementKind;
use super::guards::{evaluate, GuardContext};
use super::injection::InjectionPatternSet;
use super::keywords::KeywordSets;
use super::scanner::{scan, split_statements, DialectOptions};
use crate::audit::truncate_for_log;
use crate::config::Config;
use crate::constants::LOG_QUERY_TRUNCATE_LENGTH;
use crate::error::GateError;
use serde::Serialize;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info};

/// Why a query was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReasonCode {
    MultipleStatementsDetected,
    MalformedQuery,
    InjectionPatternDetected,
    WriteOperationDetected,
    UnknownStatementType,
    QueryTooLong,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleStatementsDetected => "MultipleStatementsDetected",
            Self::MalformedQuery => "MalformedQuery",
            Self::InjectionPatternDetected => "InjectionPatternDetected",
            Self::WriteOperationDetected => "WriteOperationDetected",
            Self::UnknownStatementType => "UnknownStatementType",
            Self::QueryTooLong => "QueryTooLong",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decision for one query.
///
/// Execution layers must refuse to run anything but [`Verdict::Allowed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Verdict {
    Allowed {
        kind: StatementKind,
    },
    Rejected {
        reason: ReasonCode,
        detail: String,
    },
}

impl Verdict {
    /// Create a rejection.
    pub fn rejected(reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self::Rejected {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Statement kind of an allowed query.
    pub fn kind(&self) -> Option<StatementKind> {
        match self {
            Self::Allowed { kind } => Some(*kind),
            Self::Rejected { .. } => None,
        }
    }

    /// Reason code of a rejected query.
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Self::Allowed { .. } => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }

    /// Detail of a rejected query.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Allowed { .. } => None,
            Self::Rejected { detail, .. } => Some(detail),
        }
    }

    /// Human-readable summary of the decision.
    pub fn message(&self) -> String {
        match self {
            Self::Allowed { .. } => "Query is safe".to_string(),
            Self::Rejected { reason, detail } => format!("{}: {}", reason, detail),
        }
    }
}

/// Read-only query validator.
///
/// Holds only immutable state after construction, so a shared reference can
/// be used from any number of threads.
#[derive(Debug)]
pub struct QueryValidator {
    keywords: KeywordSets,
    patterns: InjectionPatternSet,
    options: DialectOptions,
    max_length: usize,
}

impl QueryValidator {
    /// Create a new query validator.
    pub fn new(
        keywords: KeywordSets,
        patterns: InjectionPatternSet,
        options: DialectOptions,
        max_length: usize,
    ) -> Self {
        Self {
            keywords,
            patterns,
            options,
            max_length,
        }
    }

    /// Build a validator from configuration, failing if any part of it is unusable.
    pub fn from_config(config: &Config) -> Result<Self, GateError> {
        config.validate()?;
        let keywords = KeywordSets::from_config(&config.security.keywords)?;
        let patterns = InjectionPatternSet::compile(&config.security.injection_patterns)?;

        info!(
            "Query validator initialized: {} dangerous keywords, {} injection signatures, max length {} bytes",
            keywords.dangerous_len(),
            patterns.len(),
            config.security.max_query_length
        );

        Ok(Self::new(
            keywords,
            patterns,
            config.dialect,
            config.security.max_query_length,
        ))
    }

    /// Validate a query. Always returns a decision.
    pub fn validate(&self, query: &str) -> Verdict {
        if query.len() > self.max_length {
            return Verdict::rejected(
                ReasonCode::QueryTooLong,
                format!(
                    "Query is {} bytes; the maximum length is {} bytes",
                    query.len(),
                    self.max_length
                ),
            );
        }

        // A fault inside the guards must still produce a rejection.
        catch_unwind(AssertUnwindSafe(|| self.evaluate(query))).unwrap_or_else(|_| {
            Verdict::rejected(ReasonCode::MalformedQuery, "Internal validator fault")
        })
    }

    fn evaluate(&self, query: &str) -> Verdict {
        let outcome = split_statements(scan(query, &self.options));
        let ctx = GuardContext {
            keywords: &self.keywords,
            patterns: &self.patterns,
            options: &self.options,
        };
        let verdict = evaluate(query, &outcome, &ctx);
        if let Verdict::Rejected { reason, .. } = &verdict {
            debug!(
                "Rejected ({}): {}",
                reason,
                truncate_for_log(query, LOG_QUERY_TRUNCATE_LENGTH)
            );
        }
        verdict
    }

    /// Get the dialect options used for scanning.
    pub fn dialect(&self) -> &DialectOptions {
        &self.options
    }
}
