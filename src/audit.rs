//! Audit records for validation decisions.
//!
//! The validator itself has no side effects. The execution layer builds an
//! [`AuditRecord`] for every query it was asked to run and emits it whether or
//! not the query was allowed.

use crate::constants::LOG_QUERY_EXTENDED_TRUNCATE_LENGTH;
use crate::security::Verdict;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// One audited decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// Unique record identifier
    pub id: Uuid,
    /// When the decision was recorded
    pub timestamp: DateTime<Utc>,
    /// The query exactly as submitted
    pub query: String,
    /// The decision
    pub verdict: Verdict,
}

impl AuditRecord {
    /// Create a record stamped with the current time.
    pub fn new(query: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query: query.into(),
            verdict,
        }
    }

    /// Write the record to the log.
    pub fn emit(&self) {
        let query = truncate_for_log(&self.query, LOG_QUERY_EXTENDED_TRUNCATE_LENGTH);
        match &self.verdict {
            Verdict::Allowed { kind } => {
                info!(audit_id = %self.id, kind = ?kind, "Query allowed: {}", query);
            }
            Verdict::Rejected { reason, detail } => {
                warn!(
                    audit_id = %self.id,
                    reason = %reason,
                    detail = %detail,
                    "Query rejected: {}",
                    query
                );
            }
        }
    }
}

/// Truncate a string for logging purposes.
pub fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
