//! Centralized constants for the query gate.
//!
//! This module contains the default limits and keyword lists used throughout
//! the codebase, making them easy to find, understand, and modify.

// =============================================================================
// Size Limits
// =============================================================================

/// Default maximum query length in bytes.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 100_000;

/// Default maximum rows appended as a `LIMIT` to unbounded reads.
pub const DEFAULT_MAX_RESULT_ROWS: usize = 100;

// =============================================================================
// Keyword Defaults
// =============================================================================

/// Leading keywords of read-only statements.
pub const DEFAULT_SAFE_KEYWORDS: &[&str] = &["SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

/// Keywords that indicate a write, DDL, permission or server-control operation.
pub const DEFAULT_DANGEROUS_KEYWORDS: &[&str] = &[
    // DML
    "INSERT",
    "UPDATE",
    "DELETE",
    "MERGE",
    "REPLACE",
    "UPSERT",
    "INTO",
    // DDL
    "DROP",
    "CREATE",
    "ALTER",
    "TRUNCATE",
    "RENAME",
    // Permissions
    "GRANT",
    "REVOKE",
    // Procedure execution
    "EXEC",
    "EXECUTE",
    "CALL",
    // Bulk and file operations
    "COPY",
    "LOAD",
    "ATTACH",
    "DETACH",
    // Session and engine state
    "PRAGMA",
    "VACUUM",
    "SET",
    "LOCK",
    "UNLOCK",
    "HANDLER",
    // Server control
    "KILL",
    "SHUTDOWN",
    "BACKUP",
    "RESTORE",
    "DBCC",
    "RECONFIGURE",
];

// =============================================================================
// Logging Constants
// =============================================================================

/// Default truncation length for query logging.
pub const LOG_QUERY_TRUNCATE_LENGTH: usize = 100;

/// Extended truncation length for detailed logging.
pub const LOG_QUERY_EXTENDED_TRUNCATE_LENGTH: usize = 500;

// =============================================================================
// Environment Variables
// =============================================================================

/// Path to a JSON configuration file.
pub const ENV_CONFIG_PATH: &str = "SQLGATE_CONFIG";

/// Dialect preset name.
pub const ENV_DIALECT: &str = "SQLGATE_DIALECT";

/// Maximum query length override.
pub const ENV_MAX_QUERY_LENGTH: &str = "SQLGATE_MAX_QUERY_LENGTH";

/// Maximum result rows override.
pub const ENV_MAX_ROWS: &str = "SQLGATE_MAX_ROWS";

/// Write-permission flag. Setting it to true is a startup error.
pub const ENV_ALLOW_WRITE: &str = "SQLGATE_ALLOW_WRITE";
