//! sqlgate entry point.
//!
//! Validates queries given on the command line or stdin and prints one JSON
//! audit record per query to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use sqlgate::audit::AuditRecord;
use sqlgate::security::{enforce_row_limit, sanitize_query, DialectOptions};
use sqlgate::{Config, QueryValidator};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sqlgate", version, about = "Validate SQL queries as read-only and injection-free")]
struct Cli {
    /// JSON configuration file (overrides SQLGATE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dialect preset: generic, ansi, postgres, sqlite, mssql, mysql
    #[arg(long)]
    dialect: Option<String>,

    /// Treat each stdin line as a separate query
    #[arg(long)]
    lines: bool,

    /// Include the sanitized, row-limited query for allowed queries
    #[arg(long)]
    rewrite: bool,

    /// Queries to validate; read from stdin when empty
    queries: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    #[serde(flatten)]
    record: AuditRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    rewritten: Option<String>,
}

fn main() -> Result<ExitCode> {
    init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let validator = QueryValidator::from_config(&config).context("Failed to initialize validator")?;

    let queries = if cli.queries.is_empty() {
        read_stdin(cli.lines)?
    } else {
        cli.queries.clone()
    };

    let mut all_allowed = true;
    for query in queries {
        let verdict = validator.validate(&query);
        all_allowed &= verdict.is_allowed();

        let rewritten = match verdict.kind() {
            Some(kind) if cli.rewrite => {
                let sanitized = sanitize_query(&query, validator.dialect());
                Some(
                    enforce_row_limit(
                        &sanitized,
                        kind,
                        config.query.max_result_rows,
                        validator.dialect(),
                    )
                    .into_owned(),
                )
            }
            _ => None,
        };

        let record = AuditRecord::new(query, verdict);
        record.emit();
        println!("{}", serde_json::to_string(&Report { record, rewritten })?);
    }

    Ok(if all_allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::from_env().context("Failed to load configuration from environment")?,
    };

    if let Some(name) = &cli.dialect {
        config.dialect = DialectOptions::preset(name)
            .with_context(|| format!("Unknown dialect '{}'", name))?;
    }

    Ok(config)
}

fn read_stdin(lines: bool) -> Result<Vec<String>> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read queries from stdin")?;

    if lines {
        Ok(input
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    } else {
        Ok(vec![input])
    }
}

/// Initialize tracing subscriber with stderr output.
///
/// Logs MUST go to stderr because stdout carries the JSON reports.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn,sqlgate=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
