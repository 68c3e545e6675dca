//! Statement classification by leading keyword.

use super::keywords::KeywordSets;
use super::scanner::{StatementSpan, Token, TokenKind};
use serde::{Deserialize, Serialize};

/// Kind of a single SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    /// `WITH ... SELECT`
    Cte,
    Show,
    /// `DESCRIBE`, `DESC` and `EXPLAIN`
    Describe,
    Other,
}

impl StatementKind {
    /// Check if this is a read-only statement kind.
    pub fn is_read(&self) -> bool {
        !matches!(self, StatementKind::Other)
    }

    /// Check if rows come back from a table scan, so a row limit applies.
    pub fn returns_rows(&self) -> bool {
        matches!(self, StatementKind::Select | StatementKind::Cte)
    }
}

/// Classify one statement by its first significant token.
///
/// A `WITH` statement is only a `Cte` if the clause after its named
/// subqueries is itself a `SELECT`.
pub fn classify(span: &StatementSpan, keywords: &KeywordSets) -> StatementKind {
    let tokens: Vec<&Token> = span.significant().collect();
    let Some(first) = tokens.first() else {
        return StatementKind::Other;
    };
    if !first.is_code_word() {
        return StatementKind::Other;
    }

    match keywords.safe_kind(&first.text) {
        Some(StatementKind::Cte) => match trailing_clause(&tokens).and_then(|i| tokens.get(i)) {
            Some(head) if head.is_word("SELECT") => StatementKind::Cte,
            _ => StatementKind::Other,
        },
        Some(kind) => kind,
        None => StatementKind::Other,
    }
}

/// Find the head of the clause that follows the CTE list of a `WITH` statement.
///
/// Walks `WITH [RECURSIVE] name [(cols)] AS [NOT] [MATERIALIZED] (body) [, ...]`
/// and returns the index of the first token after the last body, skipping any
/// opening parentheses around it.
pub(super) fn trailing_clause(tokens: &[&Token]) -> Option<usize> {
    let mut i = 1;
    if tokens.get(i)?.is_word("RECURSIVE") {
        i += 1;
    }

    loop {
        let name = tokens.get(i)?;
        if !matches!(name.kind, TokenKind::Identifier | TokenKind::Keyword) || name.is_word("AS") {
            return None;
        }
        i += 1;

        if tokens.get(i)?.is_punct("(") {
            i = skip_group(tokens, i)?;
        }
        if !tokens.get(i)?.is_word("AS") {
            return None;
        }
        i += 1;
        if tokens.get(i)?.is_word("NOT") {
            i += 1;
        }
        if tokens.get(i)?.is_word("MATERIALIZED") {
            i += 1;
        }
        if !tokens.get(i)?.is_punct("(") {
            return None;
        }
        i = skip_group(tokens, i)?;

        if tokens.get(i)?.is_punct(",") {
            i += 1;
            continue;
        }
        break;
    }

    while tokens.get(i)?.is_punct("(") {
        i += 1;
    }
    Some(i)
}

/// Given the index of an opening parenthesis, return the index just past its match.
fn skip_group(tokens: &[&Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens.get(open..)?.iter().enumerate() {
        if token.is_punct("(") {
            depth += 1;
        } else if token.is_punct(")") {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(open + offset + 1);
            }
        }
    }
    None
}
