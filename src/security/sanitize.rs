//! Rewrites applied to allowed queries before execution.
//!
//! These run after validation and never change the decision; they only tidy
//! the text and bound the size of the result set.

use super::classifier::{trailing_clause, StatementKind};
use super::scanner::{scan, DialectOptions, RowLimitStyle, Token, TokenKind};
use std::borrow::Cow;

/// Remove comments and collapse whitespace outside string literals.
///
/// Tokens that were adjacent stay adjacent (`COUNT(*)`, `a.b`); tokens that
/// were separated by whitespace or a comment get exactly one space.
pub fn sanitize_query(query: &str, options: &DialectOptions) -> String {
    let mut out = String::with_capacity(query.len());
    let mut last_end: Option<usize> = None;

    for token in scan(query, options).filter(|t| !t.is_comment()) {
        if last_end.is_some_and(|end| token.span.start > end) {
            out.push(' ');
        }
        out.push_str(query.get(token.span.clone()).unwrap_or_default());
        last_end = Some(token.span.end);
    }

    out
}

/// Bound a row-returning query that has no limit clause.
///
/// With [`RowLimitStyle::Limit`] the query gets `LIMIT max_rows` appended, after
/// dropping any trailing separator or comment so the clause stays in code.
/// With [`RowLimitStyle::Top`] the main `SELECT` gets `TOP max_rows`.
pub fn enforce_row_limit<'a>(
    query: &'a str,
    kind: StatementKind,
    max_rows: usize,
    options: &DialectOptions,
) -> Cow<'a, str> {
    if !kind.returns_rows() {
        return Cow::Borrowed(query);
    }

    let tokens: Vec<Token> = scan(query, options).collect();
    let limited = tokens
        .iter()
        .any(|t| t.is_word("LIMIT") || t.is_word("TOP") || t.is_word("FETCH"));
    if limited {
        return Cow::Borrowed(query);
    }

    let code: Vec<&Token> = tokens
        .iter()
        .filter(|t| !t.is_comment() && t.kind != TokenKind::StatementSeparator)
        .collect();

    match options.row_limit {
        RowLimitStyle::Limit => append_limit(query, &code, max_rows),
        RowLimitStyle::Top => insert_top(query, &code, kind, max_rows),
    }
}

fn append_limit<'a>(query: &'a str, code: &[&Token], max_rows: usize) -> Cow<'a, str> {
    let end = code.last().map(|t| t.span.end);
    match end.and_then(|end| query.get(..end)) {
        Some(body) => Cow::Owned(format!("{} LIMIT {}", body, max_rows)),
        None => Cow::Borrowed(query),
    }
}

fn insert_top<'a>(
    query: &'a str,
    code: &[&Token],
    kind: StatementKind,
    max_rows: usize,
) -> Cow<'a, str> {
    let head = match kind {
        StatementKind::Cte => trailing_clause(code),
        _ => Some(0),
    };
    let Some(mut i) = head.filter(|&i| code.get(i).is_some_and(|t| t.is_word("SELECT"))) else {
        return Cow::Borrowed(query);
    };
    while code
        .get(i + 1)
        .is_some_and(|t| t.is_word("DISTINCT") || t.is_word("ALL"))
    {
        i += 1;
    }

    let at = code.get(i).map(|t| t.span.end);
    match at.and_then(|at| Some((query.get(..at)?, query.get(at..)?))) {
        Some((before, after)) => Cow::Owned(format!("{} TOP {}{}", before, max_rows, after)),
        None => Cow::Borrowed(query),
    }
}
