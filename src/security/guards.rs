//! Keyword and structural guards.
//!
//! Rules are applied in a fixed order and the first match decides. Structural
//! findings are reported before keyword findings.

use super::classifier::classify;
use super::injection::InjectionPatternSet;
use super::keywords::KeywordSets;
use super::scanner::{DialectOptions, ScanOutcome, ScanState, StatementSpan, Token};
use super::validation::{ReasonCode, Verdict};

/// Everything the guards consult besides the query itself.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    pub keywords: &'a KeywordSets,
    pub patterns: &'a InjectionPatternSet,
    pub options: &'a DialectOptions,
}

/// Decide a scanned query.
pub fn evaluate(query: &str, outcome: &ScanOutcome, ctx: &GuardContext<'_>) -> Verdict {
    let statements: Vec<&StatementSpan> = outcome.statements().collect();

    if statements.len() > 1 {
        return Verdict::rejected(
            ReasonCode::MultipleStatementsDetected,
            format!(
                "Query contains {} statements; only a single statement is allowed",
                statements.len()
            ),
        );
    }

    if let Some(detail) = malformation(outcome) {
        return Verdict::rejected(ReasonCode::MalformedQuery, detail);
    }
    let Some(statement) = statements.first() else {
        return Verdict::rejected(ReasonCode::MalformedQuery, "Query contains no statement");
    };

    if let Some(rule) = ctx.patterns.check(query, outcome, ctx.options) {
        return Verdict::rejected(
            ReasonCode::InjectionPatternDetected,
            format!("{} ({})", rule.description(), rule.name()),
        );
    }

    if let Some(token) = first_dangerous(outcome, ctx.keywords) {
        return Verdict::rejected(
            ReasonCode::WriteOperationDetected,
            format!("Query contains forbidden operation: {}", token.text),
        );
    }

    match classify(statement, ctx.keywords) {
        kind if kind.is_read() => Verdict::Allowed { kind },
        _ => Verdict::rejected(
            ReasonCode::UnknownStatementType,
            unknown_statement_detail(statement, ctx.keywords),
        ),
    }
}

fn malformation(outcome: &ScanOutcome) -> Option<&'static str> {
    match outcome.final_state {
        ScanState::Code | ScanState::InLineComment => None,
        ScanState::InSingleQuoteString => Some("Unterminated string literal"),
        ScanState::InDoubleQuoteString => Some("Unterminated double-quoted string or identifier"),
        ScanState::InBlockComment => Some("Unterminated block comment"),
        ScanState::InBracketIdentifier => Some("Unterminated bracketed identifier"),
        ScanState::InBacktickIdentifier => Some("Unterminated backtick identifier"),
        ScanState::InDollarQuoteString => Some("Unterminated dollar-quoted string"),
    }
}

/// First code word, in any span, that is a dangerous keyword.
fn first_dangerous<'a>(outcome: &'a ScanOutcome, keywords: &KeywordSets) -> Option<&'a Token> {
    outcome
        .tokens()
        .find(|t| t.is_code_word() && keywords.is_dangerous(&t.text))
}

fn unknown_statement_detail(statement: &StatementSpan, keywords: &KeywordSets) -> String {
    let lead = statement.significant().next();
    match lead {
        Some(token) if token.is_code_word() && keywords.safe_kind(&token.text).is_some() => {
            format!("{} statement does not end in a SELECT", token.text)
        }
        _ => "Query must start with SELECT, WITH, SHOW, DESCRIBE, or EXPLAIN".to_string(),
    }
}
