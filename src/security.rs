//! Security module: read-only query validation and SQL injection prevention.

mod classifier;
mod guards;
mod injection;
mod keywords;
mod sanitize;
mod scanner;
mod validation;

pub use classifier::{classify, StatementKind};
pub use guards::{evaluate, GuardContext};
pub use injection::{
    default_patterns, normalized_text, BuiltinSignature, InjectionPatternSet, InjectionRule,
    MatchTarget, PatternSpec,
};
pub use keywords::KeywordSets;
pub use sanitize::{enforce_row_limit, sanitize_query};
pub use scanner::{
    scan, split_statements, DialectOptions, RowLimitStyle, ScanOutcome, ScanState, Scanner,
    StatementSpan, Token, TokenKind,
};
pub use validation::{QueryValidator, ReasonCode, Verdict};
