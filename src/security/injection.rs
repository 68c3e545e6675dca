//! SQL injection signature detection.
//!
//! Signatures are checked in order over three views of a query: the raw
//! text, the normalized token text, and the token stream itself. The set is
//! compiled once from configuration.

use super::scanner::{DialectOptions, ScanOutcome, ScanState, Token, TokenKind};
use crate::error::GateError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which rendering of the query a regex signature runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTarget {
    /// The query exactly as submitted.
    Raw,
    /// Significant tokens joined by single spaces, code upper-cased, string
    /// contents replaced by `'?'` and comments removed.
    #[default]
    Normalized,
}

/// Signatures that need the token stream rather than a regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinSignature {
    /// A statement separator inside a comment.
    CommentedSeparator,
    /// A string that ends differently depending on backslash handling.
    AmbiguousEscape,
    /// A comment or quoted token that another dialect would end elsewhere.
    DialectAmbiguity,
    /// An always-true condition after `OR` or a constant comparison after `AND`.
    Tautology,
    /// `UNION SELECT` padding with placeholders or reading a system catalog.
    UnionInjection,
    /// NUL or other non-whitespace control characters.
    ControlCharacters,
}

impl BuiltinSignature {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CommentedSeparator => "commented_separator",
            Self::AmbiguousEscape => "ambiguous_escape",
            Self::DialectAmbiguity => "dialect_ambiguity",
            Self::Tautology => "tautology",
            Self::UnionInjection => "union_injection",
            Self::ControlCharacters => "control_characters",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::CommentedSeparator => "Statement separator concealed in a comment",
            Self::AmbiguousEscape => "String literal ends in an unpaired backslash",
            Self::DialectAmbiguity => "Comment or quoted token whose extent depends on the dialect",
            Self::Tautology => "Always-true boolean condition",
            Self::UnionInjection => "UNION SELECT enumerating columns or system catalogs",
            Self::ControlCharacters => "Control character in query text",
        }
    }
}

/// One configured signature, before compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternSpec {
    Builtin {
        signature: BuiltinSignature,
    },
    Regex {
        name: String,
        pattern: String,
        #[serde(default)]
        target: MatchTarget,
        #[serde(default)]
        description: Option<String>,
    },
}

impl PatternSpec {
    fn regex(name: &str, pattern: &str, target: MatchTarget, description: &str) -> Self {
        Self::Regex {
            name: name.to_string(),
            pattern: pattern.to_string(),
            target,
            description: Some(description.to_string()),
        }
    }
}

/// The default signature list, in evaluation order.
pub fn default_patterns() -> Vec<PatternSpec> {
    use BuiltinSignature::*;
    use MatchTarget::*;

    let mut specs: Vec<PatternSpec> = [
        CommentedSeparator,
        AmbiguousEscape,
        DialectAmbiguity,
        Tautology,
        UnionInjection,
        ControlCharacters,
    ]
    .into_iter()
    .map(|signature| PatternSpec::Builtin { signature })
    .collect();

    specs.extend([
        PatternSpec::regex(
            "char_obfuscation",
            r"(?i)\b(CHAR|CHR)\s*\(\s*\d+\s*\)(\s*(\+|\|\||,)\s*(CHAR|CHR)\s*\(\s*\d+\s*\)){2,}",
            Normalized,
            "Chained CHAR() obfuscation",
        ),
        PatternSpec::regex(
            "hex_payload",
            r"(?i)\b0X[0-9A-F]{16,}\b",
            Normalized,
            "Long hex-encoded literal",
        ),
        PatternSpec::regex(
            "time_delay",
            r"(?i)\b(SLEEP|PG_SLEEP|BENCHMARK)\s*\(|\bWAITFOR\s+(DELAY|TIME)\b",
            Normalized,
            "Time-based blind injection",
        ),
        PatternSpec::regex(
            "external_access",
            r"(?i)\b(LOAD_FILE|OPENROWSET|OPENQUERY|OPENDATASOURCE|XP_CMDSHELL|XP_REG\w*|XP_DIRTREE|SP_OA\w+|DBLINK\w*|LO_IMPORT|LO_EXPORT|PG_READ_FILE|PG_READ_BINARY_FILE)\b",
            Normalized,
            "File, shell or remote server access",
        ),
        PatternSpec::regex(
            "encoded_separator",
            r"(?i)%3B|%00|\\x3B|\\x00|\\u003B|\\u0000",
            Raw,
            "Encoded statement separator or NUL",
        ),
    ]);

    specs
}

/// System catalogs that a `UNION SELECT` injection typically reads.
static SYSTEM_CATALOGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "INFORMATION_SCHEMA",
        "PG_CATALOG",
        "PG_SHADOW",
        "PG_USER",
        "PG_AUTHID",
        "PG_ROLES",
        "SQLITE_MASTER",
        "SQLITE_SCHEMA",
        "MYSQL",
        "SYS",
        "SYSOBJECTS",
        "SYSCOLUMNS",
        "SYSUSERS",
        "SYSLOGINS",
    ]
    .into_iter()
    .collect()
});

/// Text that opens or closes a string, identifier, comment or statement in
/// at least one supported dialect.
const DELIMITER_MARKERS: &[&str] = &[";", "'", "\"", "`", "[", "]", "$", "--", "/*", "*/", "#"];

/// Comparison operators considered by the tautology signature.
const COMPARISON_OPERATORS: &[&str] = &["=", "==", "<>", "!=", "<", ">", "<=", ">="];

#[derive(Debug)]
enum Matcher {
    Builtin(BuiltinSignature),
    Regex { target: MatchTarget, regex: Regex },
}

/// A compiled signature.
#[derive(Debug)]
pub struct InjectionRule {
    name: String,
    description: String,
    matcher: Matcher,
}

impl InjectionRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Ordered, immutable set of compiled injection signatures.
#[derive(Debug)]
pub struct InjectionPatternSet {
    rules: Vec<InjectionRule>,
}

impl InjectionPatternSet {
    /// Compile signature specs, failing on the first invalid regex.
    pub fn compile(specs: &[PatternSpec]) -> Result<Self, GateError> {
        let mut rules = Vec::with_capacity(specs.len());
        let mut seen = HashSet::new();

        for spec in specs {
            let rule = match spec {
                PatternSpec::Builtin { signature } => InjectionRule {
                    name: signature.name().to_string(),
                    description: signature.description().to_string(),
                    matcher: Matcher::Builtin(*signature),
                },
                PatternSpec::Regex {
                    name,
                    pattern,
                    target,
                    description,
                } => {
                    if name.trim().is_empty() {
                        return Err(GateError::config("Injection pattern name cannot be empty"));
                    }
                    let regex =
                        Regex::new(pattern).map_err(|e| GateError::invalid_pattern(name, e))?;
                    InjectionRule {
                        name: name.clone(),
                        description: description.clone().unwrap_or_else(|| name.clone()),
                        matcher: Matcher::Regex {
                            target: *target,
                            regex,
                        },
                    }
                }
            };

            if !seen.insert(rule.name.clone()) {
                return Err(GateError::config(format!(
                    "Duplicate injection pattern name '{}'",
                    rule.name
                )));
            }
            rules.push(rule);
        }

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Return the first signature the query matches, in configured order.
    pub fn check(
        &self,
        raw: &str,
        outcome: &ScanOutcome,
        options: &DialectOptions,
    ) -> Option<&InjectionRule> {
        let needs_normalized = self.rules.iter().any(|r| {
            matches!(
                r.matcher,
                Matcher::Regex {
                    target: MatchTarget::Normalized,
                    ..
                }
            )
        });
        let normalized = if needs_normalized {
            normalized_text(outcome)
        } else {
            String::new()
        };

        self.rules.iter().find(|rule| match &rule.matcher {
            Matcher::Builtin(signature) => builtin_matches(*signature, raw, outcome, options),
            Matcher::Regex { target, regex } => match target {
                MatchTarget::Raw => regex.is_match(raw),
                MatchTarget::Normalized => regex.is_match(&normalized),
            },
        })
    }
}

/// Render the token stream as a single normalized line.
pub fn normalized_text(outcome: &ScanOutcome) -> String {
    let mut out = String::new();
    for (index, span) in outcome.spans.iter().enumerate() {
        if index > 0 {
            push_word(&mut out, ";");
        }
        for token in span.significant() {
            if token.is_string_literal() {
                push_word(&mut out, "'?'");
            } else if token.origin == ScanState::Code {
                push_word(&mut out, &token.text);
            } else {
                push_word(&mut out, &token.text.to_ascii_uppercase());
            }
        }
    }
    out
}

fn push_word(out: &mut String, word: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(word);
}

fn builtin_matches(
    signature: BuiltinSignature,
    raw: &str,
    outcome: &ScanOutcome,
    options: &DialectOptions,
) -> bool {
    match signature {
        BuiltinSignature::CommentedSeparator => outcome
            .tokens()
            .any(|t| t.is_comment() && t.text.contains(';')),
        BuiltinSignature::AmbiguousEscape => {
            !options.backslash_escapes
                && outcome.tokens().any(|t| match t.origin {
                    ScanState::InSingleQuoteString => has_dangling_backslash(&t.text, '\''),
                    ScanState::InDoubleQuoteString => has_dangling_backslash(&t.text, '"'),
                    _ => false,
                })
        }
        BuiltinSignature::DialectAmbiguity => {
            options.reject_ambiguous_syntax && outcome.tokens().any(is_dialect_dependent)
        }
        BuiltinSignature::Tautology => outcome.statements().any(|span| {
            let tokens: Vec<&Token> = span.significant().collect();
            has_tautology(&tokens)
        }),
        BuiltinSignature::UnionInjection => outcome.statements().any(|span| {
            let tokens: Vec<&Token> = span.significant().collect();
            has_union_injection(&tokens)
        }),
        BuiltinSignature::ControlCharacters => raw
            .chars()
            .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\x0C')),
    }
}

/// Whether an odd run of backslashes precedes a quote or the end of `body`.
///
/// A dialect that honors backslash escapes would end the literal somewhere
/// else, so the two readings disagree about what is code.
fn has_dangling_backslash(body: &str, quote: char) -> bool {
    let mut run = 0;
    for c in body.chars() {
        if c == '\\' {
            run += 1;
            continue;
        }
        if c == quote && run % 2 == 1 {
            return true;
        }
        run = 0;
    }
    run % 2 == 1
}

/// Whether another dialect would read this token with a different extent.
///
/// Covers `--x` (code in MySQL), `#` comments (an operator in PostgreSQL),
/// `/*!` and nested block comments, and quoted identifiers or dollar quotes
/// that hide delimiters from dialects without them.
fn is_dialect_dependent(token: &Token) -> bool {
    let text = token.text.as_str();
    match token.origin {
        ScanState::InLineComment if text.starts_with('#') => {
            has_delimiter(text.get(1..).unwrap_or(""))
        }
        ScanState::InLineComment => text
            .get(2..)
            .is_some_and(|rest| rest.starts_with(|c: char| !c.is_whitespace())),
        ScanState::InBlockComment => {
            text.starts_with("/*!")
                || text.starts_with("/*M!")
                || text.get(2..).is_some_and(|body| body.contains("/*"))
        }
        ScanState::InBracketIdentifier
        | ScanState::InBacktickIdentifier
        | ScanState::InDollarQuoteString => has_delimiter(text),
        _ => false,
    }
}

fn has_delimiter(text: &str) -> bool {
    DELIMITER_MARKERS.iter().any(|marker| text.contains(marker))
}

fn is_constant(token: &Token) -> bool {
    token.kind == TokenKind::Literal
}

fn is_comparison(token: &Token) -> bool {
    COMPARISON_OPERATORS.iter().any(|op| token.is_punct(op)) || token.is_word("LIKE")
}

fn has_tautology(tokens: &[&Token]) -> bool {
    for (i, token) in tokens.iter().enumerate() {
        let is_or = token.is_word("OR");
        if !is_or && !token.is_word("AND") {
            continue;
        }

        let mut j = i + 1;
        while tokens.get(j).is_some_and(|t| t.is_punct("(")) {
            j += 1;
        }
        let Some(lhs) = tokens.get(j) else {
            continue;
        };

        if is_or && lhs.is_word("TRUE") {
            return true;
        }

        let (Some(op), Some(rhs)) = (tokens.get(j + 1), tokens.get(j + 2)) else {
            continue;
        };
        if !is_comparison(op) {
            continue;
        }
        if is_constant(lhs) && is_constant(rhs) {
            return true;
        }
        // `OR col = col` holds for every non-null row.
        if is_or
            && op.is_punct("=")
            && lhs.kind == TokenKind::Identifier
            && rhs.kind == TokenKind::Identifier
            && lhs.origin == rhs.origin
            && lhs.text == rhs.text
        {
            return true;
        }
    }
    false
}

fn has_union_injection(tokens: &[&Token]) -> bool {
    for (i, token) in tokens.iter().enumerate() {
        if !token.is_word("UNION") {
            continue;
        }
        let mut j = i + 1;
        if tokens
            .get(j)
            .is_some_and(|t| t.is_word("ALL") || t.is_word("DISTINCT"))
        {
            j += 1;
        }
        if !tokens.get(j).is_some_and(|t| t.is_word("SELECT")) {
            continue;
        }
        let appended = &tokens[j + 1..];

        if is_placeholder_list(appended) {
            return true;
        }
        if appended
            .iter()
            .any(|t| t.is_code_word() && SYSTEM_CATALOGS.contains(t.text.as_str()))
        {
            return true;
        }
    }
    false
}

/// Whether a select list is two or more bare `NULL` or numeric placeholders.
fn is_placeholder_list(tokens: &[&Token]) -> bool {
    let mut items = 0;
    let mut expect_item = true;

    for token in tokens {
        if token.is_word("FROM") || token.is_punct(")") || token.is_word("UNION") {
            break;
        }
        if expect_item {
            if !(token.is_word("NULL") || token.is_number()) {
                return false;
            }
            items += 1;
            expect_item = false;
        } else if token.is_punct(",") {
            expect_item = true;
        } else {
            return false;
        }
    }

    items >= 2 && !expect_item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::scanner::{scan, split_statements};

    fn detector() -> InjectionPatternSet {
        InjectionPatternSet::compile(&default_patterns()).unwrap()
    }

    fn check(query: &str) -> Option<String> {
        check_with(query, &DialectOptions::default())
    }

    fn check_with(query: &str, options: &DialectOptions) -> Option<String> {
        let outcome = split_statements(scan(query, options));
        detector()
            .check(query, &outcome, options)
            .map(|rule| rule.name().to_string())
    }

    #[test]
    fn test_clean_query() {
        assert_eq!(check("SELECT * FROM Users WHERE id = @id"), None);
        assert_eq!(check("SELECT name, email FROM Users"), None);
        assert_eq!(
            check("SELECT a FROM t UNION SELECT b FROM u WHERE x = 1 OR y = 2"),
            None
        );
        assert_eq!(check("SELECT * FROM t WHERE 1=1 AND x = 5"), None);
        assert_eq!(check("SELECT 'OR 1=1' FROM t"), None);
        assert_eq!(check("SELECT 1 -- plain comment"), None);
    }

    #[test]
    fn test_commented_separator() {
        assert_eq!(
            check("SELECT 1 -- ; DROP TABLE users;").as_deref(),
            Some("commented_separator")
        );
        assert_eq!(
            check("SELECT 1 /* ; */ FROM t").as_deref(),
            Some("commented_separator")
        );
    }

    #[test]
    fn test_tautology() {
        assert_eq!(
            check("SELECT * FROM Users WHERE name = '' OR '1'='1'").as_deref(),
            Some("tautology")
        );
        assert_eq!(
            check("SELECT * FROM Users WHERE id = 1 OR 1=1").as_deref(),
            Some("tautology")
        );
        assert_eq!(
            check("SELECT * FROM Users WHERE id = 1 or (2 > 1)").as_deref(),
            Some("tautology")
        );
        assert_eq!(
            check("SELECT * FROM Users WHERE id = 1 AND 1=2").as_deref(),
            Some("tautology")
        );
        assert_eq!(
            check("SELECT * FROM Users WHERE id = 1 OR name = name").as_deref(),
            Some("tautology")
        );
        assert_eq!(
            check("SELECT * FROM Users WHERE active OR TRUE").as_deref(),
            Some("tautology")
        );
    }

    #[test]
    fn test_union_injection() {
        assert_eq!(
            check("SELECT name FROM t WHERE id = 1 UNION SELECT NULL, NULL").as_deref(),
            Some("union_injection")
        );
        assert_eq!(
            check("SELECT a, b FROM t UNION ALL SELECT 1, 2, 3 FROM dual").as_deref(),
            Some("union_injection")
        );
        assert_eq!(
            check("SELECT a FROM t UNION SELECT table_name FROM information_schema.tables")
                .as_deref(),
            Some("union_injection")
        );
        assert_eq!(
            check("SELECT table_name FROM information_schema.tables"),
            None
        );
        assert_eq!(check("SELECT a FROM t UNION SELECT 1 FROM u"), None);
    }

    #[test]
    fn test_ambiguous_escape() {
        assert_eq!(
            check(r"SELECT * FROM t WHERE a = 'x\' OR b = 'y'").as_deref(),
            Some("ambiguous_escape")
        );
        assert_eq!(check(r"SELECT 'a\\'"), None);
        assert_eq!(
            check(r"SELECT 'a\'' ; DROP TABLE t; -- '").as_deref(),
            Some("ambiguous_escape")
        );

        let mysql = DialectOptions::preset("mysql").unwrap();
        assert_eq!(check_with(r"SELECT 'it\'s'", &mysql), None);
    }

    #[test]
    fn test_dialect_ambiguity() {
        for query in [
            "SELECT 1 --x",
            "SELECT 1 # it's",
            "SELECT 1 /*! 50000 */",
            "SELECT 1 /* a /* b */",
            "SELECT [a;b] FROM t",
            "SELECT `a'b` FROM t",
            "SELECT $$;$$",
        ] {
            assert_eq!(
                check(query).as_deref(),
                Some("dialect_ambiguity"),
                "query: {query}"
            );
        }
        assert_eq!(check("SELECT 1 -- note"), None);
        assert_eq!(check("SELECT 1 --"), None);
        assert_eq!(check("SELECT [order], `key`, $$text$$ FROM t # tidy"), None);

        let postgres = DialectOptions::preset("postgres").unwrap();
        assert_eq!(check_with("SELECT 1 --x", &postgres), None);
        assert_eq!(check_with("SELECT $$;$$", &postgres), None);
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(
            check("SELECT 1\0").as_deref(),
            Some("control_characters")
        );
        assert_eq!(check("SELECT\t1\r\n"), None);
    }

    #[test]
    fn test_regex_signatures() {
        assert_eq!(
            check("SELECT CHAR(68)+CHAR(82)+CHAR(79)+CHAR(80)").as_deref(),
            Some("char_obfuscation")
        );
        assert_eq!(
            check("SELECT 0x44524f50205441424c45").as_deref(),
            Some("hex_payload")
        );
        assert_eq!(
            check("SELECT pg_sleep(10)").as_deref(),
            Some("time_delay")
        );
        assert_eq!(
            check("SELECT \"pg_sleep\"(10)").as_deref(),
            Some("time_delay")
        );
        assert_eq!(
            check("SELECT * FROM users WAITFOR DELAY '0:0:5'").as_deref(),
            Some("time_delay")
        );
        assert_eq!(
            check("SELECT LOAD_FILE('/etc/passwd')").as_deref(),
            Some("external_access")
        );
        assert_eq!(
            check("SELECT * FROM t WHERE a = '%3B'").as_deref(),
            Some("encoded_separator")
        );
    }

    #[test]
    fn test_string_contents_do_not_match_normalized_rules() {
        assert_eq!(check("SELECT 'pg_sleep(10)' AS example"), None);
    }

    #[test]
    fn test_normalized_text() {
        let outcome = split_statements(scan(
            "select name /* c */ from t where x = 'abc'; select 2",
            &DialectOptions::default(),
        ));
        assert_eq!(
            normalized_text(&outcome),
            "SELECT NAME FROM T WHERE X = '?' ; SELECT 2"
        );
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let specs = vec![PatternSpec::Regex {
            name: "broken".to_string(),
            pattern: "(".to_string(),
            target: MatchTarget::Raw,
            description: None,
        }];
        let err = InjectionPatternSet::compile(&specs).unwrap_err();
        assert!(matches!(err, GateError::InvalidPattern { .. }));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let specs = vec![
            PatternSpec::Builtin {
                signature: BuiltinSignature::Tautology,
            },
            PatternSpec::Builtin {
                signature: BuiltinSignature::Tautology,
            },
        ];
        assert!(InjectionPatternSet::compile(&specs).is_err());
    }

    #[test]
    fn test_rule_order_is_preserved() {
        let set = detector();
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names.first(), Some(&"commented_separator"));
        assert_eq!(names.last(), Some(&"encoded_separator"));
        assert_eq!(set.len(), 11);
    }

    #[test]
    fn test_pattern_deserialization() {
        let json = r#"[
            {"kind": "builtin", "signature": "tautology"},
            {"kind": "regex", "name": "no_dual", "pattern": "\\bDUAL\\b"}
        ]"#;
        let specs: Vec<PatternSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs.len(), 2);
        let set = InjectionPatternSet::compile(&specs).unwrap();
        let outcome = split_statements(scan("select 1 from dual", &DialectOptions::default()));
        let hit = set.check("select 1 from dual", &outcome, &DialectOptions::default());
        assert_eq!(hit.map(|r| r.name()), Some("no_dual"));
    }
}
