//! Single-pass lexical scanner for candidate queries.
//!
//! The scanner walks the query once, left to right, tracking whether the
//! cursor is in code, a quoted string or identifier, or a comment. Everything
//! downstream relies on one property: text inside strings, quoted identifiers
//! and comments never surfaces as a code keyword or a statement separator.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// Options that differ between SQL dialects.
///
/// Backtick-quoted identifiers are recognized in every dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectOptions {
    /// `"` delimits a string literal rather than a quoted identifier.
    pub double_quote_strings: bool,
    /// `#` starts a line comment.
    pub hash_comments: bool,
    /// A backslash escapes the next character inside a quoted string.
    pub backslash_escapes: bool,
    /// `[...]` delimits a quoted identifier.
    pub bracket_identifiers: bool,
    /// `$$...$$` and `$tag$...$tag$` delimit string literals.
    pub dollar_quotes: bool,
    /// Block comments nest.
    pub nested_comments: bool,
    /// MySQL comment rules: `--` needs trailing whitespace, and the bodies of
    /// `/*! ... */` and `/*M! ... */` are code.
    pub mysql_comments: bool,
    /// Reject constructs that different dialects would split differently.
    pub reject_ambiguous_syntax: bool,
    /// Clause used to bound the rows of an unlimited read.
    pub row_limit: RowLimitStyle,
}

/// How a row limit is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowLimitStyle {
    /// `... LIMIT n`
    #[default]
    Limit,
    /// `SELECT TOP n ...`
    Top,
}

impl Default for DialectOptions {
    /// The generic dialect accepts every quoting form and rejects the
    /// constructs whose meaning depends on the dialect.
    fn default() -> Self {
        Self {
            double_quote_strings: false,
            hash_comments: true,
            backslash_escapes: false,
            bracket_identifiers: true,
            dollar_quotes: true,
            nested_comments: false,
            mysql_comments: false,
            reject_ambiguous_syntax: true,
            row_limit: RowLimitStyle::Limit,
        }
    }
}

impl DialectOptions {
    const ANSI: Self = Self {
        double_quote_strings: false,
        hash_comments: false,
        backslash_escapes: false,
        bracket_identifiers: false,
        dollar_quotes: false,
        nested_comments: false,
        mysql_comments: false,
        reject_ambiguous_syntax: false,
        row_limit: RowLimitStyle::Limit,
    };

    /// Look up a named dialect preset.
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "generic" => Some(Self::default()),
            "ansi" => Some(Self::ANSI),
            "postgres" | "postgresql" => Some(Self {
                dollar_quotes: true,
                nested_comments: true,
                ..Self::ANSI
            }),
            "sqlite" => Some(Self {
                bracket_identifiers: true,
                ..Self::ANSI
            }),
            "mssql" | "sqlserver" => Some(Self {
                bracket_identifiers: true,
                nested_comments: true,
                row_limit: RowLimitStyle::Top,
                ..Self::ANSI
            }),
            "mysql" | "mariadb" => Some(Self {
                double_quote_strings: true,
                hash_comments: true,
                backslash_escapes: true,
                mysql_comments: true,
                ..Self::ANSI
            }),
            _ => None,
        }
    }
}

/// Where the scanner cursor currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanState {
    Code,
    InSingleQuoteString,
    InDoubleQuoteString,
    InLineComment,
    InBlockComment,
    InBracketIdentifier,
    InBacktickIdentifier,
    InDollarQuoteString,
}

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// A reserved SQL word in code.
    Keyword,
    /// A bare word in code, or a quoted identifier.
    Identifier,
    /// A number in code, or a string literal.
    Literal,
    /// Operators, parentheses, commas and any other single symbol.
    Punctuation,
    /// A `;` in code.
    StatementSeparator,
    /// A line or block comment.
    Comment,
}

/// A classified span of the query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The state the token was read in. Only `Code` tokens carry semantic weight.
    pub origin: ScanState,
    /// Upper-cased text for code words and numbers; raw contents for quoted
    /// tokens; raw text including markers for comments.
    pub text: String,
    /// Byte range of the token in the query, including quotes and comment markers.
    pub span: Range<usize>,
}

impl Token {
    /// A bare word in code, the only kind of token that may match a keyword.
    pub fn is_code_word(&self) -> bool {
        self.origin == ScanState::Code
            && matches!(self.kind, TokenKind::Keyword | TokenKind::Identifier)
    }

    /// Whether this token is the given code word (`word` must be upper case).
    pub fn is_word(&self, word: &str) -> bool {
        self.is_code_word() && self.text == word
    }

    /// Whether this token is the given punctuation.
    pub fn is_punct(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == symbol
    }

    /// A quoted string literal.
    pub fn is_string_literal(&self) -> bool {
        self.kind == TokenKind::Literal && self.origin != ScanState::Code
    }

    /// A numeric literal.
    pub fn is_number(&self) -> bool {
        self.kind == TokenKind::Literal && self.origin == ScanState::Code
    }

    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }
}

/// Reserved words reported as [`TokenKind::Keyword`]; other bare words are identifiers.
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CALL", "CASE", "CAST",
        "COPY", "CREATE", "CROSS", "DELETE", "DESC", "DESCRIBE", "DISTINCT", "DROP", "ELSE",
        "END", "EXCEPT", "EXEC", "EXECUTE", "EXISTS", "EXPLAIN", "FALSE", "FETCH", "FROM",
        "FULL", "GRANT", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTO",
        "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "MATERIALIZED", "MERGE", "NOT", "NULL",
        "OFFSET", "ON", "OR", "ORDER", "OUTER", "OVER", "PARTITION", "RECURSIVE", "REPLACE",
        "REVOKE", "RIGHT", "SELECT", "SET", "SHOW", "TABLE", "THEN", "TOP", "TRUE",
        "TRUNCATE", "UNION", "UPDATE", "USING", "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
    ]
    .into_iter()
    .collect()
});

/// Operators that are read as a single punctuation token.
const TWO_CHAR_OPERATORS: &[&str] = &["<>", "!=", "<=", ">=", "||", "::", ":=", "=>", "=="];

/// Lazy, single-pass token stream over a query.
///
/// The scanner is not restartable. Calling [`scan`] again on the same text
/// yields the same tokens.
#[derive(Debug)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    state: ScanState,
    options: DialectOptions,
    /// Inside a MySQL `/*! ... */` whose body is code.
    executable_comment: bool,
}

/// Start scanning `text`.
pub fn scan<'a>(text: &'a str, options: &DialectOptions) -> Scanner<'a> {
    Scanner {
        text,
        pos: 0,
        state: ScanState::Code,
        options: *options,
        executable_comment: false,
    }
}

impl<'a> Scanner<'a> {
    /// State the scanner is in. After exhaustion, anything other than `Code`
    /// means a string, quoted identifier or block comment was left open.
    pub fn state(&self) -> ScanState {
        if self.executable_comment && self.state == ScanState::Code {
            ScanState::InBlockComment
        } else {
            self.state
        }
    }

    fn peek(&self) -> Option<char> {
        self.text.get(self.pos..)?.chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.text.get(self.pos..)?.chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn slice(&self, range: Range<usize>) -> &'a str {
        self.text.get(range).unwrap_or("")
    }

    fn token(&self, kind: TokenKind, origin: ScanState, text: String, start: usize) -> Token {
        Token {
            kind,
            origin,
            text,
            span: start..self.pos,
        }
    }

    /// Whether the `--` at the cursor opens a comment.
    fn dash_comment(&self) -> bool {
        !self.options.mysql_comments
            || self
                .peek_nth(1)
                .map_or(true, |c| c.is_whitespace() || c.is_control())
    }

    /// Whether the `/*` just read is a MySQL executable comment opener.
    fn executable_marker(&self) -> bool {
        self.options.mysql_comments
            && (self.peek() == Some('!')
                || (self.peek() == Some('M') && self.peek_nth(1) == Some('!')))
    }

    fn line_comment(&mut self, start: usize) -> Token {
        self.state = ScanState::InLineComment;
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
        // End of input also ends a line comment.
        self.state = ScanState::Code;
        let raw = self.slice(start..self.pos).to_string();
        self.token(TokenKind::Comment, ScanState::InLineComment, raw, start)
    }

    fn block_comment(&mut self, start: usize) -> Token {
        self.state = ScanState::InBlockComment;
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            if c == '*' && self.peek() == Some('/') {
                self.bump();
                depth -= 1;
                if depth == 0 {
                    self.state = ScanState::Code;
                    break;
                }
            } else if c == '/' && self.peek() == Some('*') && self.options.nested_comments {
                self.bump();
                depth += 1;
            }
        }
        let raw = self.slice(start..self.pos).to_string();
        self.token(TokenKind::Comment, ScanState::InBlockComment, raw, start)
    }

    /// Read the `/*!NNNNN` or `/*M!NNNNN` opener; the body that follows is code.
    fn executable_opener(&mut self, start: usize) -> Token {
        if self.peek() == Some('M') {
            self.bump();
        }
        self.bump();
        self.digits();
        self.executable_comment = true;
        let raw = self.slice(start..self.pos).to_string();
        self.token(TokenKind::Punctuation, ScanState::Code, raw, start)
    }

    /// Consume an enclosed body up to `close`, returning the body's byte range.
    ///
    /// A doubled `close` is an escaped delimiter. Leaves `state` set when the
    /// input ends first.
    fn enclosed(&mut self, close: char, state: ScanState, backslash: bool) -> Range<usize> {
        self.state = state;
        let body_start = self.pos;
        let mut body_end = self.text.len();

        while let Some(c) = self.bump() {
            if c == '\\' && backslash {
                self.bump();
                continue;
            }
            if c == close {
                if self.peek() == Some(close) {
                    self.bump();
                    continue;
                }
                body_end = self.pos - close.len_utf8();
                self.state = ScanState::Code;
                break;
            }
        }

        body_start..body_end
    }

    fn quoted(&mut self, start: usize, quote: char, state: ScanState) -> Token {
        let body = self.enclosed(quote, state, self.options.backslash_escapes);
        let body = self.slice(body).to_string();
        let kind = if quote == '\'' || self.options.double_quote_strings {
            TokenKind::Literal
        } else {
            TokenKind::Identifier
        };
        self.token(kind, state, body, start)
    }

    fn quoted_identifier(&mut self, start: usize, close: char, state: ScanState) -> Token {
        let body = self.enclosed(close, state, false);
        let body = self.slice(body).to_string();
        self.token(TokenKind::Identifier, state, body, start)
    }

    /// The tag of a dollar quote opening at the cursor, just past its first `$`.
    fn dollar_tag(&self) -> Option<&'a str> {
        let rest = self.text.get(self.pos..)?;
        let end = rest.find(|c: char| !(c.is_alphanumeric() || c == '_'))?;
        let tag = &rest[..end];
        if tag.starts_with(|c: char| c.is_ascii_digit()) || !rest[end..].starts_with('$') {
            return None;
        }
        Some(tag)
    }

    fn dollar_quoted(&mut self, start: usize, tag: &str) -> Token {
        self.pos += tag.len() + 1;
        self.state = ScanState::InDollarQuoteString;
        let delimiter = format!("${}$", tag);
        let rest = self.slice(self.pos..self.text.len());

        let body = match rest.find(&delimiter) {
            Some(offset) => {
                self.pos += offset + delimiter.len();
                self.state = ScanState::Code;
                &rest[..offset]
            }
            None => {
                self.pos = self.text.len();
                rest
            }
        };
        self.token(
            TokenKind::Literal,
            ScanState::InDollarQuoteString,
            body.to_string(),
            start,
        )
    }

    fn word(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        let upper = self.slice(start..self.pos).to_ascii_uppercase();
        let kind = if RESERVED_WORDS.contains(upper.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.token(kind, ScanState::Code, upper, start)
    }

    fn number(&mut self, start: usize, first: char) -> Token {
        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
        } else {
            self.digits();
            if first != '.' && self.peek() == Some('.') {
                self.bump();
                self.digits();
            }
            if matches!(self.peek(), Some('e' | 'E')) {
                let exponent = match self.peek_nth(1) {
                    Some('+' | '-') => self.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                    Some(c) => c.is_ascii_digit(),
                    None => false,
                };
                if exponent {
                    self.bump();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.bump();
                    }
                    self.digits();
                }
            }
        }
        let upper = self.slice(start..self.pos).to_ascii_uppercase();
        self.token(TokenKind::Literal, ScanState::Code, upper, start)
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn punctuation(&mut self, start: usize) -> Token {
        if let Some(next) = self.peek() {
            let pair_end = self.pos + next.len_utf8();
            let pair = self.slice(start..pair_end);
            if TWO_CHAR_OPERATORS.contains(&pair) {
                self.bump();
            }
        }
        let raw = self.slice(start..self.pos).to_string();
        self.token(TokenKind::Punctuation, ScanState::Code, raw, start)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let start = self.pos;
            let c = self.bump()?;

            let token = match c {
                c if c.is_whitespace() => continue,
                '-' if self.peek() == Some('-') && self.dash_comment() => self.line_comment(start),
                '#' if self.options.hash_comments => self.line_comment(start),
                '/' if self.peek() == Some('*') => {
                    self.bump();
                    if self.executable_marker() {
                        self.executable_opener(start)
                    } else {
                        self.block_comment(start)
                    }
                }
                '*' if self.executable_comment && self.peek() == Some('/') => {
                    self.bump();
                    self.executable_comment = false;
                    self.token(TokenKind::Punctuation, ScanState::Code, "*/".to_string(), start)
                }
                '\'' => self.quoted(start, '\'', ScanState::InSingleQuoteString),
                '"' => self.quoted(start, '"', ScanState::InDoubleQuoteString),
                '`' => self.quoted_identifier(start, '`', ScanState::InBacktickIdentifier),
                '[' if self.options.bracket_identifiers => {
                    self.quoted_identifier(start, ']', ScanState::InBracketIdentifier)
                }
                '$' if self.options.dollar_quotes => match self.dollar_tag() {
                    Some(tag) => self.dollar_quoted(start, tag),
                    None => self.punctuation(start),
                },
                ';' => self.token(
                    TokenKind::StatementSeparator,
                    ScanState::Code,
                    ";".to_string(),
                    start,
                ),
                c if c.is_ascii_digit() => self.number(start, c),
                '.' if self.peek().is_some_and(|n| n.is_ascii_digit()) => self.number(start, c),
                c if c.is_alphabetic() || c == '_' => self.word(start),
                _ => self.punctuation(start),
            };
            return Some(token);
        }
    }
}

/// One candidate statement: the tokens between two separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementSpan {
    pub tokens: Vec<Token>,
}

impl StatementSpan {
    /// Tokens with comments removed.
    pub fn significant(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(|t| !t.is_comment())
    }

    /// Whether the span holds nothing but comments.
    pub fn is_empty(&self) -> bool {
        self.significant().next().is_none()
    }
}

/// Everything one pass of the scanner produced.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Statement spans in order, including comment-only spans.
    pub spans: Vec<StatementSpan>,
    /// Scanner state at end of input.
    pub final_state: ScanState,
}

impl ScanOutcome {
    /// Spans that contain at least one non-comment token.
    pub fn statements(&self) -> impl Iterator<Item = &StatementSpan> + '_ {
        self.spans.iter().filter(|s| !s.is_empty())
    }

    /// All tokens, separators excluded, across every span.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.spans.iter().flat_map(|s| s.tokens.iter())
    }

    /// Whether the scanner finished outside any string or comment.
    pub fn is_terminated(&self) -> bool {
        self.final_state == ScanState::Code
    }
}

/// Drain a scanner, grouping its tokens into statement spans.
pub fn split_statements(mut scanner: Scanner<'_>) -> ScanOutcome {
    let mut spans = Vec::new();
    let mut current = StatementSpan::default();

    for token in scanner.by_ref() {
        if token.kind == TokenKind::StatementSeparator {
            spans.push(std::mem::take(&mut current));
        } else {
            current.tokens.push(token);
        }
    }
    if !current.tokens.is_empty() {
        spans.push(current);
    }

    ScanOutcome {
        spans,
        final_state: scanner.state(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<Token> {
        scan(text, &DialectOptions::default()).collect()
    }

    fn texts(text: &str) -> Vec<String> {
        tokens(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_words_are_upper_cased() {
        assert_eq!(texts("select id from Users"), ["SELECT", "ID", "FROM", "USERS"]);
        let toks = tokens("select update_date");
        assert_eq!(toks[0].kind, TokenKind::Keyword);
        assert_eq!(toks[1].kind, TokenKind::Identifier);
        assert_eq!(toks[1].text, "UPDATE_DATE");
    }

    #[test]
    fn test_string_contents_are_opaque() {
        let toks = tokens("SELECT 'DROP TABLE x; --'");
        assert_eq!(toks.len(), 2);
        assert!(toks[1].is_string_literal());
        assert_eq!(toks[1].text, "DROP TABLE x; --");
        assert!(!toks[1].is_code_word());
    }

    #[test]
    fn test_doubled_quote_does_not_end_string() {
        let mut scanner = scan("SELECT 'it''s; DROP' AS x", &DialectOptions::default());
        let toks: Vec<Token> = scanner.by_ref().collect();
        assert_eq!(toks[1].text, "it''s; DROP");
        assert!(toks[2].is_word("AS"));
        assert_eq!(scanner.state(), ScanState::Code);
    }

    #[test]
    fn test_unterminated_string_leaves_state_open() {
        let mut scanner = scan("SELECT * FROM t WHERE name = 'abc", &DialectOptions::default());
        let last = scanner.by_ref().last();
        assert_eq!(scanner.state(), ScanState::InSingleQuoteString);
        assert_eq!(last.map(|t| t.text), Some("abc".to_string()));
    }

    #[test]
    fn test_unterminated_block_comment_leaves_state_open() {
        let mut scanner = scan("SELECT 1 /* never closed", &DialectOptions::default());
        scanner.by_ref().for_each(drop);
        assert_eq!(scanner.state(), ScanState::InBlockComment);
    }

    #[test]
    fn test_line_comment_ends_at_newline_or_input_end() {
        let toks = tokens("SELECT 1 -- note; here\nFROM t # trailing");
        let kinds: Vec<TokenKind> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Keyword,
                TokenKind::Literal,
                TokenKind::Comment,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Comment,
            ]
        );
        let mut scanner = scan("SELECT 1 -- open", &DialectOptions::default());
        scanner.by_ref().for_each(drop);
        assert_eq!(scanner.state(), ScanState::Code);
    }

    #[test]
    fn test_hash_comment_is_dialect_dependent() {
        let ansi = DialectOptions::preset("postgres").unwrap();
        let toks: Vec<Token> = scan("SELECT a # b", &ansi).collect();
        assert!(toks.iter().all(|t| !t.is_comment()));
        assert!(tokens("SELECT a # b").iter().any(|t| t.is_comment()));
    }

    #[test]
    fn test_block_comments_do_not_nest() {
        let toks = tokens("/* a /* b */ SELECT 1 */");
        assert!(toks[0].is_comment());
        assert!(toks[1].is_word("SELECT"));
        assert!(toks.last().unwrap().is_punct("/"));
    }

    #[test]
    fn test_double_quotes_by_dialect() {
        let toks = tokens(r#"SELECT "DELETE" FROM t"#);
        assert_eq!(toks[1].kind, TokenKind::Identifier);
        assert_eq!(toks[1].origin, ScanState::InDoubleQuoteString);
        assert!(!toks[1].is_code_word());

        let mysql = DialectOptions::preset("mysql").unwrap();
        let toks: Vec<Token> = scan(r#"SELECT "a;b""#, &mysql).collect();
        assert!(toks[1].is_string_literal());
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn test_backslash_escapes_by_dialect() {
        let query = r"SELECT 'a\'; DROP TABLE t; -- '";
        let mysql = DialectOptions::preset("mysql").unwrap();
        let toks: Vec<Token> = scan(query, &mysql).collect();
        assert_eq!(toks.len(), 2);

        let toks = tokens(query);
        assert_eq!(toks[1].text, r"a\");
        assert!(toks.iter().any(|t| t.kind == TokenKind::StatementSeparator));
    }

    #[test]
    fn test_numbers_and_operators() {
        assert_eq!(texts("1.5e-3>=0x1f"), ["1.5E-3", ">=", "0X1F"]);
        assert_eq!(texts("a<>b"), ["A", "<>", "B"]);
        assert_eq!(texts("1delete"), ["1", "DELETE"]);
        assert_eq!(texts("1e"), ["1", "E"]);
    }

    #[test]
    fn test_spans_point_into_source() {
        let query = "SELECT name FROM \"My Table\"";
        for token in tokens(query) {
            assert!(query.get(token.span.clone()).is_some());
        }
        let toks = tokens(query);
        assert_eq!(&query[toks[3].span.clone()], "\"My Table\"");
    }

    #[test]
    fn test_unicode_whitespace_splits_words() {
        assert_eq!(texts("DROP\u{a0}TABLE"), ["DROP", "TABLE"]);
        assert_eq!(texts("SELECT café"), ["SELECT", "CAFé"]);
    }

    #[test]
    fn test_split_statements() {
        let outcome = split_statements(scan("SELECT 1; SELECT 2;", &DialectOptions::default()));
        assert_eq!(outcome.statements().count(), 2);
        assert!(outcome.is_terminated());

        let outcome = split_statements(scan("SELECT ';' ; -- done", &DialectOptions::default()));
        assert_eq!(outcome.statements().count(), 1);
        assert_eq!(outcome.spans.len(), 2);

        let outcome = split_statements(scan("SELECT 1;;", &DialectOptions::default()));
        assert_eq!(outcome.statements().count(), 1);

        let outcome = split_statements(scan("   ", &DialectOptions::default()));
        assert_eq!(outcome.statements().count(), 0);
    }

    #[test]
    fn test_dialect_presets() {
        assert_eq!(DialectOptions::preset("GENERIC"), Some(DialectOptions::default()));
        assert!(DialectOptions::preset("mariadb").unwrap().backslash_escapes);
        assert!(DialectOptions::preset("oracle-ish").is_none());

        let mssql = DialectOptions::preset("sqlserver").unwrap();
        assert!(mssql.bracket_identifiers && mssql.nested_comments);
        assert_eq!(mssql.row_limit, RowLimitStyle::Top);
        assert!(DialectOptions::preset("postgresql").unwrap().dollar_quotes);
        assert!(!DialectOptions::preset("ansi").unwrap().reject_ambiguous_syntax);
    }

    fn tokens_with(text: &str, preset: &str) -> Vec<Token> {
        let options = DialectOptions::preset(preset).unwrap();
        scan(text, &options).collect()
    }

    #[test]
    fn test_bracket_identifiers_are_opaque() {
        let toks = tokens_with("SELECT [a'], x FROM t; DELETE FROM t --']", "mssql");
        assert_eq!(toks[1].origin, ScanState::InBracketIdentifier);
        assert_eq!(toks[1].text, "a'");
        assert!(toks.iter().any(|t| t.kind == TokenKind::StatementSeparator));

        let toks = tokens_with("SELECT [a]]b]", "sqlite");
        assert_eq!(toks[1].text, "a]]b");
        assert_eq!(toks.len(), 2);

        // Without bracket quoting, `[` is an ordinary symbol.
        let toks = tokens_with("SELECT arr[1]", "postgres");
        assert!(toks[2].is_punct("["));
    }

    #[test]
    fn test_backtick_identifiers_are_opaque_everywhere() {
        for preset in ["generic", "ansi", "postgres", "sqlite", "mssql", "mysql"] {
            let toks = tokens_with("SELECT `a'`, x FROM t; DELETE FROM t -- '", preset);
            assert_eq!(toks[1].origin, ScanState::InBacktickIdentifier, "{preset}");
            assert!(!toks[1].is_code_word());
            assert!(
                toks.iter().any(|t| t.kind == TokenKind::StatementSeparator),
                "{preset}"
            );
        }
    }

    #[test]
    fn test_dollar_quotes() {
        let toks = tokens_with("SELECT $$'$$; DELETE FROM t; --'", "postgres");
        assert!(toks[1].is_string_literal());
        assert_eq!(toks[1].origin, ScanState::InDollarQuoteString);
        assert_eq!(toks[1].text, "'");
        assert_eq!(toks[2].kind, TokenKind::StatementSeparator);

        let toks = tokens_with("SELECT $fn$ it's $$ nested $fn$ AS body", "postgres");
        assert_eq!(toks[1].text, " it's $$ nested ");
        assert!(toks[2].is_word("AS"));

        // Positional parameters are not quotes.
        let toks = tokens_with("SELECT $1", "postgres");
        assert!(toks[1].is_punct("$"));

        let mut scanner = scan("SELECT $x$ open", &DialectOptions::preset("postgres").unwrap());
        scanner.by_ref().for_each(drop);
        assert_eq!(scanner.state(), ScanState::InDollarQuoteString);
    }

    #[test]
    fn test_unterminated_quoted_identifier_leaves_state_open() {
        let mut scanner = scan("SELECT [name FROM t", &DialectOptions::default());
        scanner.by_ref().for_each(drop);
        assert_eq!(scanner.state(), ScanState::InBracketIdentifier);

        let mut scanner = scan("SELECT `name FROM t", &DialectOptions::default());
        scanner.by_ref().for_each(drop);
        assert_eq!(scanner.state(), ScanState::InBacktickIdentifier);
    }

    #[test]
    fn test_nested_block_comments() {
        let toks = tokens_with("SELECT 1 /* a /* b */ ' */ ; DELETE FROM t; -- '", "postgres");
        assert!(toks[2].is_comment());
        assert_eq!(toks[3].kind, TokenKind::StatementSeparator);
        assert!(toks[4].is_word("DELETE"));

        let mut scanner = scan("SELECT 1 /* a /* b */", &DialectOptions::preset("mssql").unwrap());
        scanner.by_ref().for_each(drop);
        assert_eq!(scanner.state(), ScanState::InBlockComment);
    }

    #[test]
    fn test_mysql_dash_needs_whitespace() {
        let toks = tokens_with("SELECT 1 --(SELECT 1) INTO OUTFILE '/tmp/x'", "mysql");
        assert!(toks.iter().all(|t| !t.is_comment()));
        assert!(toks.iter().any(|t| t.is_word("INTO")));

        let toks = tokens_with("SELECT 1 -- note\nFROM t", "mysql");
        assert!(toks[2].is_comment());
        let toks = tokens_with("SELECT 1 --\tnote", "mysql");
        assert!(toks[2].is_comment());
        let toks = tokens_with("SELECT 1 --", "mysql");
        assert!(toks[2].is_comment());
    }

    #[test]
    fn test_mysql_executable_comments_are_code() {
        let mysql = DialectOptions::preset("mysql").unwrap();
        let mut scanner = scan("SELECT * FROM users /*!50000 INTO OUTFILE '/tmp/x' */", &mysql);
        let toks: Vec<Token> = scanner.by_ref().collect();
        assert!(toks[4].is_punct("/*!50000"));
        assert!(toks[5].is_word("INTO"));
        assert!(toks.last().is_some_and(|t| t.is_punct("*/")));
        assert_eq!(scanner.state(), ScanState::Code);

        let toks = tokens_with("SELECT 1 /*M! ; DROP TABLE t */", "mariadb");
        assert!(toks.iter().any(|t| t.kind == TokenKind::StatementSeparator));

        let mut scanner = scan("SELECT 1 /*! INTO", &mysql);
        scanner.by_ref().for_each(drop);
        assert_eq!(scanner.state(), ScanState::InBlockComment);

        // Elsewhere the same text is an ordinary comment.
        let toks = tokens_with("SELECT 1 /*! INTO */", "ansi");
        assert!(toks[2].is_comment());
    }
}
