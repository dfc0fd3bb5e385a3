//! # Signature Lexer
//!
//! A small SQL tokenizer used for two cheap, parse-free jobs:
//!
//! - [`signature`] normalizes a statement into its structural shape, so that
//!   `select * from t where a = 1` and `SELECT * FROM t WHERE a = 42` share one
//!   signature (`select * from t where a = ?`).
//! - [`statement_kind`] classifies a statement by its leading keyword.
//!
//! Normalization lower-cases keywords and identifiers, replaces literals with
//! `?`, collapses `IN` lists to `in ( ... )`, and drops comments, whitespace
//! and trailing semicolons. Characters the lexer does not know are kept verbatim.

use logos::{Lexer, Logos, Skip};
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Default, Error, PartialEq, Clone)]
pub enum LexerError {
    #[error("Unknown token")]
    #[default]
    UnknownToken,
    #[error("Unterminated string literal")]
    UnterminatedString,
}

fn ident(lex: &mut Lexer<TokenKind>) -> Option<String> {
    Some(lex.slice().to_ascii_lowercase())
}

fn quoted_ident(lex: &mut Lexer<TokenKind>) -> Option<String> {
    let slice = lex.slice();
    Some(slice[1..slice.len() - 1].to_ascii_lowercase())
}

fn block_comment(lex: &mut Lexer<TokenKind>) -> Skip {
    let rest = lex.remainder();
    // An unclosed comment runs to the end of the input.
    let end = rest.find("*/").map_or(rest.len(), |at| at + 2);
    lex.bump(end);
    Skip
}

fn unterminated(_: &mut Lexer<TokenKind>) -> Result<(), LexerError> {
    Err(LexerError::UnterminatedString)
}

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(error = LexerError)]
pub enum TokenKind {
    #[regex(r"[ \r\n\t\f]+", logos::skip)]
    #[regex(r"--[^\n]*", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    #[token("/*", block_comment)]
    Ignored,

    #[token("SELECT", ignore(ascii_case))]
    Select,
    #[token("WITH", ignore(ascii_case))]
    With,
    #[token("INSERT", ignore(ascii_case))]
    Insert,
    #[token("REPLACE", ignore(ascii_case))]
    Replace,
    #[token("UPDATE", ignore(ascii_case))]
    Update,
    #[token("DELETE", ignore(ascii_case))]
    Delete,
    #[token("IN", ignore(ascii_case))]
    In,

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F]+")]
    Number,
    #[regex(r"'([^'\\]|\\.)*'")]
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    #[token("?")]
    Placeholder,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*", ident)]
    #[regex(r"`[^`]*`", quoted_ident)]
    Ident(String),
    #[regex(r"@@?[a-zA-Z0-9_.$]+", ident)]
    Variable(String),

    #[token("=")]
    Eq,
    #[token("<>")]
    #[token("!=")]
    NotEq,
    #[token("<=>")]
    NullSafeEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(";")]
    Semi,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[regex(r"'[^']*", unterminated)]
    UnterminatedString,
}

/// The statement families the advisor distinguishes. Only selects contribute to workload cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

/// Classifies a statement by its first keyword, skipping opening parentheses
/// (`(select ...) union (select ...)` is a select).
pub fn statement_kind(sql: &str) -> StatementKind {
    let first = TokenKind::lexer(sql).find(|token| token != &Ok(TokenKind::LParen));

    match first {
        Some(Ok(TokenKind::Select)) | Some(Ok(TokenKind::With)) => StatementKind::Select,
        Some(Ok(TokenKind::Insert)) | Some(Ok(TokenKind::Replace)) => StatementKind::Insert,
        Some(Ok(TokenKind::Update)) => StatementKind::Update,
        Some(Ok(TokenKind::Delete)) => StatementKind::Delete,
        _ => StatementKind::Other,
    }
}

/// Structural shape of a statement with literal values elided.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Shrinkwrap)]
pub struct Signature(String);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Words after which a `-` is a sign rather than a subtraction.
const SIGN_CONTEXT: &[&str] = &[
    "=", "<>", "!=", "<=>", "<", "<=", ">", ">=", "(", ",", "and", "or", "not", "between",
    "select", "where", "values", "then", "else", "when", "limit", "in",
];

const PLACEHOLDER: &str = "?";

/// Normalizes `sql` into its [`Signature`].
pub fn signature(sql: &str) -> Signature {
    let mut words: Vec<String> = Vec::new();
    let mut lexer = TokenKind::lexer(sql);

    while let Some(token) = lexer.next() {
        let word = match token {
            Ok(TokenKind::Number) | Ok(TokenKind::Str) | Ok(TokenKind::Placeholder) => {
                // Fold a leading sign into the literal: `a = -1` has the shape of `a = 1`.
                if is_sign(&words) {
                    words.pop();
                }
                PLACEHOLDER.to_string()
            }
            Ok(TokenKind::Ident(name)) | Ok(TokenKind::Variable(name)) => name,
            Ok(_) => lexer.slice().to_ascii_lowercase(),
            Err(_) => lexer.slice().to_string(),
        };
        words.push(word);
    }

    while words.last().map_or(false, |word| word == ";") {
        words.pop();
    }

    Signature(collapse_in_lists(words).join(" "))
}

fn is_sign(words: &[String]) -> bool {
    match words {
        [.., before, last] if last == "-" => SIGN_CONTEXT.contains(&before.as_str()),
        [last] => last == "-",
        _ => false,
    }
}

/// Rewrites `in ( ? , ? , ? )` as `in ( ... )` so lists of any length share a shape.
fn collapse_in_lists(words: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(words.len());
    let mut i = 0;

    while i < words.len() {
        if words[i] == "in" && words.get(i + 1).map(String::as_str) == Some("(") {
            if let Some(close) = literal_list_end(&words, i + 2) {
                out.extend(["in", "(", "...", ")"].map(String::from));
                i = close + 1;
                continue;
            }
        }
        out.push(words[i].clone());
        i += 1;
    }

    out
}

/// Position of the `)` closing a `? , ? , ...` list starting at `start`.
fn literal_list_end(words: &[String], start: usize) -> Option<usize> {
    let mut expect_value = true;
    for (pos, word) in words.iter().enumerate().skip(start) {
        match (expect_value, word.as_str()) {
            (true, PLACEHOLDER) => expect_value = false,
            (false, ",") => expect_value = true,
            (false, ")") => return Some(pos),
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tokens {
    use super::*;
    use pretty_assertions_sorted::assert_eq;
    use TokenKind::*;

    #[test]
    fn test_select_where() {
        let lexer = TokenKind::lexer("SELECT * FROM Users WHERE id = 1;");

        let tokens = lexer.spanned().collect::<Vec<_>>();

        assert_eq!(
            tokens,
            &[
                (Ok(Select), 0..6),
                (Ok(Star), 7..8),
                (Ok(Ident("from".to_string())), 9..13),
                (Ok(Ident("users".to_string())), 14..19),
                (Ok(Ident("where".to_string())), 20..25),
                (Ok(Ident("id".to_string())), 26..28),
                (Ok(Eq), 29..30),
                (Ok(Number), 31..32),
                (Ok(Semi), 32..33),
            ],
        );
    }

    #[test]
    fn test_quoted_and_comments() {
        let lexer = TokenKind::lexer("select `Col` /* note */ from t -- trailing\n where s = 'it''s'");

        let tokens = lexer.map(|token| token.unwrap()).collect::<Vec<_>>();

        assert_eq!(
            tokens,
            vec![
                Select,
                Ident("col".to_string()),
                Ident("from".to_string()),
                Ident("t".to_string()),
                Ident("where".to_string()),
                Ident("s".to_string()),
                Eq,
                Str,
                Str,
            ],
        );
    }

    #[test]
    fn test_unterminated_string() {
        let lexer = TokenKind::lexer("'This is an unterminated string");

        let tokens = lexer.spanned().collect::<Vec<_>>();

        assert_eq!(tokens, &[(Err(LexerError::UnterminatedString), 0..31)]);
    }
}

#[cfg(test)]
mod signatures {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_literals_are_elided() {
        let a = signature("SELECT * FROM t1 WHERE a = 1 AND b = 'x'");
        let b = signature("select *   from t1 where a=42 and b=\"yy\";");

        assert_eq!(a, b);
        assert_eq!(a.as_str(), "select * from t1 where a = ? and b = ?");
    }

    #[test]
    fn test_signed_literals() {
        assert_eq!(
            signature("select * from t where a = -1"),
            signature("select * from t where a = 1")
        );
        // Subtraction between columns keeps its operator.
        assert_eq!(
            signature("select a - 1 from t").as_str(),
            "select a - ? from t"
        );
    }

    #[test]
    fn test_in_lists_collapse() {
        let short = signature("select * from t where a in (1, 2)");
        let long = signature("select * from t where a IN (3, 4, 5, 6)");

        assert_eq!(short, long);
        assert_eq!(short.as_str(), "select * from t where a in ( ... )");
    }

    #[test]
    fn test_subquery_in_is_kept() {
        assert_eq!(
            signature("select * from t where a in (select b from s)").as_str(),
            "select * from t where a in ( select b from s )"
        );
    }

    #[test]
    fn test_comments_are_dropped() {
        let seven = signature("select * from t where a = 1 /* v=7 */");
        let eight = signature("select * from t where a = 1 /* v=8 */");

        assert_eq!(seven, eight);
        assert_eq!(seven.as_str(), "select * from t where a = ?");
        assert_eq!(
            signature("select /* hint */ * from t -- note\n where a = 2 /* open").as_str(),
            "select * from t where a = ?"
        );
        // Division is not a comment.
        assert_eq!(signature("select a / 2 from t").as_str(), "select a / ? from t");
    }

    #[test]
    fn test_shape_differences_are_kept() {
        assert_ne!(
            signature("select * from t where a = 1"),
            signature("select * from t where b = 1")
        );
        assert_ne!(
            signature("select * from t where a = 1"),
            signature("select * from t where a > 1")
        );
    }

    #[test]
    fn test_statement_kind() {
        assert_eq!(statement_kind("SELECT 1"), StatementKind::Select);
        assert_eq!(
            statement_kind("with c as (select 1) select * from c"),
            StatementKind::Select
        );
        assert_eq!(
            statement_kind("(select a from t) union (select a from s)"),
            StatementKind::Select
        );
        assert_eq!(statement_kind("insert into t values (1)"), StatementKind::Insert);
        assert_eq!(statement_kind("REPLACE INTO t VALUES (1)"), StatementKind::Insert);
        assert_eq!(statement_kind("update t set a = 1"), StatementKind::Update);
        assert_eq!(statement_kind("delete from t"), StatementKind::Delete);
        assert_eq!(statement_kind("create table t (a int)"), StatementKind::Other);
        assert_eq!(statement_kind(""), StatementKind::Other);
    }
}
