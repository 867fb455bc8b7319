//! Statement classification
//!
//! Only two statement shapes matter here: `CREATE TABLE` (structural) and
//! `INSERT INTO` (data). Everything else is carried as `Other` and ignored.

use regex::Regex;
use std::sync::OnceLock;

fn create_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?i)^CREATE\s+(?:TEMPORARY\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[`"]?\w+[`"]?\.)?[`"]?(?P<table>\w+)[`"]?"#,
        )
        .expect("create pattern is valid")
    })
}

fn insert_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?i)^INSERT\s+(?:IGNORE\s+)?INTO\s+(?:[`"]?\w+[`"]?\.)?[`"]?(?P<table>\w+)[`"]?"#,
        )
        .expect("insert pattern is valid")
    })
}

/// What a statement does to a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// CREATE TABLE
    Structural,

    /// INSERT INTO
    Data,

    /// Anything else
    Other,
}

/// A single SQL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    text: String,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Full statement text as it appeared in the source
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Statement text with leading comments and whitespace removed
    pub fn body(&self) -> &str {
        strip_leading_comments(&self.text)
    }

    pub fn kind(&self) -> StatementKind {
        let body = self.body();
        if create_pattern().is_match(body) {
            StatementKind::Structural
        } else if insert_pattern().is_match(body) {
            StatementKind::Data
        } else {
            StatementKind::Other
        }
    }

    /// Target table of a CREATE TABLE or INSERT INTO statement
    pub fn table_name(&self) -> Option<&str> {
        let body = self.body();
        create_pattern()
            .captures(body)
            .or_else(|| insert_pattern().captures(body))
            .and_then(|caps| caps.name("table"))
            .map(|m| m.as_str())
    }
}

/// Split text into classified statements
pub fn parse_statements(text: &str) -> Vec<Statement> {
    crate::splitter::split_statements(text)
        .into_iter()
        .map(Statement::new)
        .collect()
}

/// Drop leading `--` line comments, `/* */` block comments and whitespace
pub fn strip_leading_comments(text: &str) -> &str {
    let mut rest = text.trim_start();
    loop {
        if let Some(comment) = rest.strip_prefix("--") {
            rest = match comment.find('\n') {
                Some(end) => comment[end + 1..].trim_start(),
                None => "",
            };
        } else if let Some(comment) = rest.strip_prefix("/*") {
            rest = match comment.find("*/") {
                Some(end) => comment[end + 2..].trim_start(),
                None => "",
            };
        } else {
            return rest;
        }
    }
}

/// Number of lines a block occupies in an output file
pub fn line_count(block: &str) -> usize {
    block.matches('\n').count() + 1
}
