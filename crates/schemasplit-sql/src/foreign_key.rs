//! Foreign-key clause extraction
//!
//! Single-column keys only: `FOREIGN KEY [name] (col) REFERENCES target`.
//! Composite keys are not matched.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

fn fk_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?i)FOREIGN\s+KEY\s*(?:[`"]?\w+[`"]?\s*)?\(\s*[`"]?(?P<column>\w+)[`"]?\s*\)\s*REFERENCES\s+(?:[`"]?\w+[`"]?\.)?[`"]?(?P<table>\w+)[`"]?"#,
        )
        .expect("foreign key pattern is valid")
    })
}

/// One foreign-key clause
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForeignKey {
    /// Referencing column
    pub column: String,

    /// Referenced table
    pub target: String,
}

/// All foreign-key clauses in a text, in source order
pub fn foreign_keys(text: &str) -> Vec<ForeignKey> {
    fk_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            Some(ForeignKey {
                column: caps.name("column")?.as_str().to_string(),
                target: caps.name("table")?.as_str().to_string(),
            })
        })
        .collect()
}

/// Distinct tables referenced by foreign keys in a text
pub fn foreign_key_targets(text: &str) -> BTreeSet<String> {
    foreign_keys(text).into_iter().map(|fk| fk.target).collect()
}
