//! SQL text handling
//!
//! This crate handles:
//! - Splitting SQL text into statements (quote and comment aware)
//! - Classifying CREATE TABLE / INSERT INTO statements
//! - Extracting single-column foreign-key references
//! - Extracting per-table files from raw schema sources

pub mod splitter;
pub mod statement;
pub mod foreign_key;
pub mod table;
pub mod extract;

pub use splitter::{split_statements, StatementSplitter};
pub use statement::{Statement, StatementKind, parse_statements, strip_leading_comments, line_count};
pub use foreign_key::{ForeignKey, foreign_keys, foreign_key_targets};
pub use table::{TableDefinition, BLOCK_SEPARATOR};
pub use extract::{TableExtractor, Extraction, ExtractError, load_extracted};
