//! Table extraction from raw schema sources
//!
//! Scans `*.sql` files, keeps CREATE TABLE and INSERT INTO statements per
//! table, and writes one file per table. Excluded tables and skipped source
//! files never reach the output.

use crate::statement::{parse_statements, StatementKind};
use crate::table::{TableDefinition, BLOCK_SEPARATOR};
use schemasplit_core::ExtractConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Statements collected per table from a set of sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Table name -> statements in source order
    pub tables: BTreeMap<String, Vec<String>>,

    /// Source files that were read
    pub scanned_files: Vec<PathBuf>,

    /// Source files skipped by prefix
    pub skipped_files: Vec<PathBuf>,

    /// Excluded tables that were seen in the sources
    pub excluded_hits: BTreeSet<String>,
}

impl Extraction {
    /// Render the extracted file for one table
    pub fn render(table: &str, statements: &[String]) -> String {
        format!(
            "-- Extracted definition for {}\n{}",
            table,
            statements.join(BLOCK_SEPARATOR)
        )
    }

    /// Write one `<table>.sql` per table, replacing any previous extraction
    pub fn write(&self, out_dir: &Path) -> Result<usize, ExtractError> {
        std::fs::create_dir_all(out_dir).map_err(|source| ExtractError::Write {
            path: out_dir.to_path_buf(),
            source,
        })?;

        for stale in sql_files(out_dir)? {
            std::fs::remove_file(&stale)
                .map_err(|source| ExtractError::Write { path: stale.clone(), source })?;
        }

        for (table, statements) in &self.tables {
            let path = out_dir.join(format!("{}.sql", table));
            std::fs::write(&path, Self::render(table, statements))
                .map_err(|source| ExtractError::Write { path: path.clone(), source })?;
        }

        info!(tables = self.tables.len(), dir = %out_dir.display(), "wrote extracted tables");
        Ok(self.tables.len())
    }
}

/// Scans raw schema sources
pub struct TableExtractor<'a> {
    config: &'a ExtractConfig,
}

impl<'a> TableExtractor<'a> {
    pub fn new(config: &'a ExtractConfig) -> Self {
        Self { config }
    }

    /// Collect statements from every eligible `*.sql` file in a directory
    pub fn scan(&self, source_dir: &Path) -> Result<Extraction, ExtractError> {
        let mut extraction = Extraction::default();

        for path in sql_files(source_dir)? {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();

            if self.config.is_file_skipped(file_name) {
                debug!(file = %path.display(), "skipping source file");
                extraction.skipped_files.push(path);
                continue;
            }

            let text = std::fs::read_to_string(&path)
                .map_err(|source| ExtractError::Read { path: path.clone(), source })?;
            self.collect(&text, &mut extraction);
            extraction.scanned_files.push(path);
        }

        info!(
            files = extraction.scanned_files.len(),
            skipped = extraction.skipped_files.len(),
            tables = extraction.tables.len(),
            "scanned schema sources"
        );
        Ok(extraction)
    }

    /// Collect statements from one source text
    pub fn collect(&self, text: &str, extraction: &mut Extraction) {
        for statement in parse_statements(text) {
            if statement.kind() == StatementKind::Other {
                continue;
            }
            let Some(table) = statement.table_name() else {
                continue;
            };
            if self.config.is_table_excluded(table) {
                extraction.excluded_hits.insert(table.to_string());
                continue;
            }
            extraction
                .tables
                .entry(table.to_string())
                .or_default()
                .push(statement.body().to_string());
        }
    }
}

/// `*.sql` files directly inside a directory, sorted by name
fn sql_files(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| ExtractError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "sql")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

/// Read every extracted `<table>.sql` back, sorted by table name
pub fn load_extracted(dir: &Path) -> Result<Vec<TableDefinition>, ExtractError> {
    let mut tables = Vec::new();

    for path in sql_files(dir)? {
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ExtractError::Read { path: path.clone(), source })?;
        tables.push(TableDefinition::from_text(name, &text));
    }

    debug!(tables = tables.len(), dir = %dir.display(), "loaded extracted tables");
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_by_table_and_skips_excluded() {
        let config = ExtractConfig::default();
        let extractor = TableExtractor::new(&config);
        let mut extraction = Extraction::default();

        extractor.collect(
            "CREATE TABLE IF NOT EXISTS `roles` (`id` INT) ENGINE=InnoDB;\n\
             CREATE TABLE IF NOT EXISTS `kanban_boards` (`id` INT) ENGINE=InnoDB;\n\
             INSERT INTO `roles` VALUES (1, 'admin');\n\
             DROP TABLE IF EXISTS `old_stuff`;",
            &mut extraction,
        );

        assert_eq!(extraction.tables.len(), 1);
        assert_eq!(extraction.tables["roles"].len(), 2);
        assert!(extraction.excluded_hits.contains("kanban_boards"));
    }

    #[test]
    fn render_has_header() {
        let rendered = Extraction::render("roles", &["CREATE TABLE roles (id INT);".to_string()]);
        assert_eq!(rendered, "-- Extracted definition for roles\nCREATE TABLE roles (id INT);");
    }
}
