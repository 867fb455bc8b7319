//! Output validation
//!
//! Re-reads what a split produced and checks it against the configuration:
//! completeness, duplicates, foreign-key resolvability, stray data
//! statements and line budgets. Validation never aborts a run; callers
//! decide what a failure means.

use schemasplit_core::{Config, Diagnostic, DiagnosticCode, Location, Report, Severity};
use schemasplit_graph::{load_order, GraphError, ORDER_FILE};
use schemasplit_sql::{foreign_keys, parse_statements, StatementKind};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const VALIDATION_REPORT_FILE: &str = "schema_validation_report.txt";

/// One group file as found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFile {
    pub file: String,
    pub line_limit: usize,

    /// `None` when the file does not exist
    pub content: Option<String>,
}

/// Everything the validator looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSnapshot {
    /// Resolved order, if `dependency_order.json` exists
    pub order: Option<Vec<String>>,
    pub groups: Vec<GroupFile>,
    pub seed_file: String,
    pub seed: Option<String>,
}

/// Validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Order(#[from] GraphError),
}

/// Findings of one validation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Known tables: the resolved order plus every table defined in a group file
    pub tables: BTreeSet<String>,
    pub duplicates: BTreeSet<String>,
    pub missing_active: BTreeSet<String>,
    pub excluded_present: BTreeSet<String>,

    /// Unknown foreign-key targets
    pub missing_fk: BTreeSet<String>,

    /// (file, unknown target) pairs
    pub fk_details: BTreeSet<(String, String)>,

    /// Group files containing INSERT INTO
    pub insert_violations: Vec<String>,

    /// Tables seeded despite not being allow-listed
    pub wrong_seed_tables: BTreeSet<String>,
    pub structural_in_seed: bool,

    /// (file, lines, limit)
    pub line_violations: Vec<(String, usize, usize)>,
    pub missing_files: Vec<String>,

    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn status(&self) -> &'static str {
        if self.passed() {
            "PASS"
        } else {
            "FAIL"
        }
    }

    /// Human-readable report
    pub fn render(&self) -> String {
        fn list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
            let joined = items.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ");
            if joined.is_empty() {
                "None".to_string()
            } else {
                joined
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "Schema Validation Report");
        let _ = writeln!(out, "========================");
        let _ = writeln!(out, "Total schema tables detected: {}", self.tables.len());
        let _ = writeln!(out, "Duplicate CREATE TABLE definitions: {}", list(&self.duplicates));
        let _ = writeln!(out, "Active tables missing: {}", list(&self.missing_active));
        let _ = writeln!(out, "Excluded tables present: {}", list(&self.excluded_present));
        let _ = writeln!(out, "Foreign key references missing: {}", list(&self.missing_fk));
        let _ = writeln!(out, "Schema files containing INSERTs: {}", list(&self.insert_violations));
        let _ = writeln!(out, "Seed file contains disallowed tables: {}", list(&self.wrong_seed_tables));
        let _ = writeln!(
            out,
            "Seed file contains CREATE TABLE: {}",
            if self.structural_in_seed { "Yes" } else { "No" }
        );
        let _ = writeln!(out, "Missing output files: {}", list(&self.missing_files));

        if !self.fk_details.is_empty() {
            let _ = writeln!(out, "\nForeign key issues:");
            for (file, target) in &self.fk_details {
                let _ = writeln!(out, "- {} references missing table {}", file, target);
            }
        }

        let violations = self
            .line_violations
            .iter()
            .map(|(file, lines, limit)| format!("{} ({} > {})", file, lines, limit))
            .collect::<Vec<_>>();
        let _ = writeln!(out, "\nLine count violations: {}", list(&violations));

        let _ = writeln!(out, "\nValidation Status: {}", self.status());
        out
    }

    /// Diagnostics as a core report
    pub fn to_report(&self) -> Report {
        Report::from_diagnostics(self.diagnostics.clone()).with_table_count(self.tables.len())
    }

    /// Write the human-readable report
    pub fn write_report(&self, path: &Path) -> Result<(), ValidateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ValidateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, self.render()).map_err(|source| ValidateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Checks written outputs against the configuration
pub struct SchemaValidator<'a> {
    config: &'a Config,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Read the outputs from disk; missing files are recorded, not errors
    pub fn snapshot(&self) -> Result<OutputSnapshot, ValidateError> {
        let order_path = self.config.reports_dir().join(ORDER_FILE);
        let order = if order_path.exists() {
            Some(load_order(&order_path)?)
        } else {
            tracing::warn!(path = %order_path.display(), "dependency order not found");
            None
        };

        let groups = self
            .config
            .groups
            .iter()
            .map(|group| {
                Ok(GroupFile {
                    file: group.file.clone(),
                    line_limit: self.config.line_limit_for(group),
                    content: read_optional(&self.config.group_path(group))?,
                })
            })
            .collect::<Result<Vec<_>, ValidateError>>()?;

        Ok(OutputSnapshot {
            order,
            groups,
            seed_file: self.config.seed.file.clone(),
            seed: read_optional(&self.config.seed_path())?,
        })
    }

    /// Read the outputs and check them
    pub fn validate(&self) -> Result<ValidationResult, ValidateError> {
        Ok(self.check(&self.snapshot()?))
    }

    /// Check a snapshot
    pub fn check(&self, snapshot: &OutputSnapshot) -> ValidationResult {
        let mut result = ValidationResult::default();
        let order = snapshot.order.as_deref().unwrap_or_default();

        // Definitions per table across all group files
        let mut definitions: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for group in &snapshot.groups {
            let Some(content) = &group.content else {
                result.missing_files.push(group.file.clone());
                continue;
            };
            for statement in parse_statements(content) {
                match statement.kind() {
                    StatementKind::Structural => {
                        if let Some(table) = statement.table_name() {
                            definitions.entry(table.to_string()).or_default().push(&group.file);
                        }
                    }
                    StatementKind::Data => {
                        if !result.insert_violations.contains(&group.file) {
                            result.insert_violations.push(group.file.clone());
                        }
                    }
                    StatementKind::Other => {}
                }
            }
        }

        result.tables = order.iter().cloned().chain(definitions.keys().cloned()).collect();

        let mut seen = BTreeSet::new();
        for table in order {
            if !seen.insert(table) {
                result.duplicates.insert(table.clone());
            }
        }
        for (table, files) in &definitions {
            if files.len() > 1 {
                result.duplicates.insert(table.clone());
            }
        }

        result.missing_active = self
            .config
            .validation
            .active_tables
            .difference(&result.tables)
            .cloned()
            .collect();

        result.excluded_present = self
            .config
            .extract
            .excluded_tables
            .intersection(&result.tables)
            .cloned()
            .collect();

        for group in &snapshot.groups {
            let Some(content) = &group.content else {
                continue;
            };
            for fk in foreign_keys(content) {
                if !result.tables.contains(&fk.target) {
                    result.missing_fk.insert(fk.target.clone());
                    result.fk_details.insert((group.file.clone(), fk.target));
                }
            }

            let lines = content.lines().count();
            if lines > group.line_limit {
                result.line_violations.push((group.file.clone(), lines, group.line_limit));
            }
        }

        match &snapshot.seed {
            Some(seed) => {
                for statement in parse_statements(seed) {
                    match statement.kind() {
                        StatementKind::Structural => result.structural_in_seed = true,
                        StatementKind::Data => {
                            if let Some(table) = statement.table_name() {
                                if !self.config.is_seed_table(table) {
                                    result.wrong_seed_tables.insert(table.to_string());
                                }
                            }
                        }
                        StatementKind::Other => {}
                    }
                }
            }
            None => result.missing_files.push(snapshot.seed_file.clone()),
        }

        result.diagnostics = diagnostics(&result, snapshot, &definitions);
        tracing::info!(
            tables = result.tables.len(),
            errors = result.diagnostics.iter().filter(|d| d.severity == Severity::Error).count(),
            status = result.status(),
            "validated outputs"
        );
        result
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ValidateError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ValidateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn diagnostics(
    result: &ValidationResult,
    snapshot: &OutputSnapshot,
    definitions: &BTreeMap<String, Vec<&str>>,
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for file in &result.missing_files {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::OutputFileMissing,
                Severity::Error,
                format!("Output file {} does not exist", file),
            )
            .with_location(Location::new(file.clone())),
        );
    }

    for table in &result.duplicates {
        let mut diagnostic = Diagnostic::new(
            DiagnosticCode::DuplicateTable,
            Severity::Error,
            format!("Table '{}' is defined more than once", table),
        )
        .with_tables(vec![table.clone()]);
        if let Some(file) = definitions.get(table).and_then(|files| files.last()) {
            diagnostic = diagnostic.with_location(Location::new(*file));
        }
        diagnostics.push(diagnostic);
    }

    for table in &result.missing_active {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::ActiveTableMissing,
                Severity::Error,
                format!("Active table '{}' is missing from the output", table),
            )
            .with_tables(vec![table.clone()]),
        );
    }

    for table in &result.excluded_present {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::ExcludedTablePresent,
                Severity::Error,
                format!("Excluded table '{}' is present in the output", table),
            )
            .with_tables(vec![table.clone()]),
        );
    }

    for (file, target) in &result.fk_details {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::UnresolvedForeignKey,
                Severity::Error,
                format!("{} references missing table {}", file, target),
            )
            .with_location(Location::new(file.clone()))
            .with_tables(vec![target.clone()]),
        );
    }

    for file in &result.insert_violations {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::InsertInSchemaFile,
                Severity::Error,
                format!("Schema file {} contains INSERT statements", file),
            )
            .with_location(Location::new(file.clone())),
        );
    }

    if !result.wrong_seed_tables.is_empty() {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::DisallowedSeedTable,
                Severity::Error,
                format!(
                    "Seed file contains INSERTs for tables off the allow-list: {}",
                    result.wrong_seed_tables.iter().cloned().collect::<Vec<_>>().join(", ")
                ),
            )
            .with_location(Location::new(snapshot.seed_file.clone()))
            .with_tables(result.wrong_seed_tables.iter().cloned().collect()),
        );
    }

    if result.structural_in_seed {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::StructuralInSeedFile,
                Severity::Error,
                "Seed file contains CREATE TABLE statements",
            )
            .with_location(Location::new(snapshot.seed_file.clone())),
        );
    }

    for (file, lines, limit) in &result.line_violations {
        diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::LineLimitExceeded,
                Severity::Error,
                format!("{} has {} lines", file, lines),
            )
            .with_location(Location::with_line(file.clone(), limit + 1))
            .with_comparison(format!("<= {}", limit), lines.to_string()),
        );
    }

    diagnostics
}
