//! Stage orchestration
//!
//! Each stage reads what the previous one wrote, so stages can run on their
//! own or back to back through [`Pipeline::run`].

use crate::assign::{AssignError, Assignment, GroupAssignor};
use crate::log::ReassignmentLog;
use crate::output::{write_outputs, WrittenFile};
use crate::seed::SeedCollection;
use crate::validate::{SchemaValidator, ValidateError, ValidationResult, VALIDATION_REPORT_FILE};
use schemasplit_core::{Config, Diagnostic, DiagnosticCode, Location, Report, Severity};
use schemasplit_graph::{load_order, write_artifacts, DependencyGraph, GraphError, Resolution, ORDER_FILE};
use schemasplit_sql::{load_extracted, ExtractError, Extraction, TableDefinition, TableExtractor};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SPLIT_REPORT_FILE: &str = "split_report.json";

/// Engine error types
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl EngineError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of the split stage
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub assignment: Assignment,
    pub seeds: SeedCollection,
    pub files: Vec<WrittenFile>,

    /// Everything written to the log file
    pub log: ReassignmentLog,
    pub report: Report,
}

/// Result of a full run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// `None` when extraction was skipped
    pub extraction: Option<Extraction>,
    pub resolution: Resolution,
    pub split: SplitOutcome,
    pub validation: ValidationResult,
}

/// Runs the stages against one configuration
pub struct Pipeline<'a> {
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Scan the sources and rewrite the per-table files
    pub fn extract(&self) -> Result<Extraction, EngineError> {
        let extraction = TableExtractor::new(&self.config.extract).scan(&self.config.source_dir())?;
        extraction.write(&self.config.extracted_dir())?;

        if !extraction.excluded_hits.is_empty() {
            info!(
                tables = %extraction.excluded_hits.iter().cloned().collect::<Vec<_>>().join(", "),
                "excluded tables dropped"
            );
        }
        Ok(extraction)
    }

    /// Build the dependency graph and write the order artifacts
    pub fn resolve(&self) -> Result<(DependencyGraph, Resolution), EngineError> {
        let tables = load_extracted(&self.config.extracted_dir())?;
        let graph = DependencyGraph::from_tables(&tables);
        let resolution = graph.resolve();

        for (target, sources) in graph.dangling_references() {
            warn!(
                target = %target,
                referenced_by = %sources.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
                "foreign key target is not an extracted table"
            );
        }

        write_artifacts(&self.config.reports_dir(), &graph, &resolution)?;
        Ok((graph, resolution))
    }

    /// Split using the order written by a previous `resolve`
    pub fn split(&self) -> Result<SplitOutcome, EngineError> {
        let order = load_order(&self.config.reports_dir().join(ORDER_FILE))?;
        self.split_with(&order, &[])
    }

    /// Split using a resolution from this run; its cycles go to the log
    pub fn split_resolved(&self, resolution: &Resolution) -> Result<SplitOutcome, EngineError> {
        self.split_with(&resolution.order, &resolution.cycles)
    }

    fn split_with(&self, order: &[String], cycles: &[Vec<String>]) -> Result<SplitOutcome, EngineError> {
        let log_path = self.config.log_file();
        ReassignmentLog::new().write(&log_path).map_err(EngineError::io(&log_path))?;
        self.clear_outputs()?;

        let tables: BTreeMap<String, TableDefinition> = load_extracted(&self.config.extracted_dir())?
            .into_iter()
            .map(|table| (table.name.clone(), table))
            .collect();

        let mut log = ReassignmentLog::from_cycles(cycles);
        let assignment = match GroupAssignor::new(self.config).assign(order, &tables) {
            Ok(assignment) => assignment,
            Err(AssignError::GroupsExhausted { table, lines, log: failed }) => {
                log.extend(failed.clone());
                log.write(&log_path).map_err(EngineError::io(&log_path))?;
                self.save_split_report(&exhausted_report(cycles, &table, lines))?;
                return Err(AssignError::GroupsExhausted { table, lines, log: failed }.into());
            }
        };
        log.extend(assignment.log.clone());
        log.write(&log_path).map_err(EngineError::io(&log_path))?;

        let seeds = SeedCollection::separate(order, &tables, self.config);
        let files = write_outputs(self.config, &assignment, &seeds)
            .map_err(EngineError::io(&self.config.schema_dir()))?;

        let report = split_report(self.config, cycles, &tables, &assignment, &seeds, &files);
        self.save_split_report(&report)?;

        info!(
            tables = assignment.placements.len(),
            cascades = assignment.log.moves().count(),
            seeds = seeds.statements.len(),
            "split complete"
        );

        Ok(SplitOutcome {
            assignment,
            seeds,
            files,
            log,
            report,
        })
    }

    /// Remove the group files, seed file and split report of a previous split
    fn clear_outputs(&self) -> Result<(), EngineError> {
        let outputs = self
            .config
            .groups
            .iter()
            .map(|group| self.config.group_path(group))
            .chain([
                self.config.seed_path(),
                self.config.reports_dir().join(SPLIT_REPORT_FILE),
            ]);

        for path in outputs {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed previous output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(EngineError::Io { path, source }),
            }
        }
        Ok(())
    }

    fn save_split_report(&self, report: &Report) -> Result<(), EngineError> {
        let report_path = self.config.reports_dir().join(SPLIT_REPORT_FILE);
        std::fs::create_dir_all(self.config.reports_dir())
            .and_then(|_| report.save_to_file(&report_path))
            .map_err(EngineError::io(&report_path))
    }

    /// Check the written outputs and write the validation report
    pub fn validate(&self) -> Result<ValidationResult, EngineError> {
        let result = SchemaValidator::new(self.config).validate()?;
        result.write_report(&self.config.reports_dir().join(VALIDATION_REPORT_FILE))?;
        Ok(result)
    }

    /// Every stage in order
    pub fn run(&self, skip_extract: bool) -> Result<RunOutcome, EngineError> {
        let extraction = if skip_extract {
            info!("skipping extraction");
            None
        } else {
            Some(self.extract()?)
        };

        let (_, resolution) = self.resolve()?;
        let split = self.split_resolved(&resolution)?;
        let validation = self.validate()?;

        Ok(RunOutcome {
            extraction,
            resolution,
            split,
            validation,
        })
    }
}

fn cycle_diagnostics(cycles: &[Vec<String>]) -> Vec<Diagnostic> {
    cycles
        .iter()
        .map(|cycle| {
            Diagnostic::new(
                DiagnosticCode::CycleDetected,
                Severity::Warn,
                format!("Cycle detected: {}", cycle.join(" -> ")),
            )
            .with_tables(cycle.clone())
        })
        .collect()
}

/// Report left behind by a split that ran out of groups
fn exhausted_report(cycles: &[Vec<String>], table: &str, lines: usize) -> Report {
    let mut report = Report::from_diagnostics(cycle_diagnostics(cycles));
    report.add_diagnostic(
        Diagnostic::new(
            DiagnosticCode::GroupsExhausted,
            Severity::Error,
            format!("Line limit reached for all groups while placing {} ({} lines)", table, lines),
        )
        .with_tables(vec![table.to_string()]),
    );
    report.with_metadata(serde_json::json!({ "table": table, "lines": lines }))
}

fn split_report(
    config: &Config,
    cycles: &[Vec<String>],
    tables: &BTreeMap<String, TableDefinition>,
    assignment: &Assignment,
    seeds: &SeedCollection,
    files: &[WrittenFile],
) -> Report {
    let mut report = Report::from_diagnostics(cycle_diagnostics(cycles));

    for (name, table) in tables.iter().filter(|(_, t)| !t.has_structure()) {
        report.add_diagnostic(
            Diagnostic::new(
                DiagnosticCode::MissingStructuralBlock,
                Severity::Info,
                format!("Table '{}' has no CREATE TABLE statement", name),
            )
            .with_location(Location::new(format!("{}.sql", table.name))),
        );
    }
    for name in assignment.skipped.iter().filter(|name| !tables.contains_key(*name)) {
        report.add_diagnostic(
            Diagnostic::new(
                DiagnosticCode::MissingStructuralBlock,
                Severity::Warn,
                format!("Table '{}' is in the dependency order but has no extracted file", name),
            )
            .with_tables(vec![name.clone()]),
        );
    }

    for placement in assignment.placements.iter().filter(|p| p.cascaded()) {
        let from = &assignment.groups[placement.preferred];
        let to = &assignment.groups[placement.group];
        report.add_diagnostic(
            Diagnostic::new(
                DiagnosticCode::TableCascaded,
                Severity::Info,
                format!("Table {} moved from {} to {}", placement.table, from.name, to.name),
            )
            .with_comparison(from.name.clone(), to.name.clone())
            .with_tables(vec![placement.table.clone()]),
        );
    }

    for (table, count) in &seeds.dropped {
        report.add_diagnostic(
            Diagnostic::new(
                DiagnosticCode::SeedStatementsDropped,
                Severity::Info,
                format!("Dropped {} INSERT statement(s) for '{}' (not seed-eligible)", count, table),
            )
            .with_location(Location::new(config.seed.file.clone()))
            .with_tables(vec![table.clone()]),
        );
    }

    let groups = assignment
        .groups
        .iter()
        .map(|group| {
            serde_json::json!({
                "name": group.name,
                "file": group.file,
                "lines": group.lines,
                "line_limit": group.line_limit,
                "tables": group.tables,
            })
        })
        .collect::<Vec<_>>();

    report
        .with_table_count(assignment.placements.len())
        .with_metadata(serde_json::json!({
            "groups": groups,
            "seed_statements": seeds.statements.len(),
            "files": files,
        }))
}
