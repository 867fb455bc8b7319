//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Dependency resolution (1xxx)
    /// Foreign keys form a cycle; the order is still produced
    CycleDetected,

    /// An extracted file has no CREATE TABLE statement
    MissingStructuralBlock,

    // Group assignment (2xxx)
    /// A table did not fit its group and moved to a later one
    TableCascaded,

    /// INSERT statements dropped because the table is not seed-eligible
    SeedStatementsDropped,

    /// No group could hold the table (fatal)
    GroupsExhausted,

    // Output validation (3xxx)
    /// A table is defined more than once
    DuplicateTable,

    /// An expected active table is absent from the output
    ActiveTableMissing,

    /// A deprecated table made it into the output
    ExcludedTablePresent,

    /// A foreign key references a table that is not in the output
    UnresolvedForeignKey,

    /// A group file contains INSERT statements
    InsertInSchemaFile,

    /// The seed file contains INSERTs for a table off the allow-list
    DisallowedSeedTable,

    /// The seed file contains CREATE TABLE statements
    StructuralInSeedFile,

    /// A group file is longer than its line budget
    LineLimitExceeded,

    /// An expected output file does not exist
    OutputFileMissing,

    // General warnings (9xxx)
    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CycleDetected => "CYCLE_DETECTED",
            Self::MissingStructuralBlock => "MISSING_STRUCTURAL_BLOCK",
            Self::TableCascaded => "TABLE_CASCADED",
            Self::SeedStatementsDropped => "SEED_STATEMENTS_DROPPED",
            Self::GroupsExhausted => "GROUPS_EXHAUSTED",
            Self::DuplicateTable => "DUPLICATE_TABLE",
            Self::ActiveTableMissing => "ACTIVE_TABLE_MISSING",
            Self::ExcludedTablePresent => "EXCLUDED_TABLE_PRESENT",
            Self::UnresolvedForeignKey => "UNRESOLVED_FOREIGN_KEY",
            Self::InsertInSchemaFile => "INSERT_IN_SCHEMA_FILE",
            Self::DisallowedSeedTable => "DISALLOWED_SEED_TABLE",
            Self::StructuralInSeedFile => "STRUCTURAL_IN_SEED_FILE",
            Self::LineLimitExceeded => "LINE_LIMIT_EXCEEDED",
            Self::OutputFileMissing => "OUTPUT_FILE_MISSING",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - the output should not be shipped
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root
    pub file: String,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// Create a location with file and line number
    pub fn with_line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    pub location: Option<Location>,

    /// Expected value (for comparison diagnostics)
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    pub actual: Option<String>,

    /// Tables involved in this issue
    pub tables: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
            tables: Vec::new(),
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// Set the tables involved
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(DiagnosticCode::CycleDetected.as_str(), "CYCLE_DETECTED");
        assert_eq!(DiagnosticCode::TableCascaded.as_str(), "TABLE_CASCADED");
        assert_eq!(DiagnosticCode::SeedStatementsDropped.as_str(), "SEED_STATEMENTS_DROPPED");
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::LineLimitExceeded,
            Severity::Error,
            "01_schema_project.sql has 640 lines",
        )
        .with_location(Location::new("schema/01_schema_project.sql"))
        .with_comparison("<= 600", "640");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("LINE_LIMIT_EXCEEDED"));
        assert!(json.contains("error"));
        assert!(json.contains("<= 600"));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Warn > Severity::Info);
    }
}
