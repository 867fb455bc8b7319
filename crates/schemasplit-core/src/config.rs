//! Configuration schema (schemasplit.toml)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Shared line budget for every group without an override
pub const DEFAULT_LINE_LIMIT: usize = 600;

const CORE_TABLES: &[&str] = &[
    "roles", "permissions", "role_permissions", "positions", "role_positions", "users",
    "password_history", "password_reset_otps", "refresh_tokens", "mfa_role_settings",
    "mfa_verification_attempts",
];

const PROJECT_TABLES: &[&str] = &[
    "projects", "project_users", "project_milestones", "project_files",
    "project_client_call_notes", "project_daily_status", "project_comments", "tasks",
    "task_comments", "task_history", "bugs", "bug_comments", "attachments", "timesheets",
];

const SUPPORT_TABLES: &[&str] = &[
    "employees", "employee_documents", "attendance", "leaves", "reimbursements", "holidays",
    "asset_categories", "assets", "asset_laptop_details", "asset_mobile_details",
    "asset_accessory_details", "asset_assignments", "asset_tickets", "asset_ticket_comments",
    "asset_ticket_attachments", "asset_audit_logs", "asset_maintenance", "asset_approvals",
    "inventory_items", "inventory_transactions", "inventory_attachments",
];

const MISC_TABLES: &[&str] = &[
    "notifications", "audit_logs", "settings", "fcm_tokens", "calendar_reminders",
];

const SEED_TABLES: &[&str] = &[
    "roles", "permissions", "role_permissions", "positions", "role_positions", "settings",
];

const EXCLUDED_TABLES: &[&str] = &[
    "prompts", "prompt_logs", "asset_settings", "project_activities",
    "project_change_requests", "project_credentials", "kanban_boards", "kanban_columns",
    "kanban_tasks", "kanban_integrations", "kanban_task_history", "kanban_board_members",
    "kanban_time_logs",
];

fn table_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// One ordered output group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name used in logs and reports
    pub name: String,

    /// Output file name, relative to the schema directory
    pub file: String,

    /// Per-group line budget; falls back to the shared limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_limit: Option<usize>,

    /// Tables that prefer this group
    #[serde(default)]
    pub tables: BTreeSet<String>,
}

impl GroupConfig {
    pub fn new(name: impl Into<String>, file: impl Into<String>, tables: BTreeSet<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            line_limit: None,
            tables,
        }
    }

    /// Override the shared line budget for this group
    pub fn with_line_limit(mut self, line_limit: usize) -> Self {
        self.line_limit = Some(line_limit);
        self
    }
}

/// Seed output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Output file name, relative to the schema directory
    pub file: String,

    /// Tables whose INSERT statements are kept
    #[serde(default)]
    pub tables: BTreeSet<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            file: "10_seed_production.sql".to_string(),
            tables: table_set(SEED_TABLES),
        }
    }
}

/// Extraction settings for raw schema sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Deprecated tables that never leave the sources
    #[serde(default)]
    pub excluded_tables: BTreeSet<String>,

    /// Source files starting with any of these prefixes are skipped
    #[serde(default)]
    pub skip_file_prefixes: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            excluded_tables: table_set(EXCLUDED_TABLES),
            skip_file_prefixes: vec!["remove_".to_string()],
        }
    }
}

impl ExtractConfig {
    /// Check if a source file should be skipped
    pub fn is_file_skipped(&self, file_name: &str) -> bool {
        self.skip_file_prefixes
            .iter()
            .any(|prefix| file_name.starts_with(prefix.as_str()))
    }

    /// Check if a table is excluded from extraction
    pub fn is_table_excluded(&self, table: &str) -> bool {
        self.excluded_tables.contains(table)
    }
}

/// Expectations checked by the validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Tables that must be present in the output (empty disables the check)
    #[serde(default)]
    pub active_tables: BTreeSet<String>,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        let active_tables = [CORE_TABLES, PROJECT_TABLES, SUPPORT_TABLES, MISC_TABLES]
            .iter()
            .flat_map(|names| names.iter())
            .map(|name| name.to_string())
            .collect();

        Self { active_tables }
    }
}

/// Directory layout, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw schema sources
    pub source_dir: PathBuf,

    /// One file per extracted table
    pub extracted_dir: PathBuf,

    /// Group and seed output files
    pub schema_dir: PathBuf,

    /// Dependency artifacts and validation reports
    pub reports_dir: PathBuf,

    /// Reassignment log
    pub log_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            extracted_dir: PathBuf::from("_schema_extracted"),
            schema_dir: PathBuf::from("schema"),
            reports_dir: PathBuf::from("_reports"),
            log_file: PathBuf::from("_reports/split_by_schema.log"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Shared line budget
    #[serde(default = "default_line_limit")]
    pub line_limit: usize,

    /// Ordered output groups; the last one is the catch-all
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,

    /// Seed output
    #[serde(default)]
    pub seed: SeedConfig,

    /// Extraction rules
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Validation expectations
    #[serde(default, rename = "validate")]
    pub validation: ValidateConfig,

    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_line_limit() -> usize {
    DEFAULT_LINE_LIMIT
}

fn default_groups() -> Vec<GroupConfig> {
    vec![
        GroupConfig::new("core", "00_schema_core.sql", table_set(CORE_TABLES)),
        GroupConfig::new("project", "01_schema_project.sql", table_set(PROJECT_TABLES)),
        GroupConfig::new("support", "02_schema_support.sql", table_set(SUPPORT_TABLES)),
        GroupConfig::new("misc", "03_schema_misc.sql", table_set(MISC_TABLES)),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line_limit: DEFAULT_LINE_LIMIT,
            groups: default_groups(),
            seed: SeedConfig::default(),
            extract: ExtractConfig::default(),
            validation: ValidateConfig::default(),
            paths: PathsConfig::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Check the structural rules the assignor relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::Invalid("at least one group is required".to_string()));
        }

        let mut names = HashSet::new();
        let mut files = HashSet::new();
        let mut owners: HashMap<&str, &str> = HashMap::new();

        for group in &self.groups {
            if !names.insert(group.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate group name '{}'", group.name)));
            }
            if !files.insert(group.file.as_str()) || group.file == self.seed.file {
                return Err(ConfigError::Invalid(format!("duplicate output file '{}'", group.file)));
            }
            if self.line_limit_for(group) == 0 {
                return Err(ConfigError::Invalid(format!("group '{}' has a zero line limit", group.name)));
            }
            for table in &group.tables {
                if let Some(owner) = owners.insert(table.as_str(), group.name.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "table '{}' is listed in both '{}' and '{}'",
                        table, owner, group.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Index of the group a table starts in; unmatched tables go to the catch-all
    pub fn preferred_group(&self, table: &str) -> usize {
        self.groups
            .iter()
            .position(|group| group.tables.contains(table))
            .unwrap_or_else(|| self.catch_all())
    }

    /// Index of the catch-all group (always the last one)
    pub fn catch_all(&self) -> usize {
        self.groups.len().saturating_sub(1)
    }

    /// Effective line budget of a group
    pub fn line_limit_for(&self, group: &GroupConfig) -> usize {
        group.line_limit.unwrap_or(self.line_limit)
    }

    /// Check if a table's INSERT statements belong in the seed output
    pub fn is_seed_table(&self, table: &str) -> bool {
        self.seed.tables.contains(table)
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn source_dir(&self) -> PathBuf {
        self.resolve(&self.paths.source_dir)
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.resolve(&self.paths.extracted_dir)
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.resolve(&self.paths.schema_dir)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.resolve(&self.paths.reports_dir)
    }

    pub fn log_file(&self) -> PathBuf {
        self.resolve(&self.paths.log_file)
    }

    /// Full path of a group's output file
    pub fn group_path(&self, group: &GroupConfig) -> PathBuf {
        self.schema_dir().join(&group.file)
    }

    /// Full path of the seed output file
    pub fn seed_path(&self) -> PathBuf {
        self.schema_dir().join(&self.seed.file)
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
