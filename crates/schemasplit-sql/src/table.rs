//! Per-table definitions as produced by the extractor

use crate::foreign_key::foreign_key_targets;
use crate::statement::{parse_statements, StatementKind};
use std::collections::BTreeSet;

/// Separator between blocks in generated files
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Everything known about one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    /// Table name (case-sensitive)
    pub name: String,

    /// CREATE TABLE statements, leading comments removed
    pub structural: Vec<String>,

    /// INSERT INTO statements, leading comments removed
    pub data: Vec<String>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            structural: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build a definition from the text of an extracted file
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let mut table = Self::new(name);
        for statement in parse_statements(text) {
            match statement.kind() {
                StatementKind::Structural => table.structural.push(statement.body().to_string()),
                StatementKind::Data => table.data.push(statement.body().to_string()),
                StatementKind::Other => {}
            }
        }
        table
    }

    /// Whether the table has a CREATE TABLE statement
    pub fn has_structure(&self) -> bool {
        !self.structural.is_empty()
    }

    /// All structural statements joined into one block
    pub fn structural_block(&self) -> Option<String> {
        if self.has_structure() {
            Some(self.structural.join(BLOCK_SEPARATOR))
        } else {
            None
        }
    }

    /// Tables referenced from the structural statements
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.structural
            .iter()
            .flat_map(|statement| foreign_key_targets(statement))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE_PERMISSIONS: &str = "-- Extracted definition for role_permissions\n\
        CREATE TABLE IF NOT EXISTS `role_permissions` (\n\
          `role_id` INT NOT NULL,\n\
          `permission_id` INT NOT NULL,\n\
          CONSTRAINT `fk_rp_role` FOREIGN KEY (`role_id`) REFERENCES `roles` (`id`),\n\
          CONSTRAINT `fk_rp_perm` FOREIGN KEY (`permission_id`) REFERENCES `permissions` (`id`)\n\
        ) ENGINE=InnoDB;\n\n\
        INSERT INTO `role_permissions` VALUES (1, 1);";

    #[test]
    fn splits_structure_and_data() {
        let table = TableDefinition::from_text("role_permissions", ROLE_PERMISSIONS);
        assert!(table.has_structure());
        assert_eq!(table.structural.len(), 1);
        assert_eq!(table.data, vec!["INSERT INTO `role_permissions` VALUES (1, 1);"]);
        assert!(table.structural[0].starts_with("CREATE TABLE"));
    }

    #[test]
    fn dependencies_from_structure() {
        let table = TableDefinition::from_text("role_permissions", ROLE_PERMISSIONS);
        let deps: Vec<_> = table.dependencies().into_iter().collect();
        assert_eq!(deps, vec!["permissions", "roles"]);
    }

    #[test]
    fn data_only_table() {
        let table = TableDefinition::from_text("orphan_log", "INSERT INTO orphan_log VALUES (1);");
        assert!(!table.has_structure());
        assert_eq!(table.structural_block(), None);
        assert!(table.dependencies().is_empty());
    }

    #[test]
    fn multiple_structural_statements_are_joined() {
        let table = TableDefinition::from_text("t", "CREATE TABLE t (a INT);\nCREATE TABLE t (b INT);");
        assert_eq!(
            table.structural_block().unwrap(),
            "CREATE TABLE t (a INT);\n\nCREATE TABLE t (b INT);"
        );
    }
}
