//! Seed separation
//!
//! Data statements of allow-listed tables go to the seed file; data
//! statements of every other table are dropped.

use schemasplit_core::Config;
use schemasplit_sql::{TableDefinition, BLOCK_SEPARATOR};
use std::collections::BTreeMap;
use tracing::debug;

/// First line of the seed file
pub const SEED_HEADER: &str = "-- Seed file (DDL stripped)\n";

/// Collected seed statements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedCollection {
    /// Data statements in creation order, then source order
    pub statements: Vec<String>,

    /// Tables whose data statements were dropped, with the number dropped
    pub dropped: BTreeMap<String, usize>,
}

impl SeedCollection {
    /// Collect seed statements for the tables of `order`
    ///
    /// Only tables that have a CREATE TABLE block take part; a data-only
    /// table never seeds and its statements count as dropped.
    pub fn separate(
        order: &[String],
        tables: &BTreeMap<String, TableDefinition>,
        config: &Config,
    ) -> Self {
        let mut collection = Self::default();

        for name in order {
            let Some(table) = tables.get(name) else {
                continue;
            };
            if table.data.is_empty() {
                continue;
            }

            if table.has_structure() && config.is_seed_table(name) {
                collection.statements.extend(table.data.iter().cloned());
            } else {
                debug!(table = %name, statements = table.data.len(), "dropping data statements");
                collection.dropped.insert(name.clone(), table.data.len());
            }
        }

        // Data-only tables are not in the order; they are dropped too
        for (name, table) in tables {
            if !table.has_structure() && !table.data.is_empty() && !collection.dropped.contains_key(name) {
                debug!(table = %name, statements = table.data.len(), "dropping data statements");
                collection.dropped.insert(name.clone(), table.data.len());
            }
        }

        collection
    }

    pub fn dropped_statements(&self) -> usize {
        self.dropped.values().sum()
    }

    /// Seed file content
    pub fn render(&self) -> String {
        let mut content = String::from(SEED_HEADER);
        content.push_str(&self.statements.join(BLOCK_SEPARATOR));
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tables() -> BTreeMap<String, TableDefinition> {
        [
            (
                "settings",
                "CREATE TABLE settings (k VARCHAR(32));\n\
                 INSERT INTO settings VALUES ('theme');\n\
                 INSERT INTO settings VALUES ('locale');",
            ),
            ("roles", "CREATE TABLE roles (id INT);\nINSERT INTO roles VALUES (1);"),
            ("users", "CREATE TABLE users (id INT);\nINSERT INTO users VALUES (7);"),
            ("orphan_log", "INSERT INTO orphan_log VALUES (1);"),
        ]
        .into_iter()
        .map(|(name, text)| (name.to_string(), TableDefinition::from_text(name, text)))
        .collect()
    }

    fn order() -> Vec<String> {
        ["roles", "users", "settings"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_allow_listed_statements_in_order() {
        let seeds = SeedCollection::separate(&order(), &tables(), &Config::default());
        assert_eq!(
            seeds.statements,
            vec![
                "INSERT INTO roles VALUES (1);",
                "INSERT INTO settings VALUES ('theme');",
                "INSERT INTO settings VALUES ('locale');",
            ]
        );
    }

    #[test]
    fn records_dropped_tables() {
        let seeds = SeedCollection::separate(&order(), &tables(), &Config::default());
        assert_eq!(seeds.dropped.get("users"), Some(&1));
        assert_eq!(seeds.dropped.get("orphan_log"), Some(&1));
        assert_eq!(seeds.dropped_statements(), 2);
    }

    #[test]
    fn data_only_allow_listed_table_never_seeds() {
        let mut tables = tables();
        tables.insert(
            "permissions".into(),
            TableDefinition::from_text("permissions", "INSERT INTO permissions VALUES (1);"),
        );

        let seeds = SeedCollection::separate(&order(), &tables, &Config::default());
        assert!(!seeds.render().contains("permissions"));
        assert_eq!(seeds.dropped.get("permissions"), Some(&1));
    }

    #[test]
    fn render_has_header_and_no_structure() {
        let seeds = SeedCollection::separate(&order(), &tables(), &Config::default());
        let content = seeds.render();
        assert!(content.starts_with(SEED_HEADER));
        assert!(!content.contains("CREATE TABLE"));
        assert!(content.contains("VALUES (1);\n\nINSERT INTO settings"));
    }

    #[test]
    fn empty_collection_is_only_the_header() {
        assert_eq!(SeedCollection::default().render(), SEED_HEADER);
    }
}
