//! Integration tests for table extraction

use pretty_assertions::assert_eq;
use schemasplit_core::ExtractConfig;
use schemasplit_sql::{load_extracted, TableExtractor};
use std::fs;

const MAIN_SQL: &str = "\
-- main schema dump
CREATE TABLE IF NOT EXISTS `roles` (
  `id` INT NOT NULL,
  PRIMARY KEY (`id`)
) ENGINE=InnoDB;

CREATE TABLE IF NOT EXISTS `users` (
  `id` INT NOT NULL,
  `role_id` INT NOT NULL,
  CONSTRAINT `fk_users_role` FOREIGN KEY (`role_id`) REFERENCES `roles` (`id`)
) ENGINE=InnoDB;

INSERT INTO `roles` (`id`) VALUES (1);

CREATE TABLE IF NOT EXISTS `prompts` (
  `id` INT NOT NULL
) ENGINE=InnoDB;
";

const REMOVED_SQL: &str = "CREATE TABLE IF NOT EXISTS `legacy` (`id` INT) ENGINE=InnoDB;";

const DATA_SQL: &str = "INSERT INTO `orphan_log` (`id`) VALUES (1);\nINSERT INTO `roles` (`id`) VALUES (2);";

#[test]
fn extract_write_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let sources = dir.path();
    fs::write(sources.join("01_main.sql"), MAIN_SQL).unwrap();
    fs::write(sources.join("02_data.sql"), DATA_SQL).unwrap();
    fs::write(sources.join("remove_legacy.sql"), REMOVED_SQL).unwrap();
    fs::write(sources.join("notes.txt"), "CREATE TABLE ignored (id INT);").unwrap();

    let config = ExtractConfig::default();
    let extraction = TableExtractor::new(&config).scan(sources).unwrap();

    assert_eq!(extraction.scanned_files.len(), 2);
    assert_eq!(extraction.skipped_files.len(), 1);
    assert!(extraction.excluded_hits.contains("prompts"));

    let names: Vec<_> = extraction.tables.keys().cloned().collect();
    assert_eq!(names, vec!["orphan_log", "roles", "users"]);

    let out_dir = sources.join("_schema_extracted");
    fs::create_dir_all(&out_dir).unwrap();
    fs::write(out_dir.join("stale.sql"), "CREATE TABLE stale (id INT);").unwrap();

    let written = extraction.write(&out_dir).unwrap();
    assert_eq!(written, 3);
    assert!(!out_dir.join("stale.sql").exists());

    let roles_file = fs::read_to_string(out_dir.join("roles.sql")).unwrap();
    assert!(roles_file.starts_with("-- Extracted definition for roles\nCREATE TABLE IF NOT EXISTS `roles`"));

    let tables = load_extracted(&out_dir).unwrap();
    let roles = tables.iter().find(|t| t.name == "roles").unwrap();
    assert_eq!(roles.structural.len(), 1);
    assert_eq!(
        roles.data,
        vec![
            "INSERT INTO `roles` (`id`) VALUES (1);".to_string(),
            "INSERT INTO `roles` (`id`) VALUES (2);".to_string(),
        ]
    );

    let users = tables.iter().find(|t| t.name == "users").unwrap();
    assert_eq!(users.dependencies().into_iter().collect::<Vec<_>>(), vec!["roles"]);

    let orphan = tables.iter().find(|t| t.name == "orphan_log").unwrap();
    assert!(!orphan.has_structure());
}

#[test]
fn extraction_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.sql"), DATA_SQL).unwrap();
    fs::write(dir.path().join("a.sql"), MAIN_SQL).unwrap();

    let config = ExtractConfig::default();
    let first = TableExtractor::new(&config).scan(dir.path()).unwrap();
    let second = TableExtractor::new(&config).scan(dir.path()).unwrap();
    assert_eq!(first, second);
}
