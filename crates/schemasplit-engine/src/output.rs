//! Output file writing

use crate::assign::Assignment;
use crate::seed::SeedCollection;
use schemasplit_core::Config;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A file produced by a split
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,

    /// Lines in the written content
    pub lines: usize,

    /// Hex SHA-256 of the written content
    pub sha256: String,
}

impl WrittenFile {
    fn of(path: PathBuf, content: &str) -> Self {
        Self {
            path,
            lines: content.lines().count(),
            sha256: digest(content),
        }
    }
}

/// Hex SHA-256 digest of a text
pub fn digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// Write every group file and the seed file, overwriting existing ones
///
/// Returns the group files in configured order followed by the seed file.
pub fn write_outputs(
    config: &Config,
    assignment: &Assignment,
    seeds: &SeedCollection,
) -> std::io::Result<Vec<WrittenFile>> {
    let mut written = Vec::with_capacity(config.groups.len() + 1);

    for (group, state) in config.groups.iter().zip(&assignment.groups) {
        let path = config.group_path(group);
        let content = state.render();
        write_file(&path, &content)?;
        tracing::debug!(group = %state.name, path = %path.display(), lines = state.lines, "wrote group file");
        written.push(WrittenFile::of(path, &content));
    }

    let path = config.seed_path();
    let content = seeds.render();
    write_file(&path, &content)?;
    tracing::debug!(path = %path.display(), statements = seeds.statements.len(), "wrote seed file");
    written.push(WrittenFile::of(path, &content));

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_hex() {
        let a = digest("CREATE TABLE roles (id INT);");
        assert_eq!(a.len(), 64);
        assert_eq!(a, digest("CREATE TABLE roles (id INT);"));
        assert_ne!(a, digest("CREATE TABLE users (id INT);"));
        assert_eq!(
            digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn writes_placeholders_for_empty_groups() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.project_root = dir.path().to_path_buf();

        let assignment = crate::assign::GroupAssignor::new(&config)
            .assign(&[], &Default::default())
            .unwrap();
        let written = write_outputs(&config, &assignment, &SeedCollection::default()).unwrap();

        assert_eq!(written.len(), config.groups.len() + 1);
        let core = std::fs::read_to_string(&written[0].path).unwrap();
        assert_eq!(core, "-- core schema pending\n");
        assert_eq!(written[0].sha256, digest(&core));
        assert!(written.last().unwrap().path.ends_with("10_seed_production.sql"));
    }
}
