//! Materialization of schema files from a git revision.
//!
//! `capdiff` is typically run against history ("did this commit break the
//! wire?"), so the old side of a diff often lives in a commit rather than
//! the working tree. This module extracts the requested files with
//! `git show REV:PATH` into a temporary directory that lives as long as
//! the value.

use crate::errors::{LoadError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

/// Schema files of one revision, extracted to a temporary directory.
pub struct RevisionTree {
    revision: String,
    dir: TempDir,
}

impl RevisionTree {
    /// Extract `paths` (repository-relative) as of `revision`.
    pub fn materialize(revision: &str, paths: &[PathBuf]) -> Result<RevisionTree> {
        let dir = tempfile::tempdir().map_err(|source| {
            LoadError::io("failed to create a temporary checkout directory", source)
        })?;

        for path in paths {
            let spec = format!("{revision}:{}", path.display());
            debug!(%spec, "materializing file from git");
            let output = Command::new("git")
                .arg("show")
                .arg(&spec)
                .output()
                .map_err(|source| LoadError::Spawn {
                    command: "git".to_string(),
                    source,
                })?;
            if !output.status.success() {
                return Err(LoadError::Git {
                    status: output.status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                });
            }

            let target = dir.path().join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    LoadError::io(format!("failed to create {}", parent.display()), source)
                })?;
            }
            std::fs::write(&target, &output.stdout).map_err(|source| {
                LoadError::io(format!("failed to write {}", target.display()), source)
            })?;
        }

        Ok(RevisionTree {
            revision: revision.to_string(),
            dir,
        })
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Where a repository-relative path was materialized to.
    pub fn path_of(&self, original: &Path) -> PathBuf {
        self.dir.path().join(original)
    }
}
