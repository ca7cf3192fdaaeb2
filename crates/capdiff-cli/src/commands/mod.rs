//! CLI subcommands.

pub mod check;
pub mod diff;

use capdiff_core::{diff_schemas, SchemaDiff};
use capdiff_loader::{RevisionTree, SchemaCompiler};
use clap::Args;
use std::path::PathBuf;

/// Input selection shared by `diff` and `check`.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Old schema file (the baseline; repeatable)
    #[arg(long = "old", value_name = "FILE", required = true, num_args = 1..)]
    pub old: Vec<PathBuf>,

    /// New schema file (repeatable)
    #[arg(long = "new", value_name = "FILE", required = true, num_args = 1..)]
    pub new: Vec<PathBuf>,

    /// Read the old side from a git revision instead of the working tree
    #[arg(long, value_name = "REV")]
    pub old_git: Option<String>,

    /// Directory to add to the compiler's import path (repeatable)
    #[arg(long = "import-path", short = 'I', value_name = "DIR")]
    pub import_paths: Vec<PathBuf>,

    /// Path to the capnp compiler binary
    #[arg(long, env = "CAPNP", default_value = "capnp", value_name = "BIN")]
    pub capnp: PathBuf,
}

impl InputArgs {
    /// Compile both sides and diff them.
    pub fn load_and_diff(&self) -> Result<SchemaDiff, Box<dyn std::error::Error>> {
        let mut compiler = SchemaCompiler::with_binary(&self.capnp);
        for path in &self.import_paths {
            compiler.add_import_path(path);
        }

        let old_schema = match &self.old_git {
            Some(revision) => {
                let tree = RevisionTree::materialize(revision, &self.old)?;
                let paths: Vec<PathBuf> = self.old.iter().map(|p| tree.path_of(p)).collect();
                compiler.compile(&paths)?
            }
            None => compiler.compile(&self.old)?,
        };
        let new_schema = compiler.compile(&self.new)?;

        Ok(diff_schemas(&old_schema, &new_schema)?)
    }
}
