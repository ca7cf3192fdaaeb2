//! Invocation of the external Cap'n Proto compiler.
//!
//! The compiler does the parsing; this module only assembles the command
//! line, captures the binary `CodeGeneratorRequest` from stdout, and hands
//! it to the decoder. On failure the compiler's exit code and stderr are
//! surfaced verbatim.

use crate::decode::decode_request;
use crate::errors::{LoadError, Result};
use capdiff_model::ParsedSchema;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Environment variable overriding the compiler binary.
pub const CAPNP_ENV: &str = "CAPNP";

/// Configured `capnp` invocation.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    binary: PathBuf,
    import_paths: Vec<PathBuf>,
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        SchemaCompiler::new()
    }
}

impl SchemaCompiler {
    /// Use the binary named by `$CAPNP`, falling back to `capnp` on PATH.
    pub fn new() -> SchemaCompiler {
        let binary = std::env::var_os(CAPNP_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("capnp"));
        SchemaCompiler {
            binary,
            import_paths: Vec::new(),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> SchemaCompiler {
        SchemaCompiler {
            binary: binary.into(),
            import_paths: Vec::new(),
        }
    }

    pub fn add_import_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.import_paths.push(path.into());
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// The argument vector for a compile of `files`.
    fn arguments(&self, files: &[PathBuf]) -> Vec<OsString> {
        let mut args = vec![OsString::from("compile"), OsString::from("--output=-")];
        for path in &self.import_paths {
            args.push(OsString::from("--import-path"));
            args.push(path.clone().into_os_string());
        }
        for file in files {
            args.push(file.clone().into_os_string());
        }
        args
    }

    /// Compile `files` and decode the resulting request.
    pub fn compile(&self, files: &[PathBuf]) -> Result<ParsedSchema> {
        let args = self.arguments(files);
        debug!(binary = %self.binary.display(), ?args, "invoking schema compiler");
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|source| LoadError::Spawn {
                command: self.binary.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(LoadError::Compiler {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        debug!(bytes = output.stdout.len(), "schema compiler finished");
        decode_request(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_assembly() {
        let mut compiler = SchemaCompiler::with_binary("/opt/capnp");
        compiler.add_import_path("/usr/include");
        compiler.add_import_path("vendor/schemas");
        let args = compiler.arguments(&[PathBuf::from("a.capnp"), PathBuf::from("b.capnp")]);
        let rendered: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "compile",
                "--output=-",
                "--import-path",
                "/usr/include",
                "--import-path",
                "vendor/schemas",
                "a.capnp",
                "b.capnp",
            ]
        );
    }

    #[test]
    fn test_missing_binary_reports_spawn_failure() {
        let compiler = SchemaCompiler::with_binary("/nonexistent/capnp-test-binary");
        let err = compiler
            .compile(&[PathBuf::from("a.capnp")])
            .unwrap_err();
        assert!(matches!(err, LoadError::Spawn { .. }), "{err}");
    }
}
