//! capdiff-loader - External collaborators of the differ
//!
//! Everything the pure core does not do lives here:
//! - Invoking the Cap'n Proto compiler (`capnp compile --output=-`) and
//!   capturing its binary `CodeGeneratorRequest` output
//! - Decoding that output into the in-memory model
//! - Resolving change byte ranges to line/column positions and snippets
//! - Materializing schema files from a git revision for old/new diffs

pub mod compiler;
pub mod decode;
pub mod errors;
pub mod git;
pub mod locate;

pub use compiler::SchemaCompiler;
pub use decode::decode_request;
pub use errors::{LoadError, Result};
pub use git::RevisionTree;
pub use locate::attach_source_context;
