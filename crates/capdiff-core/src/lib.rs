//! capdiff-core - Schema differ
//!
//! Computes the semantic difference between two parsed Cap'n Proto schemas
//! and classifies every change by the breakage it induces (`none`, `code`,
//! or `wire`). The crate is purely in-memory and deterministic: the differ
//! borrows both input schemas for the duration of one call and returns an
//! owned, sorted [`SchemaDiff`].
//!
//! Module layout follows the pipeline:
//! - `node_index` / `source_index` - lookup structures over one side
//! - `compat` - the four-class type compatibility function
//! - `value_eq` - structural equality over encoded default/const values
//! - `differ` - the lockstep walk emitting change records
//! - `report` - final `(file, start byte)` ordering and the file table

pub mod changes;
pub mod compat;
pub mod differ;
pub mod error;
pub mod node_index;
pub mod report;
pub mod source_index;
pub mod value_eq;

pub use changes::{
    Breakage, ChangeKind, EntityRef, FileEntry, MemberKind, MemberRef, NodeRef, Position,
    SchemaChange, SchemaDiff, SourceContext, TypedRef, TypedRefKind,
};
pub use compat::{type_compat, Compat};
pub use differ::diff_schemas;
pub use error::{DiffError, Result};
pub use value_eq::values_equal;
