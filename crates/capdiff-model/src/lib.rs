//! capdiff-model - Schema data model
//!
//! This crate provides the in-memory representation of a parsed Cap'n Proto
//! schema, as produced by decoding the compiler's `CodeGeneratorRequest`
//! output:
//! - Node tree: files, structs, enums, interfaces, consts, annotations
//! - Member payloads: fields, enumerants, methods
//! - The `Type` and `Value` sum types used for compatibility and default
//!   comparison
//! - Word-level accessors over segmented messages (`wire`), which back
//!   pointer-typed values

pub mod id;
pub mod node;
pub mod schema;
pub mod ty;
pub mod value;
pub mod wire;

pub use id::{MemberKey, NodeId};
pub use node::{
    AnnotationBody, AnnotationTarget, AnnotationTargets, ConstBody, EnumBody, Enumerant, Field,
    FieldKind, InterfaceBody, Method, NestedNode, Node, NodeBody, NodeKind, Ordinal, StructBody,
};
pub use schema::{NodeSourceInfo, ParsedSchema, RequestedFile, SourceLocation};
pub use ty::Type;
pub use value::{PointerValue, Value};
pub use wire::{Message, PtrRef, WireError};
