use crate::id::NodeId;
use std::fmt;

/// A field, constant, or annotation type.
///
/// Referenced entities (enums, structs, interfaces) are carried by node id;
/// `brand_scope_count` is non-zero when the reference is branded with
/// generic parameters, which the differ rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Text,
    Data,
    List(Box<Type>),
    Enum {
        type_id: NodeId,
    },
    Struct {
        type_id: NodeId,
        brand_scope_count: u32,
    },
    Interface {
        type_id: NodeId,
        brand_scope_count: u32,
    },
    AnyPointer,
}

impl Type {
    /// Whether the two types are the same kind of type, ignoring referenced
    /// ids and element types.
    pub fn same_kind(&self, other: &Type) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Short name of the type kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Type::Void => "Void",
            Type::Bool => "Bool",
            Type::Int8 => "Int8",
            Type::Int16 => "Int16",
            Type::Int32 => "Int32",
            Type::Int64 => "Int64",
            Type::Uint8 => "UInt8",
            Type::Uint16 => "UInt16",
            Type::Uint32 => "UInt32",
            Type::Uint64 => "UInt64",
            Type::Float32 => "Float32",
            Type::Float64 => "Float64",
            Type::Text => "Text",
            Type::Data => "Data",
            Type::List(_) => "List",
            Type::Enum { .. } => "enum",
            Type::Struct { .. } => "struct",
            Type::Interface { .. } => "interface",
            Type::AnyPointer => "AnyPointer",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::List(elem) => write!(f, "List({elem})"),
            Type::Enum { type_id } => write!(f, "enum {type_id}"),
            Type::Struct { type_id, .. } => write!(f, "struct {type_id}"),
            Type::Interface { type_id, .. } => write!(f, "interface {type_id}"),
            other => f.write_str(other.kind_name()),
        }
    }
}
