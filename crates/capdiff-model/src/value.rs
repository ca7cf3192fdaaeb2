use crate::wire::{Message, PtrRef};
use std::sync::Arc;

/// A constant or default value attached to a schema node or field.
///
/// Primitive, text, and data payloads are decoded eagerly. Pointer-typed
/// payloads (`List`, `Struct`, `AnyPointer`) stay in their encoded form so
/// the comparator can walk them word by word.
#[derive(Debug, Clone)]
pub enum Value {
    Void,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Data(Vec<u8>),
    Enum(u16),
    List(PointerValue),
    Struct(PointerValue),
    AnyPointer(PointerValue),
    /// An interface-typed value; the encoded pointer must be null, so no
    /// payload is kept.
    Interface,
}

impl Value {
    /// Short name of the value kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Void => "Void",
            Value::Bool(_) => "Bool",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Uint8(_) => "UInt8",
            Value::Uint16(_) => "UInt16",
            Value::Uint32(_) => "UInt32",
            Value::Uint64(_) => "UInt64",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::Text(_) => "Text",
            Value::Data(_) => "Data",
            Value::Enum(_) => "enum",
            Value::List(_) => "List",
            Value::Struct(_) => "struct",
            Value::AnyPointer(_) => "AnyPointer",
            Value::Interface => "interface",
        }
    }
}

/// A pointer-typed value: a shared segmented message plus the location of
/// the value's root pointer word within it.
#[derive(Debug, Clone)]
pub struct PointerValue {
    pub message: Arc<Message>,
    pub root: PtrRef,
}

impl PointerValue {
    /// A value rooted at the message's own root pointer.
    pub fn new(message: Arc<Message>) -> PointerValue {
        let root = message.root();
        PointerValue { message, root }
    }

    /// The absent value: a null root pointer.
    pub fn null() -> PointerValue {
        PointerValue::new(Arc::new(Message::empty()))
    }
}
