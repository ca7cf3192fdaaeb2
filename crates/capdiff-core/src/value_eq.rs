//! Structural equality over encoded constant and default values.
//!
//! The encoding XORs stored words with the declared default, so the
//! canonical "zero" representation, an explicitly-zero object, and an
//! absent pointer all denote the same logical value. This comparator
//! implements that notion of sameness: a null pointer equals an all-zero
//! struct of any width and a zero-length list, trailing zero words are
//! ignored, and extra pointer slots must be default pointers. Words are
//! read straight out of the message segments; the walk does not allocate.

use crate::error::{DiffError, Result};
use capdiff_model::wire::{ElementSize, ListRef, Message, PtrRef, ResolvedPtr, StructRef};
use capdiff_model::{PointerValue, Value};

/// Test whether two values denote the same logical constant/default.
///
/// # Errors
///
/// - `UnsupportedValueEquality` - cross-kind comparison other than
///   enum/UInt16, or differently-typed lists (recoverable: callers emit an
///   `unsupported` change record)
/// - `NonNullInterfacePointer` - a capability pointer inside a value
/// - `Wire` - a malformed value message (implementation error)
pub fn values_equal(old: &Value, new: &Value) -> Result<bool> {
    match (old, new) {
        (Value::Void, Value::Void) => Ok(true),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Int8(a), Value::Int8(b)) => Ok(a == b),
        (Value::Int16(a), Value::Int16(b)) => Ok(a == b),
        (Value::Int32(a), Value::Int32(b)) => Ok(a == b),
        (Value::Int64(a), Value::Int64(b)) => Ok(a == b),
        (Value::Uint8(a), Value::Uint8(b)) => Ok(a == b),
        (Value::Uint16(a), Value::Uint16(b)) => Ok(a == b),
        (Value::Uint32(a), Value::Uint32(b)) => Ok(a == b),
        (Value::Uint64(a), Value::Uint64(b)) => Ok(a == b),
        // Bit equality: the encoding stores bits, and NaN defaults must
        // compare equal to themselves.
        (Value::Float32(a), Value::Float32(b)) => Ok(a.to_bits() == b.to_bits()),
        (Value::Float64(a), Value::Float64(b)) => Ok(a.to_bits() == b.to_bits()),
        (Value::Text(a), Value::Text(b)) => Ok(a == b),
        (Value::Data(a), Value::Data(b)) => Ok(a == b),
        (Value::Enum(a), Value::Enum(b)) => Ok(a == b),
        // An enum's integer code compares against a UInt16 directly; this
        // pairs with the enum-to-UInt16 compatibility rule.
        (Value::Enum(code), Value::Uint16(raw)) | (Value::Uint16(raw), Value::Enum(code)) => {
            Ok(code == raw)
        }
        // Interface-typed values carry no payload (the pointer must be
        // null), so two of them are always equal.
        (Value::Interface, Value::Interface) => Ok(true),
        (Value::List(a), Value::List(b))
        | (Value::Struct(a), Value::Struct(b))
        | (Value::AnyPointer(a), Value::AnyPointer(b)) => pointer_values_equal(a, b),
        (a, b) => Err(DiffError::UnsupportedValueEquality {
            reason: format!(
                "cannot compare a {} value with a {} value",
                a.kind_name(),
                b.kind_name()
            ),
        }),
    }
}

fn pointer_values_equal(a: &PointerValue, b: &PointerValue) -> Result<bool> {
    pointers_equal(&a.message, a.root, &b.message, b.root)
}

fn pointers_equal(am: &Message, ap: PtrRef, bm: &Message, bp: PtrRef) -> Result<bool> {
    let ar = am.resolve(ap)?;
    let br = bm.resolve(bp)?;
    match (ar, br) {
        (ResolvedPtr::Capability(_), _) | (_, ResolvedPtr::Capability(_)) => {
            Err(DiffError::NonNullInterfacePointer)
        }
        (ResolvedPtr::Null, ResolvedPtr::Null) => Ok(true),
        (ResolvedPtr::Null, ResolvedPtr::Struct(s)) => struct_is_default(bm, &s),
        (ResolvedPtr::Struct(s), ResolvedPtr::Null) => struct_is_default(am, &s),
        (ResolvedPtr::Null, ResolvedPtr::List(l)) => Ok(l.count == 0),
        (ResolvedPtr::List(l), ResolvedPtr::Null) => Ok(l.count == 0),
        (ResolvedPtr::Struct(a), ResolvedPtr::Struct(b)) => structs_equal(am, &a, bm, &b),
        (ResolvedPtr::List(a), ResolvedPtr::List(b)) => lists_equal(am, &a, bm, &b),
        (ResolvedPtr::Struct(_), ResolvedPtr::List(_))
        | (ResolvedPtr::List(_), ResolvedPtr::Struct(_)) => {
            Err(DiffError::UnsupportedValueEquality {
                reason: "struct pointer compared with list pointer".to_string(),
            })
        }
    }
}

/// Compare two structs: the overlapping data words must match, trailing
/// words on the wider side must be zero, overlapping pointers compare
/// recursively, and extra pointer slots must be default pointers.
fn structs_equal(am: &Message, a: &StructRef, bm: &Message, b: &StructRef) -> Result<bool> {
    let common_data = a.data_words.min(b.data_words);
    for i in 0..common_data {
        if a.data_word(am, i) != b.data_word(bm, i) {
            return Ok(false);
        }
    }
    for i in common_data..a.data_words {
        if a.data_word(am, i) != 0 {
            return Ok(false);
        }
    }
    for i in common_data..b.data_words {
        if b.data_word(bm, i) != 0 {
            return Ok(false);
        }
    }

    let common_ptrs = a.ptr_words.min(b.ptr_words);
    for i in 0..common_ptrs {
        if !pointers_equal(am, a.ptr(i), bm, b.ptr(i))? {
            return Ok(false);
        }
    }
    for i in common_ptrs..a.ptr_words {
        if !pointer_is_default(am, a.ptr(i))? {
            return Ok(false);
        }
    }
    for i in common_ptrs..b.ptr_words {
        if !pointer_is_default(bm, b.ptr(i))? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn lists_equal(am: &Message, a: &ListRef, bm: &Message, b: &ListRef) -> Result<bool> {
    if a.count != b.count {
        return Ok(false);
    }
    match (a.elem, b.elem) {
        (ElementSize::Composite, ElementSize::Composite) => {
            for i in 0..a.count {
                let (Some(ea), Some(eb)) = (a.composite_element(i), b.composite_element(i))
                else {
                    return Err(DiffError::UnsupportedValueEquality {
                        reason: "composite list without a tag".to_string(),
                    });
                };
                if !structs_equal(am, &ea, bm, &eb)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (ElementSize::Pointer, ElementSize::Pointer) => {
            for i in 0..a.count {
                if !pointers_equal(am, a.ptr_element(i), bm, b.ptr_element(i))? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (ea, eb) if ea == eb => {
            // Bit- or byte-packed: compare the covered bytes, masking the
            // partial final byte of bit lists.
            let len = a.packed_len_bytes();
            if len == 0 {
                return Ok(true);
            }
            for i in 0..len - 1 {
                if a.byte(am, i) != b.byte(bm, i) {
                    return Ok(false);
                }
            }
            let mask = last_byte_mask(a);
            Ok(a.byte(am, len - 1) & mask == b.byte(bm, len - 1) & mask)
        }
        (ea, eb) => Err(DiffError::UnsupportedValueEquality {
            reason: format!("differently-typed lists ({ea:?} vs {eb:?})"),
        }),
    }
}

/// Mask selecting the meaningful bits of a packed list's final byte.
fn last_byte_mask(list: &ListRef) -> u8 {
    if list.elem != ElementSize::Bit {
        return 0xff;
    }
    match list.count % 8 {
        0 => 0xff,
        n => (1u8 << n) - 1,
    }
}

/// A default pointer is null, or points at an all-zero struct or a
/// zero-length list; all three are indistinguishable from absent.
fn pointer_is_default(msg: &Message, ptr: PtrRef) -> Result<bool> {
    match msg.resolve(ptr)? {
        ResolvedPtr::Null => Ok(true),
        ResolvedPtr::Struct(s) => struct_is_default(msg, &s),
        ResolvedPtr::List(l) => Ok(l.count == 0),
        ResolvedPtr::Capability(_) => Err(DiffError::NonNullInterfacePointer),
    }
}

fn struct_is_default(msg: &Message, s: &StructRef) -> Result<bool> {
    for i in 0..s.data_words {
        if s.data_word(msg, i) != 0 {
            return Ok(false);
        }
    }
    for i in 0..s.ptr_words {
        if !pointer_is_default(msg, s.ptr(i))? {
            return Ok(false);
        }
    }
    Ok(true)
}
