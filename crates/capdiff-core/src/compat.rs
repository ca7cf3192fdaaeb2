//! Type compatibility classification.
//!
//! Pure function from an `(old, new)` type pair to one of four classes,
//! following the wire-compatibility rules of the Cap'n Proto language. The
//! new-side node index is consulted for the list struct-upgrade rule.

use crate::error::{DiffError, Result};
use crate::node_index::NodeIndex;
use capdiff_model::{FieldKind, NodeBody, Type};

/// How an old type relates to its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compat {
    /// Identical types; no change.
    Same,
    /// Distinct spellings of the same type. Reserved for generic-type
    /// handling; no current rule produces it, but it is treated exactly
    /// like `Same` wherever it appears.
    Equivalent,
    /// Wire-compatible but source-breaking.
    Compatible,
    /// Encoded messages may be misread.
    Incompatible,
}

/// Classify the replacement of `old` by `new`.
///
/// # Errors
///
/// - `UnsupportedGenerics` - a struct/interface pair carries brand scopes
/// - `MissingNode` - the struct-upgrade rule referenced an unknown node
pub fn type_compat(old: &Type, new: &Type, new_nodes: &NodeIndex) -> Result<Compat> {
    use Type::*;
    match (old, new) {
        (Void, Void)
        | (Bool, Bool)
        | (Int8, Int8)
        | (Int16, Int16)
        | (Int32, Int32)
        | (Int64, Int64)
        | (Uint8, Uint8)
        | (Uint16, Uint16)
        | (Uint32, Uint32)
        | (Uint64, Uint64)
        | (Float32, Float32)
        | (Float64, Float64)
        | (Text, Text)
        | (Data, Data)
        | (AnyPointer, AnyPointer) => Ok(Compat::Same),

        // Every pointer type may be widened to AnyPointer.
        (Text | Data | List(_) | Struct { .. } | Interface { .. }, AnyPointer) => {
            Ok(Compat::Compatible)
        }

        // Enums encode as unsigned 16-bit.
        (Enum { .. }, Uint16) => Ok(Compat::Compatible),
        (Enum { type_id: old_id }, Enum { type_id: new_id }) => Ok(if old_id == new_id {
            Compat::Same
        } else {
            Compat::Incompatible
        }),

        // Text and List(UInt8) may be reinterpreted as Data (and Data as
        // List(UInt8)); the encodings coincide.
        (Text, Data) => Ok(Compat::Compatible),
        (List(elem), Data) if **elem == Uint8 => Ok(Compat::Compatible),
        (Data, List(elem)) if **elem == Uint8 => Ok(Compat::Compatible),

        (
            Struct {
                type_id: old_id,
                brand_scope_count: old_brands,
            },
            Struct {
                type_id: new_id,
                brand_scope_count: new_brands,
            },
        ) => {
            if *old_brands > 0 || *new_brands > 0 {
                return Err(DiffError::UnsupportedGenerics {
                    kind: "struct",
                    id: *new_id,
                });
            }
            Ok(if old_id == new_id {
                Compat::Same
            } else {
                Compat::Incompatible
            })
        }
        (
            Interface {
                type_id: old_id,
                brand_scope_count: old_brands,
            },
            Interface {
                type_id: new_id,
                brand_scope_count: new_brands,
            },
        ) => {
            if *old_brands > 0 || *new_brands > 0 {
                return Err(DiffError::UnsupportedGenerics {
                    kind: "interface",
                    id: *new_id,
                });
            }
            Ok(if old_id == new_id {
                Compat::Same
            } else {
                Compat::Incompatible
            })
        }

        (List(old_elem), List(new_elem)) => {
            if list_struct_upgrade(old_elem, new_elem, new_nodes)? {
                return Ok(Compat::Compatible);
            }
            type_compat(old_elem, new_elem, new_nodes)
        }

        _ => Ok(Compat::Incompatible),
    }
}

/// The struct-upgrade rule: `List(P)` may become `List(S)` when `P` matches
/// the kind of `S`'s first field. Bool lists are explicitly excluded
/// because their bit packing has no struct equivalent.
fn list_struct_upgrade(
    old_elem: &Type,
    new_elem: &Type,
    new_nodes: &NodeIndex,
) -> Result<bool> {
    let Type::Struct { type_id, .. } = new_elem else {
        return Ok(false);
    };
    let upgradable = matches!(
        old_elem,
        Type::Int8
            | Type::Int16
            | Type::Int32
            | Type::Int64
            | Type::Uint8
            | Type::Uint16
            | Type::Uint32
            | Type::Uint64
            | Type::Float32
            | Type::Float64
            | Type::Text
            | Type::Data
            | Type::List(_)
    );
    if !upgradable {
        return Ok(false);
    }
    let node = new_nodes.node(*type_id)?;
    let NodeBody::Struct(body) = &node.body else {
        return Ok(false);
    };
    let Some(first) = body.fields.first() else {
        return Ok(false);
    };
    let FieldKind::Slot { ty, .. } = &first.kind else {
        return Ok(false);
    };
    Ok(old_elem.same_kind(ty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use capdiff_model::{
        Field, NodeId, Node, Ordinal, ParsedSchema, StructBody, Value,
    };

    /// A schema with one struct `0x10` whose first field is UInt32, and an
    /// empty struct `0x11`.
    fn new_side() -> ParsedSchema {
        let first_field = Field {
            name: "value".to_string(),
            ordinal: Ordinal::Implicit,
            kind: FieldKind::Slot {
                ty: Type::Uint32,
                default: Value::Uint32(0),
            },
        };
        ParsedSchema {
            nodes: vec![
                Node {
                    id: NodeId(0x10),
                    display_name: "S".to_string(),
                    display_name_prefix_length: 0,
                    scope_id: NodeId(1),
                    nested: Vec::new(),
                    body: NodeBody::Struct(StructBody {
                        fields: vec![first_field],
                        is_group: false,
                    }),
                },
                Node {
                    id: NodeId(0x11),
                    display_name: "Empty".to_string(),
                    display_name_prefix_length: 0,
                    scope_id: NodeId(1),
                    nested: Vec::new(),
                    body: NodeBody::Struct(StructBody {
                        fields: Vec::new(),
                        is_group: false,
                    }),
                },
            ],
            requested_files: Vec::new(),
            source_info: Vec::new(),
        }
    }

    fn compat(old: &Type, new: &Type) -> Compat {
        let schema = new_side();
        let index = NodeIndex::build(&schema);
        type_compat(old, new, &index).unwrap()
    }

    fn strukt(id: u64) -> Type {
        Type::Struct {
            type_id: NodeId(id),
            brand_scope_count: 0,
        }
    }

    #[test]
    fn test_primitives_same_with_themselves() {
        for ty in [
            Type::Void,
            Type::Bool,
            Type::Int8,
            Type::Int16,
            Type::Int32,
            Type::Int64,
            Type::Uint8,
            Type::Uint16,
            Type::Uint32,
            Type::Uint64,
            Type::Float32,
            Type::Float64,
            Type::Text,
            Type::Data,
            Type::AnyPointer,
        ] {
            assert_eq!(compat(&ty, &ty), Compat::Same, "{ty:?}");
        }
    }

    #[test]
    fn test_integer_width_changes_are_incompatible() {
        assert_eq!(compat(&Type::Uint16, &Type::Uint32), Compat::Incompatible);
        assert_eq!(compat(&Type::Uint16, &Type::Uint8), Compat::Incompatible);
        assert_eq!(compat(&Type::Uint8, &Type::Uint16), Compat::Incompatible);
        assert_eq!(compat(&Type::Int32, &Type::Uint32), Compat::Incompatible);
    }

    #[test]
    fn test_pointer_types_widen_to_any_pointer() {
        for old in [
            Type::Text,
            Type::Data,
            Type::List(Box::new(Type::Uint8)),
            strukt(0x10),
            Type::Interface {
                type_id: NodeId(0x20),
                brand_scope_count: 0,
            },
        ] {
            assert_eq!(compat(&old, &Type::AnyPointer), Compat::Compatible, "{old:?}");
        }
        // Narrowing back is not wire-safe.
        assert_eq!(compat(&Type::AnyPointer, &Type::Text), Compat::Incompatible);
    }

    #[test]
    fn test_enum_uint16_asymmetry() {
        let e = Type::Enum {
            type_id: NodeId(0x30),
        };
        assert_eq!(compat(&e, &Type::Uint16), Compat::Compatible);
        assert_eq!(compat(&Type::Uint16, &e), Compat::Incompatible);
    }

    #[test]
    fn test_enum_identity() {
        let a = Type::Enum {
            type_id: NodeId(0x30),
        };
        let b = Type::Enum {
            type_id: NodeId(0x31),
        };
        assert_eq!(compat(&a, &a.clone()), Compat::Same);
        assert_eq!(compat(&a, &b), Compat::Incompatible);
    }

    #[test]
    fn test_data_and_byte_lists_interchange() {
        let bytes = Type::List(Box::new(Type::Uint8));
        assert_eq!(compat(&Type::Text, &Type::Data), Compat::Compatible);
        assert_eq!(compat(&bytes, &Type::Data), Compat::Compatible);
        assert_eq!(compat(&Type::Data, &bytes), Compat::Compatible);
        // Only UInt8 lists coincide with Data.
        let words = Type::List(Box::new(Type::Uint16));
        assert_eq!(compat(&words, &Type::Data), Compat::Incompatible);
        assert_eq!(compat(&Type::Data, &Type::Text), Compat::Incompatible);
    }

    #[test]
    fn test_struct_identity_and_generics() {
        assert_eq!(compat(&strukt(0x10), &strukt(0x10)), Compat::Same);
        assert_eq!(compat(&strukt(0x10), &strukt(0x11)), Compat::Incompatible);

        let schema = new_side();
        let index = NodeIndex::build(&schema);
        let branded = Type::Struct {
            type_id: NodeId(0x10),
            brand_scope_count: 1,
        };
        assert!(matches!(
            type_compat(&strukt(0x10), &branded, &index),
            Err(DiffError::UnsupportedGenerics { kind: "struct", .. })
        ));
    }

    #[test]
    fn test_list_recursion() {
        let a = Type::List(Box::new(Type::Uint16));
        let b = Type::List(Box::new(Type::Uint32));
        assert_eq!(compat(&a, &a.clone()), Compat::Same);
        assert_eq!(compat(&a, &b), Compat::Incompatible);
        // Element-level compatibility carries through.
        let enums = Type::List(Box::new(Type::Enum {
            type_id: NodeId(0x30),
        }));
        let words = Type::List(Box::new(Type::Uint16));
        assert_eq!(compat(&enums, &words), Compat::Compatible);
    }

    #[test]
    fn test_list_struct_upgrade() {
        let structs = Type::List(Box::new(strukt(0x10)));
        // First field of S is UInt32.
        assert_eq!(
            compat(&Type::List(Box::new(Type::Uint32)), &structs),
            Compat::Compatible
        );
        // Kind mismatch: no upgrade.
        assert_eq!(
            compat(&Type::List(Box::new(Type::Uint16)), &structs),
            Compat::Incompatible
        );
        // Bool lists are excluded even if the first field were bool.
        assert_eq!(
            compat(&Type::List(Box::new(Type::Bool)), &structs),
            Compat::Incompatible
        );
        // A struct with no fields offers nothing to upgrade into.
        let empty = Type::List(Box::new(strukt(0x11)));
        assert_eq!(
            compat(&Type::List(Box::new(Type::Uint32)), &empty),
            Compat::Incompatible
        );
    }

    #[test]
    fn test_cross_kind_is_incompatible() {
        assert_eq!(compat(&Type::Text, &Type::Uint32), Compat::Incompatible);
        assert_eq!(compat(&Type::Bool, &Type::Void), Compat::Incompatible);
        assert_eq!(
            compat(&strukt(0x10), &Type::Data),
            Compat::Incompatible
        );
    }
}
