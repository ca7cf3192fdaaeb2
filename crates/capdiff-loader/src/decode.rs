//! Decoding of the compiler's `CodeGeneratorRequest` stream into the
//! in-memory model.
//!
//! Node structure is read through the `capnp` crate's bundled schema
//! readers. Two things are read at the word level instead:
//! - pointer-typed constant/default values are re-rooted into standalone
//!   messages so the core can compare them without decoding, and
//! - the `sourceInfo` byte-range fields, which older linked schemas do not
//!   expose as accessors; absent fields read as zero.

use crate::errors::Result;
use capdiff_model::wire::{ElementSize, Message, ResolvedPtr};
use capdiff_model::{
    AnnotationBody, AnnotationTarget, AnnotationTargets, ConstBody, EnumBody, Enumerant, Field,
    FieldKind, InterfaceBody, Method, NestedNode, Node, NodeBody, NodeId, NodeSourceInfo,
    Ordinal, ParsedSchema, PointerValue, RequestedFile, SourceLocation, StructBody, Type, Value,
};
use capnp::message::ReaderOptions;
use capnp::schema_capnp::{code_generator_request, field, node, type_, value};
use capnp::{any_pointer, serialize};
use std::sync::Arc;
use tracing::debug;

/// Decode a serialized `CodeGeneratorRequest` into a [`ParsedSchema`].
pub fn decode_request(bytes: &[u8]) -> Result<ParsedSchema> {
    let reader = serialize::read_message(&mut &bytes[..], ReaderOptions::new())?;
    let request = reader.get_root::<code_generator_request::Reader>()?;

    let mut nodes = Vec::new();
    for n in request.get_nodes()?.iter() {
        nodes.push(decode_node(n)?);
    }

    let mut requested_files = Vec::new();
    for rf in request.get_requested_files()?.iter() {
        requested_files.push(RequestedFile {
            id: NodeId(rf.get_id()),
            filename: rf.get_filename()?.to_str()?.to_owned(),
        });
    }

    let source_info = decode_source_info(bytes)?;

    debug!(
        nodes = nodes.len(),
        files = requested_files.len(),
        located = source_info.len(),
        "decoded code generator request"
    );
    Ok(ParsedSchema {
        nodes,
        requested_files,
        source_info,
    })
}

fn decode_node(n: node::Reader<'_>) -> Result<Node> {
    let mut nested = Vec::new();
    for entry in n.get_nested_nodes()?.iter() {
        nested.push(NestedNode {
            name: entry.get_name()?.to_str()?.to_owned(),
            id: NodeId(entry.get_id()),
        });
    }

    let body = match n.which()? {
        node::Which::File(()) => NodeBody::File,
        node::Which::Struct(s) => {
            let mut fields = Vec::new();
            for f in s.get_fields()?.iter() {
                fields.push(decode_field(f)?);
            }
            NodeBody::Struct(StructBody {
                fields,
                is_group: s.get_is_group(),
            })
        }
        node::Which::Enum(e) => {
            let mut enumerants = Vec::new();
            for en in e.get_enumerants()?.iter() {
                enumerants.push(Enumerant {
                    name: en.get_name()?.to_str()?.to_owned(),
                });
            }
            NodeBody::Enum(EnumBody { enumerants })
        }
        node::Which::Interface(i) => {
            let mut methods = Vec::new();
            for m in i.get_methods()?.iter() {
                methods.push(Method {
                    name: m.get_name()?.to_str()?.to_owned(),
                    param_type: NodeId(m.get_param_struct_type()),
                    result_type: NodeId(m.get_result_struct_type()),
                    param_brand_scopes: m.get_param_brand()?.get_scopes()?.len(),
                    result_brand_scopes: m.get_result_brand()?.get_scopes()?.len(),
                    implicit_parameters: m.get_implicit_parameters()?.len(),
                });
            }
            NodeBody::Interface(InterfaceBody { methods })
        }
        node::Which::Const(c) => NodeBody::Const(ConstBody {
            ty: decode_type(c.get_type()?)?,
            value: decode_value(c.get_value()?)?,
        }),
        node::Which::Annotation(a) => {
            let mut targets = AnnotationTargets::default();
            targets.set(AnnotationTarget::File, a.get_targets_file());
            targets.set(AnnotationTarget::Const, a.get_targets_const());
            targets.set(AnnotationTarget::Enum, a.get_targets_enum());
            targets.set(AnnotationTarget::Enumerant, a.get_targets_enumerant());
            targets.set(AnnotationTarget::Struct, a.get_targets_struct());
            targets.set(AnnotationTarget::Field, a.get_targets_field());
            targets.set(AnnotationTarget::Union, a.get_targets_union());
            targets.set(AnnotationTarget::Group, a.get_targets_group());
            targets.set(AnnotationTarget::Interface, a.get_targets_interface());
            targets.set(AnnotationTarget::Method, a.get_targets_method());
            targets.set(AnnotationTarget::Param, a.get_targets_param());
            targets.set(AnnotationTarget::Annotation, a.get_targets_annotation());
            NodeBody::Annotation(AnnotationBody {
                ty: decode_type(a.get_type()?)?,
                targets,
            })
        }
    };

    Ok(Node {
        id: NodeId(n.get_id()),
        display_name: n.get_display_name()?.to_str()?.to_owned(),
        display_name_prefix_length: n.get_display_name_prefix_length(),
        scope_id: NodeId(n.get_scope_id()),
        nested,
        body,
    })
}

fn decode_field(f: field::Reader<'_>) -> Result<Field> {
    let ordinal = match f.get_ordinal().which()? {
        field::ordinal::Which::Implicit(()) => Ordinal::Implicit,
        field::ordinal::Which::Explicit(n) => Ordinal::Explicit(n),
    };
    let kind = match f.which()? {
        field::Which::Slot(s) => FieldKind::Slot {
            ty: decode_type(s.get_type()?)?,
            default: decode_value(s.get_default_value()?)?,
        },
        field::Which::Group(g) => FieldKind::Group {
            type_id: NodeId(g.get_type_id()),
        },
    };
    Ok(Field {
        name: f.get_name()?.to_str()?.to_owned(),
        ordinal,
        kind,
    })
}

fn decode_type(t: type_::Reader<'_>) -> Result<Type> {
    Ok(match t.which()? {
        type_::Which::Void(()) => Type::Void,
        type_::Which::Bool(()) => Type::Bool,
        type_::Which::Int8(()) => Type::Int8,
        type_::Which::Int16(()) => Type::Int16,
        type_::Which::Int32(()) => Type::Int32,
        type_::Which::Int64(()) => Type::Int64,
        type_::Which::Uint8(()) => Type::Uint8,
        type_::Which::Uint16(()) => Type::Uint16,
        type_::Which::Uint32(()) => Type::Uint32,
        type_::Which::Uint64(()) => Type::Uint64,
        type_::Which::Float32(()) => Type::Float32,
        type_::Which::Float64(()) => Type::Float64,
        type_::Which::Text(()) => Type::Text,
        type_::Which::Data(()) => Type::Data,
        type_::Which::List(l) => Type::List(Box::new(decode_type(l.get_element_type()?)?)),
        type_::Which::Enum(e) => Type::Enum {
            type_id: NodeId(e.get_type_id()),
        },
        type_::Which::Struct(s) => Type::Struct {
            type_id: NodeId(s.get_type_id()),
            brand_scope_count: s.get_brand()?.get_scopes()?.len(),
        },
        type_::Which::Interface(i) => Type::Interface {
            type_id: NodeId(i.get_type_id()),
            brand_scope_count: i.get_brand()?.get_scopes()?.len(),
        },
        type_::Which::AnyPointer(_) => Type::AnyPointer,
    })
}

fn decode_value(v: value::Reader<'_>) -> Result<Value> {
    Ok(match v.which()? {
        value::Which::Void(()) => Value::Void,
        value::Which::Bool(b) => Value::Bool(b),
        value::Which::Int8(n) => Value::Int8(n),
        value::Which::Int16(n) => Value::Int16(n),
        value::Which::Int32(n) => Value::Int32(n),
        value::Which::Int64(n) => Value::Int64(n),
        value::Which::Uint8(n) => Value::Uint8(n),
        value::Which::Uint16(n) => Value::Uint16(n),
        value::Which::Uint32(n) => Value::Uint32(n),
        value::Which::Uint64(n) => Value::Uint64(n),
        value::Which::Float32(n) => Value::Float32(n),
        value::Which::Float64(n) => Value::Float64(n),
        value::Which::Text(t) => Value::Text(t?.to_str()?.to_owned()),
        value::Which::Data(d) => Value::Data(d?.to_vec()),
        value::Which::Enum(code) => Value::Enum(code),
        value::Which::List(p) => Value::List(reroot_pointer(p)?),
        value::Which::Struct(p) => Value::Struct(reroot_pointer(p)?),
        value::Which::AnyPointer(p) => Value::AnyPointer(reroot_pointer(p)?),
        value::Which::Interface(()) => Value::Interface,
    })
}

/// Deep-copy a pointer value into its own standalone message so the core
/// can compare it at the word level after the request reader is gone.
fn reroot_pointer(any: any_pointer::Reader<'_>) -> Result<PointerValue> {
    if any.is_null() {
        return Ok(PointerValue::null());
    }
    let mut builder = capnp::message::Builder::new_default();
    let mut root = builder.init_root::<any_pointer::Builder>();
    root.set_as(any)?;
    let bytes = serialize::write_message_to_words(&builder);
    let message = Message::from_bytes(&bytes)?;
    Ok(PointerValue::new(Arc::new(message)))
}

/// Read the request's `sourceInfo` table at the word level.
///
/// Layout (no unions involved, so the offsets are fixed): `sourceInfo` is
/// the fourth pointer of the root struct; each entry is
/// `{ id: UInt64 @ word 0, docComment: ptr 0, members: ptr 1,
///    startByte/endByte: UInt32 @ u32 slots 2/3 }`, and each member is
/// `{ docComment: ptr 0, startByte/endByte: UInt32 @ u32 slots 0/1 }`.
fn decode_source_info(bytes: &[u8]) -> Result<Vec<NodeSourceInfo>> {
    let message = Message::from_bytes(bytes)?;
    let ResolvedPtr::Struct(root) = message.resolve(message.root())? else {
        return Ok(Vec::new());
    };
    if root.ptr_words <= 3 {
        return Ok(Vec::new());
    }
    let ResolvedPtr::List(list) = message.resolve(root.ptr(3))? else {
        return Ok(Vec::new());
    };
    if list.elem != ElementSize::Composite {
        return Ok(Vec::new());
    }

    let mut infos = Vec::with_capacity(list.count as usize);
    for i in 0..list.count {
        let Some(entry) = list.composite_element(i) else {
            continue;
        };
        let id = NodeId(entry.get_u64(&message, 0));
        let range = SourceLocation::new(entry.get_u32(&message, 2), entry.get_u32(&message, 3));

        let mut members = Vec::new();
        if entry.ptr_words > 1 {
            if let ResolvedPtr::List(member_list) = message.resolve(entry.ptr(1))? {
                if member_list.elem == ElementSize::Composite {
                    for j in 0..member_list.count {
                        if let Some(m) = member_list.composite_element(j) {
                            members.push(SourceLocation::new(
                                m.get_u32(&message, 0),
                                m.get_u32(&message, 1),
                            ));
                        }
                    }
                }
            }
        }
        infos.push(NodeSourceInfo { id, range, members });
    }
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capnp::message::Builder;

    /// Build a small request with one file and one struct with a text
    /// field, exercising names, types, defaults, and nested entries.
    fn sample_request() -> Vec<u8> {
        let mut message = Builder::new_default();
        {
            let request = message.init_root::<code_generator_request::Builder>();
            let mut nodes = request.init_nodes(2);

            {
                let mut file = nodes.reborrow().get(0);
                file.set_id(0xf1);
                file.set_display_name("sample.capnp");
                file.set_display_name_prefix_length(0);
                file.set_scope_id(0);
                file.set_file(());
                let mut nested = file.init_nested_nodes(1);
                let mut entry = nested.reborrow().get(0);
                entry.set_name("Person");
                entry.set_id(0xa1);
            }

            {
                let mut person = nodes.reborrow().get(1);
                person.set_id(0xa1);
                person.set_display_name("sample.capnp:Person");
                person.set_display_name_prefix_length(13);
                person.set_scope_id(0xf1);
                let strukt = person.init_struct();
                let mut fields = strukt.init_fields(1);
                let mut name_field = fields.reborrow().get(0);
                name_field.set_name("name");
                name_field.reborrow().init_ordinal().set_explicit(0);
                let mut slot = name_field.init_slot();
                slot.reborrow().init_type().set_text(());
                slot.init_default_value().set_text("anonymous");
            }
        }
        serialize::write_message_to_words(&message)
    }

    #[test]
    fn test_decode_sample_request() {
        let mut message = Builder::new_default();
        {
            let mut request = message.init_root::<code_generator_request::Builder>();
            let mut files = request.reborrow().init_requested_files(1);
            let mut rf = files.reborrow().get(0);
            rf.set_id(0xf1);
            rf.set_filename("sample.capnp");
        }
        let bytes = serialize::write_message_to_words(&message);
        let schema = decode_request(&bytes).unwrap();
        assert_eq!(schema.requested_files.len(), 1);
        assert_eq!(schema.requested_files[0].filename, "sample.capnp");
        assert_eq!(schema.requested_files[0].id, NodeId(0xf1));
    }

    #[test]
    fn test_decode_nodes_and_defaults() {
        let bytes = sample_request();
        let schema = decode_request(&bytes).unwrap();
        assert_eq!(schema.nodes.len(), 2);

        let file = &schema.nodes[0];
        assert_eq!(file.display_name, "sample.capnp");
        assert_eq!(file.nested.len(), 1);
        assert_eq!(file.nested[0].name, "Person");

        let person = &schema.nodes[1];
        assert_eq!(person.short_name(), "Person");
        let NodeBody::Struct(body) = &person.body else {
            panic!("expected a struct body");
        };
        assert_eq!(body.fields.len(), 1);
        let field = &body.fields[0];
        assert_eq!(field.name, "name");
        assert_eq!(field.ordinal, Ordinal::Explicit(0));
        let FieldKind::Slot { ty, default } = &field.kind else {
            panic!("expected a slot");
        };
        assert_eq!(*ty, Type::Text);
        match default {
            Value::Text(t) => assert_eq!(t, "anonymous"),
            other => panic!("expected a text default, got {other:?}"),
        }
    }

    #[test]
    fn test_data_const_decodes_eagerly() {
        let mut message = Builder::new_default();
        {
            let request = message.init_root::<code_generator_request::Builder>();
            let mut nodes = request.init_nodes(1);
            let mut konst = nodes.reborrow().get(0);
            konst.set_id(0xd1);
            konst.set_display_name("sample.capnp:blob");
            konst.set_display_name_prefix_length(13);
            konst.set_scope_id(0xf1);
            let mut body = konst.init_const();
            body.reborrow().init_type().set_data(());
            body.init_value().set_data(b"\x01\x02\x03");
        }
        let bytes = serialize::write_message_to_words(&message);
        let schema = decode_request(&bytes).unwrap();
        let NodeBody::Const(body) = &schema.nodes[0].body else {
            panic!("expected a const body");
        };
        match &body.value {
            Value::Data(d) => assert_eq!(d, &vec![1, 2, 3]),
            other => panic!("expected a data value, got {other:?}"),
        }
    }

    #[test]
    fn test_null_struct_value_survives_the_reader() {
        let mut message = Builder::new_default();
        {
            let request = message.init_root::<code_generator_request::Builder>();
            let mut nodes = request.init_nodes(1);
            let mut konst = nodes.reborrow().get(0);
            konst.set_id(0xd2);
            konst.set_display_name("sample.capnp:empty");
            konst.set_display_name_prefix_length(13);
            konst.set_scope_id(0xf1);
            let mut body = konst.init_const();
            body.reborrow().init_type().init_struct().set_type_id(0xa1);
            // Selects the struct variant and leaves the pointer null.
            body.init_value().init_struct();
        }
        let bytes = serialize::write_message_to_words(&message);
        let schema = decode_request(&bytes).unwrap();
        let NodeBody::Const(body) = &schema.nodes[0].body else {
            panic!("expected a const body");
        };
        assert_eq!(
            body.ty,
            Type::Struct {
                type_id: NodeId(0xa1),
                brand_scope_count: 0
            }
        );
        let Value::Struct(p) = &body.value else {
            panic!("expected a struct value, got {:?}", body.value);
        };
        assert!(matches!(
            p.message.resolve(p.root).unwrap(),
            capdiff_model::wire::ResolvedPtr::Null
        ));
    }

    #[test]
    fn test_missing_source_info_decodes_empty() {
        let bytes = sample_request();
        let schema = decode_request(&bytes).unwrap();
        assert!(schema.source_info.is_empty());
    }

    #[test]
    fn test_truncated_stream_is_rejected() {
        let bytes = sample_request();
        assert!(decode_request(&bytes[..6]).is_err());
    }
}
