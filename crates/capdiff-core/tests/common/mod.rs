#![allow(dead_code)]

//! Shared fixture builder for differ tests.
//!
//! Builds `ParsedSchema` values the way the loader would produce them:
//! display names carry the scope prefix, nested entries are registered on
//! the parent, and every declaration gets a synthetic advancing byte range
//! so ordering assertions are meaningful.

use capdiff_core::changes::{Breakage, ChangeKind, SchemaDiff};
use capdiff_model::{
    AnnotationBody, AnnotationTargets, ConstBody, EnumBody, Enumerant, Field, FieldKind,
    InterfaceBody, Method, NestedNode, Node, NodeBody, NodeId, NodeKind, NodeSourceInfo,
    Ordinal, ParsedSchema, RequestedFile, SourceLocation, StructBody, Type, Value,
};

pub struct SchemaBuilder {
    schema: ParsedSchema,
    cursor: u32,
}

impl SchemaBuilder {
    pub fn new() -> SchemaBuilder {
        SchemaBuilder {
            schema: ParsedSchema::default(),
            cursor: 0,
        }
    }

    pub fn build(self) -> ParsedSchema {
        self.schema
    }

    pub fn file(&mut self, id: u64, path: &str) -> &mut Self {
        self.push_node(
            Node {
                id: NodeId(id),
                display_name: path.to_string(),
                display_name_prefix_length: 0,
                scope_id: NodeId::NONE,
                nested: Vec::new(),
                body: NodeBody::File,
            },
            0,
        );
        self.schema.requested_files.push(RequestedFile {
            id: NodeId(id),
            filename: path.to_string(),
        });
        self
    }

    pub fn strukt(&mut self, parent: u64, id: u64, name: &str, fields: Vec<Field>) -> &mut Self {
        let member_count = fields.len();
        let node = self.child_node(
            parent,
            id,
            name,
            NodeBody::Struct(StructBody {
                fields,
                is_group: false,
            }),
        );
        self.push_node(node, member_count);
        self
    }

    /// A compiler-generated struct outside any file subtree (scope zero),
    /// as used for anonymous method parameters/results and reached only
    /// through the node that references it.
    pub fn synthetic_struct(&mut self, id: u64, name: &str, fields: Vec<Field>) -> &mut Self {
        let member_count = fields.len();
        self.push_node(
            Node {
                id: NodeId(id),
                display_name: name.to_string(),
                display_name_prefix_length: 0,
                scope_id: NodeId::NONE,
                nested: Vec::new(),
                body: NodeBody::Struct(StructBody {
                    fields,
                    is_group: false,
                }),
            },
            member_count,
        );
        self
    }

    /// A named group's struct node: scoped under its containing struct but
    /// not listed as a nested entry (groups are reached through fields).
    pub fn group_struct(&mut self, parent: u64, id: u64, name: &str, fields: Vec<Field>) -> &mut Self {
        let member_count = fields.len();
        let mut node = self.named_node(parent, id, name);
        node.body = NodeBody::Struct(StructBody {
            fields,
            is_group: true,
        });
        self.push_node(node, member_count);
        self
    }

    pub fn enum_node(&mut self, parent: u64, id: u64, name: &str, enumerants: &[&str]) -> &mut Self {
        let body = NodeBody::Enum(EnumBody {
            enumerants: enumerants
                .iter()
                .map(|n| Enumerant {
                    name: n.to_string(),
                })
                .collect(),
        });
        let node = self.child_node(parent, id, name, body);
        self.push_node(node, enumerants.len());
        self
    }

    pub fn interface(&mut self, parent: u64, id: u64, name: &str, methods: Vec<Method>) -> &mut Self {
        let member_count = methods.len();
        let node = self.child_node(parent, id, name, NodeBody::Interface(InterfaceBody { methods }));
        self.push_node(node, member_count);
        self
    }

    pub fn konst(&mut self, parent: u64, id: u64, name: &str, ty: Type, value: Value) -> &mut Self {
        let node = self.child_node(parent, id, name, NodeBody::Const(ConstBody { ty, value }));
        self.push_node(node, 0);
        self
    }

    pub fn annotation(
        &mut self,
        parent: u64,
        id: u64,
        name: &str,
        ty: Type,
        targets: AnnotationTargets,
    ) -> &mut Self {
        let node = self.child_node(parent, id, name, NodeBody::Annotation(AnnotationBody { ty, targets }));
        self.push_node(node, 0);
        self
    }

    /// Build a node scoped under `parent`, registering the nested entry.
    fn child_node(&mut self, parent: u64, id: u64, name: &str, body: NodeBody) -> Node {
        let mut node = self.named_node(parent, id, name);
        node.body = body;
        let parent_node = self
            .schema
            .nodes
            .iter_mut()
            .find(|n| n.id.0 == parent)
            .expect("parent must be declared before its children");
        parent_node.nested.push(NestedNode {
            name: name.to_string(),
            id: NodeId(id),
        });
        node
    }

    fn named_node(&self, parent: u64, id: u64, name: &str) -> Node {
        let parent_node = self
            .schema
            .nodes
            .iter()
            .find(|n| n.id.0 == parent)
            .expect("parent must be declared before its children");
        let display_name = if parent_node.kind() == NodeKind::File {
            format!("{}:{}", parent_node.display_name, name)
        } else {
            format!("{}.{}", parent_node.display_name, name)
        };
        let prefix = (display_name.len() - name.len()) as u32;
        Node {
            id: NodeId(id),
            display_name,
            display_name_prefix_length: prefix,
            scope_id: NodeId(parent),
            nested: Vec::new(),
            body: NodeBody::File,
        }
    }

    /// Record the node and synthesize source info: the node gets the next
    /// free range, members get consecutive sub-ranges in declaration order.
    fn push_node(&mut self, node: Node, member_count: usize) {
        let start = self.cursor;
        let members = (0..member_count)
            .map(|i| {
                let s = start + 10 * (i as u32 + 1);
                SourceLocation::new(s, s + 8)
            })
            .collect();
        self.schema.source_info.push(NodeSourceInfo {
            id: node.id,
            range: SourceLocation::new(start, start + 10 * (member_count as u32 + 1)),
            members,
        });
        self.cursor = start + 10 * (member_count as u32 + 2);
        self.schema.nodes.push(node);
    }
}

pub fn slot(name: &str, ty: Type, default: Value) -> Field {
    Field {
        name: name.to_string(),
        ordinal: Ordinal::Implicit,
        kind: FieldKind::Slot { ty, default },
    }
}

pub fn slot_at(name: &str, ordinal: u16, ty: Type, default: Value) -> Field {
    Field {
        name: name.to_string(),
        ordinal: Ordinal::Explicit(ordinal),
        kind: FieldKind::Slot { ty, default },
    }
}

pub fn group_field(name: &str, type_id: u64) -> Field {
    Field {
        name: name.to_string(),
        ordinal: Ordinal::Implicit,
        kind: FieldKind::Group {
            type_id: NodeId(type_id),
        },
    }
}

pub fn method(name: &str, param_type: u64, result_type: u64) -> Method {
    Method {
        name: name.to_string(),
        param_type: NodeId(param_type),
        result_type: NodeId(result_type),
        param_brand_scopes: 0,
        result_brand_scopes: 0,
        implicit_parameters: 0,
    }
}

/// Stable tag of a change kind, mirroring the serialized names.
pub fn label(kind: &ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Unsupported { .. } => "unsupported",
        ChangeKind::NodeAdded { .. } => "nodeAdded",
        ChangeKind::NodeRemoved { .. } => "nodeRemoved",
        ChangeKind::NodeRenamed { .. } => "nodeRenamed",
        ChangeKind::NodeIdChanged { .. } => "nodeIdChanged",
        ChangeKind::MemberOrdinalChanged { .. } => "memberOrdinalChanged",
        ChangeKind::NodeTypeChanged { .. } => "nodeTypeChanged",
        ChangeKind::FieldDefaultValueChanged { .. } => "fieldDefaultValueChanged",
        ChangeKind::ConstValueChanged { .. } => "constValueChanged",
        ChangeKind::AnnotationTargetAdded { .. } => "annotationTargetAdded",
        ChangeKind::AnnotationTargetRemoved { .. } => "annotationTargetRemoved",
    }
}

/// Name of the entity a change talks about.
pub fn subject(kind: &ChangeKind) -> String {
    match kind {
        ChangeKind::Unsupported { reason } => reason.clone(),
        ChangeKind::NodeAdded { entity }
        | ChangeKind::NodeRemoved { entity }
        | ChangeKind::NodeRenamed { entity, .. } => entity.name().to_string(),
        ChangeKind::NodeIdChanged { entity, .. } => entity.short_name.clone(),
        ChangeKind::MemberOrdinalChanged { member, .. } => member.name.clone(),
        ChangeKind::NodeTypeChanged { target } => target.name.clone(),
        ChangeKind::FieldDefaultValueChanged { field } => field.name.clone(),
        ChangeKind::ConstValueChanged { node } => node.short_name.clone(),
        ChangeKind::AnnotationTargetAdded { node, .. }
        | ChangeKind::AnnotationTargetRemoved { node, .. } => node.short_name.clone(),
    }
}

/// Compact `(label, breakage, subject)` view of a diff for assertions.
pub fn summary(diff: &SchemaDiff) -> Vec<(&'static str, Breakage, String)> {
    diff.changes
        .iter()
        .map(|c| (label(&c.kind), c.breakage, subject(&c.kind)))
        .collect()
}
