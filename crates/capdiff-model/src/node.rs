use crate::id::NodeId;
use crate::ty::Type;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single schema declaration: a file, struct, enum, interface, constant,
/// or annotation.
///
/// Each node:
/// - Is identified by a stable 64-bit `id`
/// - Names its enclosing node via `scope_id` (zero for files and for
///   synthetic nodes such as auto-generated method parameter structs)
/// - Lists its lexically nested declarations in `nested`
/// - Carries a kind-specific `body`
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Fully qualified display name, e.g. `addressbook.capnp:Person.phone`.
    pub display_name: String,
    /// Length of the scope prefix of `display_name`; the short name is the
    /// suffix past it.
    pub display_name_prefix_length: u32,
    pub scope_id: NodeId,
    pub nested: Vec<NestedNode>,
    pub body: NodeBody,
}

impl Node {
    /// The display name with its scope prefix stripped.
    pub fn short_name(&self) -> &str {
        let at = (self.display_name_prefix_length as usize).min(self.display_name.len());
        &self.display_name[at..]
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// Whether this node is compiler-generated and outside any file's
    /// subtree (e.g. an anonymous method parameter struct).
    pub fn is_synthetic(&self) -> bool {
        self.scope_id.is_none() && self.kind() != NodeKind::File
    }
}

/// The kind of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    File,
    Struct,
    Enum,
    Interface,
    Const,
    Annotation,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Struct => "struct",
            NodeKind::Enum => "enum",
            NodeKind::Interface => "interface",
            NodeKind::Const => "const",
            NodeKind::Annotation => "annotation",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A lexically nested declaration: the short name under which a child node
/// appears in its parent's scope.
#[derive(Debug, Clone)]
pub struct NestedNode {
    pub name: String,
    pub id: NodeId,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone)]
pub enum NodeBody {
    File,
    Struct(StructBody),
    Enum(EnumBody),
    Interface(InterfaceBody),
    Const(ConstBody),
    Annotation(AnnotationBody),
}

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::File => NodeKind::File,
            NodeBody::Struct(_) => NodeKind::Struct,
            NodeBody::Enum(_) => NodeKind::Enum,
            NodeBody::Interface(_) => NodeKind::Interface,
            NodeBody::Const(_) => NodeKind::Const,
            NodeBody::Annotation(_) => NodeKind::Annotation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructBody {
    pub fields: Vec<Field>,
    /// True when this struct is a named group inside another struct.
    pub is_group: bool,
}

#[derive(Debug, Clone)]
pub struct EnumBody {
    pub enumerants: Vec<Enumerant>,
}

#[derive(Debug, Clone)]
pub struct InterfaceBody {
    pub methods: Vec<Method>,
}

#[derive(Debug, Clone)]
pub struct ConstBody {
    pub ty: Type,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct AnnotationBody {
    pub ty: Type,
    pub targets: AnnotationTargets,
}

/// A struct member.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ordinal: Ordinal,
    pub kind: FieldKind,
}

/// What a field holds: a typed slot with a default, or a reference to a
/// named group's synthetic struct node.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Slot { ty: Type, default: Value },
    Group { type_id: NodeId },
}

/// A member's wire position: written explicitly as `@N` in the source, or
/// assigned implicitly from the declaration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
    Implicit,
    Explicit(u16),
}

impl Ordinal {
    /// The effective ordinal of a member at the given list position.
    pub fn resolve(&self, position: usize) -> u16 {
        match self {
            Ordinal::Implicit => position as u16,
            Ordinal::Explicit(n) => *n,
        }
    }
}

/// An enum member; its ordinal is its position in the enumerant list.
#[derive(Debug, Clone)]
pub struct Enumerant {
    pub name: String,
}

/// An interface member.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    /// Node id of the parameter struct (synthetic for inline parameters).
    pub param_type: NodeId,
    /// Node id of the result struct (synthetic for inline results).
    pub result_type: NodeId,
    /// Brand scope counts on the parameter/result struct references;
    /// non-zero means a generic binding, which the differ rejects.
    pub param_brand_scopes: u32,
    pub result_brand_scopes: u32,
    /// Number of implicit (method-level) generic parameters; non-zero is
    /// rejected.
    pub implicit_parameters: u32,
}

/// One of the twelve declaration kinds an annotation may be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnnotationTarget {
    File,
    Const,
    Enum,
    Enumerant,
    Struct,
    Field,
    Union,
    Group,
    Interface,
    Method,
    Param,
    Annotation,
}

impl AnnotationTarget {
    pub const ALL: [AnnotationTarget; 12] = [
        AnnotationTarget::File,
        AnnotationTarget::Const,
        AnnotationTarget::Enum,
        AnnotationTarget::Enumerant,
        AnnotationTarget::Struct,
        AnnotationTarget::Field,
        AnnotationTarget::Union,
        AnnotationTarget::Group,
        AnnotationTarget::Interface,
        AnnotationTarget::Method,
        AnnotationTarget::Param,
        AnnotationTarget::Annotation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnnotationTarget::File => "file",
            AnnotationTarget::Const => "const",
            AnnotationTarget::Enum => "enum",
            AnnotationTarget::Enumerant => "enumerant",
            AnnotationTarget::Struct => "struct",
            AnnotationTarget::Field => "field",
            AnnotationTarget::Union => "union",
            AnnotationTarget::Group => "group",
            AnnotationTarget::Interface => "interface",
            AnnotationTarget::Method => "method",
            AnnotationTarget::Param => "param",
            AnnotationTarget::Annotation => "annotation",
        }
    }
}

/// The set of targets an annotation declaration allows, one bit per
/// [`AnnotationTarget`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationTargets(u16);

impl AnnotationTargets {
    pub fn set(&mut self, target: AnnotationTarget, allowed: bool) {
        let bit = 1u16 << target as u16;
        if allowed {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    pub fn allows(&self, target: AnnotationTarget) -> bool {
        self.0 & (1u16 << target as u16) != 0
    }
}
