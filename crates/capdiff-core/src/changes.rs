//! Diff output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! Change records own their payload data (names, identifiers) and do not
//! borrow from the input schemas.

use capdiff_model::{AnnotationTarget, NodeId, NodeKind, SourceLocation};
use serde::{Deserialize, Serialize};

/// How badly dependents break when a change ships.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Breakage {
    /// Fully compatible; nothing to do.
    None,
    /// Source-level dependents may fail to compile.
    Code,
    /// Encoded messages may be misread.
    Wire,
}

impl Breakage {
    pub fn label(&self) -> &'static str {
        match self {
            Breakage::None => "none",
            Breakage::Code => "code",
            Breakage::Wire => "wire",
        }
    }
}

/// The member population a [`MemberRef`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    Field,
    Enumerant,
    Method,
}

impl MemberKind {
    pub fn label(&self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Enumerant => "enumerant",
            MemberKind::Method => "method",
        }
    }
}

/// Reference to a declaration that owns a node id of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub kind: NodeKind,
    pub id: NodeId,
    pub short_name: String,
}

/// Reference to a field, enumerant, or method. Members have no id of their
/// own; `id` carries the owning node's id and `ordinal` the member's wire
/// position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRef {
    pub kind: MemberKind,
    /// Id of the owning struct/enum/interface node.
    pub id: NodeId,
    pub name: String,
    pub ordinal: u16,
}

/// Either kind of entity a lifecycle event may name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "camelCase")]
pub enum EntityRef {
    Node(NodeRef),
    Member(MemberRef),
}

impl EntityRef {
    /// The affected entity's unqualified name.
    pub fn name(&self) -> &str {
        match self {
            EntityRef::Node(n) => &n.short_name,
            EntityRef::Member(m) => &m.name,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            EntityRef::Node(n) => n.kind.label(),
            EntityRef::Member(m) => m.kind.label(),
        }
    }

    /// Whether this is a member (field/enumerant/method) reference; member
    /// removal is wire-breaking, node removal is not.
    pub fn is_member(&self) -> bool {
        matches!(self, EntityRef::Member(_))
    }
}

/// The reduced kind set used by type-change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypedRefKind {
    Const,
    Annotation,
    Field,
    MethodInput,
    MethodOutput,
}

impl TypedRefKind {
    pub fn label(&self) -> &'static str {
        match self {
            TypedRefKind::Const => "const",
            TypedRefKind::Annotation => "annotation",
            TypedRefKind::Field => "field",
            TypedRefKind::MethodInput => "method input",
            TypedRefKind::MethodOutput => "method output",
        }
    }
}

/// Reference to a typed entity whose type changed. For fields and methods,
/// `id` is the owning node and `ordinal` the member position; for consts
/// and annotations it is the node itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedRef {
    pub kind: TypedRefKind,
    pub id: NodeId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordinal: Option<u16>,
}

/// One detected schema change, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChangeKind {
    /// The differ recognized the construct but cannot analyze it; emitted
    /// with conservative `wire` breakage.
    Unsupported { reason: String },
    NodeAdded { entity: EntityRef },
    NodeRemoved { entity: EntityRef },
    NodeRenamed { entity: EntityRef, old_name: String },
    NodeIdChanged { entity: NodeRef, old_id: NodeId },
    MemberOrdinalChanged { member: MemberRef, old_ordinal: u16 },
    NodeTypeChanged { target: TypedRef },
    FieldDefaultValueChanged { field: MemberRef },
    ConstValueChanged { node: NodeRef },
    AnnotationTargetAdded { node: NodeRef, target: AnnotationTarget },
    AnnotationTargetRemoved { node: NodeRef, target: AnnotationTarget },
}

impl ChangeKind {
    /// One-line human description, used by the text renderer.
    pub fn describe(&self) -> String {
        match self {
            ChangeKind::Unsupported { reason } => format!("unsupported: {reason}"),
            ChangeKind::NodeAdded { entity } => {
                format!("added {} '{}'", entity.kind_label(), entity.name())
            }
            ChangeKind::NodeRemoved { entity } => {
                format!("removed {} '{}'", entity.kind_label(), entity.name())
            }
            ChangeKind::NodeRenamed { entity, old_name } => format!(
                "renamed {} '{}' to '{}'",
                entity.kind_label(),
                old_name,
                entity.name()
            ),
            ChangeKind::NodeIdChanged { entity, old_id } => format!(
                "{} '{}' changed id from {} to {}",
                entity.kind.label(),
                entity.short_name,
                old_id,
                entity.id
            ),
            ChangeKind::MemberOrdinalChanged { member, old_ordinal } => format!(
                "{} '{}' moved from ordinal @{} to @{}",
                member.kind.label(),
                member.name,
                old_ordinal,
                member.ordinal
            ),
            ChangeKind::NodeTypeChanged { target } => {
                format!("{} '{}' changed type", target.kind.label(), target.name)
            }
            ChangeKind::FieldDefaultValueChanged { field } => {
                format!("field '{}' changed default value", field.name)
            }
            ChangeKind::ConstValueChanged { node } => {
                format!("const '{}' changed value", node.short_name)
            }
            ChangeKind::AnnotationTargetAdded { node, target } => format!(
                "annotation '{}' now targets {}",
                node.short_name,
                target.label()
            ),
            ChangeKind::AnnotationTargetRemoved { node, target } => format!(
                "annotation '{}' no longer targets {}",
                node.short_name,
                target.label()
            ),
        }
    }
}

/// 1-based line/column position inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Line/column rendering of a change's byte range, filled in by the source
/// locator after diffing; the differ itself leaves it empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContext {
    pub start_position: Position,
    pub end_position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// A single change record: what changed, how badly, and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaChange {
    pub breakage: Breakage,
    /// Id of the file node this change is attributed to; always present in
    /// the diff's file table.
    pub file_id: NodeId,
    #[serde(flatten)]
    pub location: SourceLocation,
    #[serde(flatten)]
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<SourceContext>,
}

/// A file-table entry mapping a file-node id to its path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: NodeId,
    pub path: String,
}

/// The ordered diff between two schemas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    /// Changes sorted by `(file path, start byte)`.
    pub changes: Vec<SchemaChange>,
    /// Every file referenced by at least one change.
    pub files: Vec<FileEntry>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The worst breakage present, `None` when the diff is empty.
    pub fn max_breakage(&self) -> Breakage {
        self.changes
            .iter()
            .map(|c| c.breakage)
            .max()
            .unwrap_or(Breakage::None)
    }

    /// Path recorded for a file id, if any change referenced it.
    pub fn path_of(&self, id: NodeId) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.path.as_str())
    }
}
