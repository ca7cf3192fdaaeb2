//! Byte-range side tables for nodes and their members.

use capdiff_model::{MemberKey, NodeId, ParsedSchema, SourceLocation};
use std::collections::HashMap;

/// Per-side index of source byte ranges.
///
/// Members have no id of their own, so their ranges are keyed by
/// `(parent node, member position)`. This side table is the single
/// authority for locations; in particular an annotation node's range is
/// always taken from here, never from any inline copy.
pub struct SourceIndex {
    nodes: HashMap<NodeId, SourceLocation>,
    members: HashMap<MemberKey, SourceLocation>,
}

impl SourceIndex {
    pub fn build(schema: &ParsedSchema) -> SourceIndex {
        let mut nodes = HashMap::with_capacity(schema.source_info.len());
        let mut members = HashMap::new();
        for info in &schema.source_info {
            if !info.range.is_zero() {
                nodes.insert(info.id, info.range);
            }
            for (position, range) in info.members.iter().enumerate() {
                // Zero ranges mean the compiler recorded nothing.
                if !range.is_zero() {
                    members.insert(MemberKey::new(info.id, position as u16), *range);
                }
            }
        }
        SourceIndex { nodes, members }
    }

    /// The node's own range, or the zero range when unrecorded.
    pub fn node_range(&self, id: NodeId) -> SourceLocation {
        self.nodes.get(&id).copied().unwrap_or_default()
    }

    /// A member's range, falling back to the owning node's range when the
    /// member has none.
    pub fn member_range(&self, parent: NodeId, position: u16) -> SourceLocation {
        self.members
            .get(&MemberKey::new(parent, position))
            .copied()
            .unwrap_or_else(|| self.node_range(parent))
    }
}
