//! Identifier-keyed lookup over one side's node list.

use crate::error::{DiffError, Result};
use capdiff_model::{Node, NodeId, NodeKind, ParsedSchema};
use std::cell::RefCell;
use std::collections::HashMap;

/// Flat id-keyed index over a schema's nodes.
///
/// Holds references into the input schema; the differ builds one per side
/// and discards it when the diff returns.
pub struct NodeIndex<'a> {
    nodes: HashMap<NodeId, &'a Node>,
    parents: HashMap<NodeId, NodeId>,
    /// Lazily computed `node -> containing file` map. `None` marks a
    /// synthetic node outside any file's subtree.
    files: RefCell<HashMap<NodeId, Option<NodeId>>>,
}

impl<'a> NodeIndex<'a> {
    pub fn build(schema: &'a ParsedSchema) -> NodeIndex<'a> {
        let mut nodes = HashMap::with_capacity(schema.nodes.len());
        let mut parents = HashMap::with_capacity(schema.nodes.len());
        for node in &schema.nodes {
            nodes.insert(node.id, node);
            if !node.scope_id.is_none() {
                parents.insert(node.id, node.scope_id);
            }
        }
        NodeIndex {
            nodes,
            parents,
            files: RefCell::new(HashMap::new()),
        }
    }

    /// Look up a node that must exist; an unknown id is a caller bug.
    pub fn node(&self, id: NodeId) -> Result<&'a Node> {
        self.nodes
            .get(&id)
            .copied()
            .ok_or(DiffError::MissingNode { id })
    }

    pub fn get(&self, id: NodeId) -> Option<&'a Node> {
        self.nodes.get(&id).copied()
    }

    /// The enclosing node, if any.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(&id).copied()
    }

    /// Walk the parent chain up to the containing file node.
    ///
    /// Returns `None` for synthetic nodes (the chain ends at a scope-zero
    /// non-file node, e.g. an auto-generated method parameter struct).
    pub fn containing_file(&self, id: NodeId) -> Result<Option<NodeId>> {
        if let Some(cached) = self.files.borrow().get(&id) {
            return Ok(*cached);
        }
        let mut current = id;
        let resolved = loop {
            let node = self.node(current)?;
            if node.kind() == NodeKind::File {
                break Some(current);
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break None,
            }
        };
        self.files.borrow_mut().insert(id, resolved);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capdiff_model::{NodeBody, StructBody};

    fn node(id: u64, scope: u64, body: NodeBody) -> Node {
        Node {
            id: NodeId(id),
            display_name: format!("n{id}"),
            display_name_prefix_length: 0,
            scope_id: NodeId(scope),
            nested: Vec::new(),
            body,
        }
    }

    fn strukt() -> NodeBody {
        NodeBody::Struct(StructBody {
            fields: Vec::new(),
            is_group: false,
        })
    }

    fn schema() -> ParsedSchema {
        ParsedSchema {
            nodes: vec![
                node(1, 0, NodeBody::File),
                node(2, 1, strukt()),
                node(3, 2, strukt()),
                // Synthetic: scope zero, not a file.
                node(4, 0, strukt()),
            ],
            requested_files: Vec::new(),
            source_info: Vec::new(),
        }
    }

    #[test]
    fn test_missing_node_is_an_error() {
        let schema = schema();
        let index = NodeIndex::build(&schema);
        assert!(matches!(
            index.node(NodeId(99)),
            Err(DiffError::MissingNode { id: NodeId(99) })
        ));
    }

    #[test]
    fn test_containing_file_walks_parent_chain() {
        let schema = schema();
        let index = NodeIndex::build(&schema);
        assert_eq!(index.containing_file(NodeId(3)).unwrap(), Some(NodeId(1)));
        assert_eq!(index.containing_file(NodeId(1)).unwrap(), Some(NodeId(1)));
    }

    #[test]
    fn test_synthetic_node_has_no_file() {
        let schema = schema();
        let index = NodeIndex::build(&schema);
        assert_eq!(index.containing_file(NodeId(4)).unwrap(), None);
        // Second lookup hits the cache and agrees.
        assert_eq!(index.containing_file(NodeId(4)).unwrap(), None);
    }
}
