//! Final packaging of emitted changes.
//!
//! The differ emits in traversal order; this module restores the output
//! contract: changes sorted by `(file path, start byte)` and a file table
//! covering every referenced file id. Removed files keep their old path,
//! surviving files use the new one.

use crate::changes::{FileEntry, SchemaChange, SchemaDiff};
use capdiff_model::{NodeId, ParsedSchema};
use std::collections::{BTreeMap, HashMap};

pub(crate) fn package(
    mut changes: Vec<SchemaChange>,
    old_schema: &ParsedSchema,
    new_schema: &ParsedSchema,
) -> SchemaDiff {
    // New paths win for files present on both sides.
    let mut paths: HashMap<NodeId, &str> = HashMap::new();
    for file in &old_schema.requested_files {
        paths.insert(file.id, file.filename.as_str());
    }
    for file in &new_schema.requested_files {
        paths.insert(file.id, file.filename.as_str());
    }

    let mut referenced: BTreeMap<NodeId, &str> = BTreeMap::new();
    for change in &changes {
        let path = paths.get(&change.file_id).copied().unwrap_or_default();
        referenced.insert(change.file_id, path);
    }

    // Stable sort: equal keys keep their traversal order.
    changes.sort_by(|a, b| {
        let pa = paths.get(&a.file_id).copied().unwrap_or_default();
        let pb = paths.get(&b.file_id).copied().unwrap_or_default();
        (pa, a.location.start_byte).cmp(&(pb, b.location.start_byte))
    });

    let mut files: Vec<FileEntry> = referenced
        .into_iter()
        .map(|(id, path)| FileEntry {
            id,
            path: path.to_string(),
        })
        .collect();
    files.sort_by(|a, b| (&a.path, a.id).cmp(&(&b.path, b.id)));

    SchemaDiff { changes, files }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::{Breakage, ChangeKind, EntityRef, NodeRef};
    use capdiff_model::{NodeKind, RequestedFile, SourceLocation};

    fn schema_with_files(files: &[(u64, &str)]) -> ParsedSchema {
        ParsedSchema {
            nodes: Vec::new(),
            requested_files: files
                .iter()
                .map(|(id, path)| RequestedFile {
                    id: NodeId(*id),
                    filename: path.to_string(),
                })
                .collect(),
            source_info: Vec::new(),
        }
    }

    fn change(file_id: u64, start: u32) -> SchemaChange {
        SchemaChange {
            breakage: Breakage::None,
            file_id: NodeId(file_id),
            location: SourceLocation::new(start, start + 1),
            kind: ChangeKind::NodeAdded {
                entity: EntityRef::Node(NodeRef {
                    kind: NodeKind::Struct,
                    id: NodeId(99),
                    short_name: "S".to_string(),
                }),
            },
            source: None,
        }
    }

    #[test]
    fn test_sorted_by_path_then_start_byte() {
        let old = schema_with_files(&[(1, "b.capnp")]);
        let new = schema_with_files(&[(1, "b.capnp"), (2, "a.capnp")]);
        let diff = package(
            vec![change(1, 5), change(2, 50), change(1, 2), change(2, 10)],
            &old,
            &new,
        );
        let keys: Vec<(u64, u32)> = diff
            .changes
            .iter()
            .map(|c| (c.file_id.0, c.location.start_byte))
            .collect();
        assert_eq!(keys, vec![(2, 10), (2, 50), (1, 2), (1, 5)]);
    }

    #[test]
    fn test_file_table_covers_every_change() {
        let old = schema_with_files(&[(1, "old.capnp"), (3, "gone.capnp")]);
        let new = schema_with_files(&[(1, "renamed.capnp")]);
        let diff = package(vec![change(1, 0), change(3, 0)], &old, &new);
        // Every referenced id appears, removed files under their old path,
        // surviving files under the new one.
        assert_eq!(diff.path_of(NodeId(1)), Some("renamed.capnp"));
        assert_eq!(diff.path_of(NodeId(3)), Some("gone.capnp"));
        assert_eq!(diff.files.len(), 2);
    }

    #[test]
    fn test_unreferenced_files_are_not_listed() {
        let old = schema_with_files(&[(1, "a.capnp"), (2, "b.capnp")]);
        let new = schema_with_files(&[(1, "a.capnp"), (2, "b.capnp")]);
        let diff = package(vec![change(1, 0)], &old, &new);
        assert_eq!(diff.files.len(), 1);
        assert!(diff.path_of(NodeId(2)).is_none());
    }
}
