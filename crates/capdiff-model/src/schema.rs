use crate::id::NodeId;
use crate::node::Node;
use serde::{Deserialize, Serialize};

/// One side of a diff: the fully decoded output of a compiler invocation.
///
/// The node list is flat; parent/child structure is expressed through
/// `scope_id` and nested-node entries and is indexed by the differ, not
/// here.
#[derive(Debug, Clone, Default)]
pub struct ParsedSchema {
    pub nodes: Vec<Node>,
    /// The files that were named on the compiler command line. Every change
    /// the differ emits is attributed to one of these.
    pub requested_files: Vec<RequestedFile>,
    /// Byte-range information per node, aligned with the compiler's
    /// source-info table.
    pub source_info: Vec<NodeSourceInfo>,
}

/// A compiled file: its file-node id and the path it was compiled from.
#[derive(Debug, Clone)]
pub struct RequestedFile {
    pub id: NodeId,
    pub filename: String,
}

/// Half-open byte range in the declaring file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub start_byte: u32,
    pub end_byte: u32,
}

impl SourceLocation {
    pub fn new(start_byte: u32, end_byte: u32) -> SourceLocation {
        SourceLocation {
            start_byte,
            end_byte,
        }
    }

    /// A zero range means the compiler recorded no location.
    pub fn is_zero(&self) -> bool {
        self.start_byte == 0 && self.end_byte == 0
    }
}

/// Source ranges for one node: the declaration itself plus one entry per
/// member (field, enumerant, or method), in member-list order.
#[derive(Debug, Clone)]
pub struct NodeSourceInfo {
    pub id: NodeId,
    pub range: SourceLocation,
    pub members: Vec<SourceLocation>,
}
