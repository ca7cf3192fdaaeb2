use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable 64-bit identifier of a schema node.
///
/// Node ids are assigned by the Cap'n Proto compiler (either from an
/// explicit `@0x...` annotation or derived from the parent scope) and are
/// the authoritative pairing key when diffing two schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The zero id, used as the scope of top-level and synthetic nodes.
    pub const NONE: NodeId = NodeId(0);

    /// Check whether this is the zero id.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        NodeId(raw)
    }
}

/// Composite key for per-member side tables.
///
/// Fields, enumerants and methods have no identifier of their own, so side
/// tables key them by the owning node plus their 16-bit position. The key is
/// 128 bits wide so the full 64-bit parent id and the ordinal never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberKey(u128);

impl MemberKey {
    pub fn new(parent: NodeId, ordinal: u16) -> Self {
        MemberKey(((parent.0 as u128) << 16) | ordinal as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(0xabcd).to_string(), "0x000000000000abcd");
    }

    #[test]
    fn test_member_keys_do_not_collide() {
        // A parent id whose low bits look like an ordinal must not alias
        // another parent's member.
        let a = MemberKey::new(NodeId(0x1), 0x0002);
        let b = MemberKey::new(NodeId(0x10002), 0x0000);
        assert_ne!(a, b);
        assert_eq!(a, MemberKey::new(NodeId(0x1), 2));
    }
}
