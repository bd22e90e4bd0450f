//! Node identifiers for control-flow graphs.
//!
//! Every graph in this crate is a view over the basic blocks of an
//! [`SsaFunction`](crate::analysis::SsaFunction), so a [`NodeId`] is simply a
//! typed block index. The newtype keeps block indices from being confused with
//! instruction positions or SSA value numbers, which are also plain `usize`s
//! internally.

use std::fmt;

/// A strongly-typed identifier for a node (basic block) in a control-flow graph.
///
/// The wrapped index is the block's position in
/// [`SsaFunction::blocks`](crate::analysis::SsaFunction::blocks), so per-node
/// analysis results can be stored in plain vectors indexed by
/// [`NodeId::index`].
///
/// # Examples
///
/// ```rust
/// use gcmotion::utils::graph::NodeId;
///
/// let header = NodeId::new(1);
/// let latch = NodeId::new(3);
/// assert!(header < latch);
/// assert_eq!(latch.index(), 3);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a new `NodeId` from a block index.
    ///
    /// # Arguments
    ///
    /// * `index` - The 0-based block index
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the block index of this node.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    /// Blocks are rendered the same way the IR printer names them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl From<NodeId> for usize {
    #[inline]
    fn from(node: NodeId) -> Self {
        node.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_node_id_roundtrip_index() {
        let node = NodeId::new(42);
        assert_eq!(node.index(), 42);
        assert_eq!(usize::from(node), 42);
        assert_eq!(NodeId::from(42usize), node);
    }

    #[test]
    fn test_node_id_ordering_follows_block_index() {
        let mut nodes = vec![NodeId::new(3), NodeId::new(0), NodeId::new(2)];
        nodes.sort();
        assert_eq!(nodes, vec![NodeId::new(0), NodeId::new(2), NodeId::new(3)]);
    }

    #[test]
    fn test_node_id_hash_dedup() {
        let set: HashSet<NodeId> = [1, 2, 1].into_iter().map(NodeId::new).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_node_id_formatting() {
        let node = NodeId::new(7);
        assert_eq!(format!("{node:?}"), "NodeId(7)");
        assert_eq!(format!("{node}"), "B7");
    }
}
