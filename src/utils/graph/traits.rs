//! Trait definitions for control-flow graph views.
//!
//! Graph algorithms in this crate (dominators, loop detection) are written
//! against these traits instead of a concrete graph type, so the same
//! implementation runs over an [`SsaCfg`](crate::analysis::SsaCfg) in
//! production and over small hand-built graphs in tests.
//!
//! - [`GraphBase`] - node count and node iteration
//! - [`Successors`] - outgoing edges
//! - [`Predecessors`] - incoming edges
//! - [`RootedGraph`] - a designated entry node

use crate::utils::graph::NodeId;

/// Base trait providing core graph properties.
pub trait GraphBase {
    /// Returns the number of nodes in the graph.
    ///
    /// Nodes unreachable from the entry are still counted.
    fn node_count(&self) -> usize;

    /// Returns an iterator over all node identifiers, by ascending index.
    fn node_ids(&self) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support forward edge traversal.
pub trait Successors: GraphBase {
    /// Returns an iterator over the successor nodes of the given node.
    ///
    /// For a directed edge `(u, v)`, node `v` is a successor of `u`. A node
    /// that branches to the same target twice may yield it twice.
    ///
    /// # Arguments
    ///
    /// * `node` - The node whose successors to iterate
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs that support backward edge traversal.
pub trait Predecessors: GraphBase {
    /// Returns an iterator over the predecessor nodes of the given node.
    ///
    /// For a directed edge `(u, v)`, node `u` is a predecessor of `v`.
    ///
    /// # Arguments
    ///
    /// * `node` - The node whose predecessors to iterate
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Trait for graphs with a designated entry (root) node.
///
/// Dominator computation and loop detection both need a well-defined start;
/// for a function body this is block 0.
pub trait RootedGraph: Successors + Predecessors {
    /// Returns the entry (root) node of the graph.
    fn entry(&self) -> NodeId;
}
