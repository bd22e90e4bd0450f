//! Control flow graph view of SSA functions.
//!
//! [`SsaCfg`] derives the control-flow edges of an [`SsaFunction`] from its
//! block terminators and implements the graph traits, so dominator
//! computation and loop detection run directly on SSA form:
//!
//! - [`GraphBase`] - Node count and iteration
//! - [`Successors`] - Forward edge traversal (from terminators)
//! - [`Predecessors`] - Backward edge traversal (computed from successors)
//! - [`RootedGraph`] - Entry node (block 0)
//!
//! The view borrows the function, so it must be rebuilt after edges change.
//! Code motion never changes edges, so one view serves a whole pass run.

use crate::{
    analysis::ssa::SsaFunction,
    utils::graph::{GraphBase, NodeId, Predecessors, RootedGraph, Successors},
};

/// A lightweight control flow graph view of an SSA function.
///
/// Successor and predecessor lists are computed once on construction (O(E)).
/// Branch targets outside the function are dropped, and an edge that appears
/// twice in one terminator (both arms of a branch to the same block) is
/// recorded once.
///
/// # Examples
///
/// ```rust
/// use gcmotion::analysis::{SsaCfg, SsaFunctionBuilder};
///
/// let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
///     let cond = f.arg(0);
///     f.block(0, |b| b.branch(cond, 1, 2));
///     f.block(1, |b| b.jump(2));
///     f.block(2, |b| b.ret());
/// });
/// let cfg = SsaCfg::from_ssa(&ssa);
/// assert_eq!(cfg.block_predecessors(2), &[0, 1]);
/// ```
#[derive(Debug)]
pub struct SsaCfg<'a> {
    ssa: &'a SsaFunction,
    /// successors[block_id] = blocks control can flow to from block_id.
    successors: Vec<Vec<usize>>,
    /// predecessors[block_id] = blocks that can jump to block_id.
    predecessors: Vec<Vec<usize>>,
}

impl<'a> SsaCfg<'a> {
    /// Creates a CFG view from an SSA function.
    #[must_use]
    pub fn from_ssa(ssa: &'a SsaFunction) -> Self {
        let block_count = ssa.block_count();
        let mut successors = vec![Vec::new(); block_count];
        let mut predecessors = vec![Vec::new(); block_count];

        for (block_idx, block) in ssa.blocks().iter().enumerate() {
            for succ in block.successors() {
                if succ >= block_count || successors[block_idx].contains(&succ) {
                    continue;
                }
                successors[block_idx].push(succ);
                predecessors[succ].push(block_idx);
            }
        }

        Self {
            ssa,
            successors,
            predecessors,
        }
    }

    /// Returns the underlying SSA function.
    #[must_use]
    pub const fn ssa(&self) -> &'a SsaFunction {
        self.ssa
    }

    /// Returns the number of blocks in the CFG.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.successors.len()
    }

    /// Returns true if the CFG has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Returns the successor block indices for a given block.
    #[must_use]
    pub fn block_successors(&self, block_idx: usize) -> &[usize] {
        self.successors.get(block_idx).map_or(&[], Vec::as_slice)
    }

    /// Returns the predecessor block indices for a given block.
    #[must_use]
    pub fn block_predecessors(&self, block_idx: usize) -> &[usize] {
        self.predecessors.get(block_idx).map_or(&[], Vec::as_slice)
    }

    /// Returns the blocks with no successors (return, throw, unreachable).
    #[must_use]
    pub fn exits(&self) -> Vec<NodeId> {
        self.successors
            .iter()
            .enumerate()
            .filter(|(_, succs)| succs.is_empty())
            .map(|(idx, _)| NodeId::new(idx))
            .collect()
    }
}

impl GraphBase for SsaCfg<'_> {
    fn node_count(&self) -> usize {
        self.block_count()
    }

    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.block_count()).map(NodeId::new)
    }
}

impl Successors for SsaCfg<'_> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.block_successors(node.index())
            .iter()
            .copied()
            .map(NodeId::new)
    }
}

impl Predecessors for SsaCfg<'_> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.block_predecessors(node.index())
            .iter()
            .copied()
            .map(NodeId::new)
    }
}

impl RootedGraph for SsaCfg<'_> {
    fn entry(&self) -> NodeId {
        NodeId::new(0)
    }
}
