//! Dominator-tree queries used during scheduling.
//!
//! [`DominatorDepths`] annotates every reachable block with its depth in the
//! dominator tree, so the early scheduler can pick the deeper of two blocks
//! on the same dominator chain with a single comparison.
//! [`nearest_common_dominator`] folds the pairwise LCA over a set of blocks.

use crate::utils::graph::{algorithms::DominatorTree, NodeId};

/// Dominator-tree depth of every block; the root has depth 0.
#[derive(Debug, Clone)]
pub struct DominatorDepths {
    depths: Vec<Option<usize>>,
}

impl DominatorDepths {
    /// Assigns depths with a pre-order walk from the tree's root.
    ///
    /// Blocks unreachable from the root are left without a depth.
    #[must_use]
    pub fn annotate(dominators: &DominatorTree) -> Self {
        let mut depths = vec![None; dominators.node_count()];
        if dominators.node_count() == 0 {
            return Self { depths };
        }

        let mut stack = vec![(dominators.entry(), 0usize)];
        while let Some((block, depth)) = stack.pop() {
            let Some(slot) = depths.get_mut(block.index()) else {
                continue;
            };
            *slot = Some(depth);
            for &child in dominators.children(block).iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        Self { depths }
    }

    /// Returns the depth of `block`, or `None` if it is unreachable.
    #[must_use]
    pub fn depth(&self, block: NodeId) -> Option<usize> {
        self.depths.get(block.index()).copied().flatten()
    }

    /// Returns true if `block` received a depth.
    #[must_use]
    pub fn is_annotated(&self, block: NodeId) -> bool {
        self.depth(block).is_some()
    }

    /// Returns `candidate` if it lies deeper than `current`, else `current`.
    ///
    /// Both blocks are expected on one dominator chain; an unannotated
    /// candidate never wins.
    #[must_use]
    pub fn deeper(&self, current: NodeId, candidate: NodeId) -> NodeId {
        match (self.depth(current), self.depth(candidate)) {
            (Some(a), Some(b)) if b > a => candidate,
            (None, Some(_)) => candidate,
            _ => current,
        }
    }
}

/// Folds the nearest common dominator over `blocks`.
///
/// Unreachable blocks are skipped. Returns `None` if no reachable block was
/// given.
pub fn nearest_common_dominator<I>(dominators: &DominatorTree, blocks: I) -> Option<NodeId>
where
    I: IntoIterator<Item = NodeId>,
{
    blocks
        .into_iter()
        .filter(|&block| dominators.is_reachable(block))
        .reduce(|lca, block| dominators.nearest_common_dominator(lca, block))
}
