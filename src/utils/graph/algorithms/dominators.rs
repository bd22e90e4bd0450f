//! Dominator tree computation using the Lengauer-Tarjan algorithm.
//!
//! A node `d` **dominates** a node `n` if every path from the entry node to `n`
//! must pass through `d`. The **immediate dominator** of `n` (idom(n)) is the
//! unique node that strictly dominates `n` but does not strictly dominate any
//! other dominator of `n`. Making each node's immediate dominator its parent
//! yields the dominator tree, rooted at the entry.
//!
//! Code motion relies on three queries answered here: ancestry
//! ([`DominatorTree::dominates`]), the walk from a block to the root
//! ([`DominatorTree::dominators`]) and the deepest block dominating two others
//! ([`DominatorTree::nearest_common_dominator`]).
//!
//! # Unreachable nodes
//!
//! Nodes that cannot be reached from the entry have no immediate dominator, no
//! depth, and take part in no dominance relation (not even with themselves).

use crate::utils::graph::{NodeId, Predecessors, RootedGraph, Successors};

/// Result of dominator tree computation.
///
/// # Examples
///
/// ```rust
/// use gcmotion::analysis::{SsaCfg, SsaFunctionBuilder};
/// use gcmotion::utils::graph::{algorithms::compute_dominators_rooted, NodeId};
///
/// // B0 -> B1 -> B2
/// let ssa = SsaFunctionBuilder::new(0).build_with(|f| {
///     f.block(0, |b| b.jump(1));
///     f.block(1, |b| b.jump(2));
///     f.block(2, |b| b.ret());
/// });
/// let cfg = SsaCfg::from_ssa(&ssa);
/// let dom_tree = compute_dominators_rooted(&cfg);
///
/// assert!(dom_tree.dominates(NodeId::new(0), NodeId::new(2)));
/// assert_eq!(dom_tree.immediate_dominator(NodeId::new(2)), Some(NodeId::new(1)));
/// ```
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// The entry (root) node of the dominator tree
    entry: NodeId,
    /// Immediate dominator for each node; `None` for the entry and for
    /// unreachable nodes
    idom: Vec<Option<NodeId>>,
    /// Dominator-tree children of each node, by ascending index
    children: Vec<Vec<NodeId>>,
    /// Number of nodes in the graph
    node_count: usize,
}

impl DominatorTree {
    /// Returns the entry (root) node of the dominator tree.
    #[inline]
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// Returns the immediate dominator of a node.
    ///
    /// `None` for the entry node, for unreachable nodes and for indices outside
    /// the graph.
    #[inline]
    pub fn immediate_dominator(&self, node: NodeId) -> Option<NodeId> {
        self.idom.get(node.index()).copied().flatten()
    }

    /// Returns `true` if the node is reachable from the entry.
    #[inline]
    pub fn is_reachable(&self, node: NodeId) -> bool {
        node.index() < self.node_count
            && (node == self.entry || self.idom[node.index()].is_some())
    }

    /// Checks if node `a` dominates node `b`.
    ///
    /// A reachable node dominates itself. The entry node dominates all
    /// reachable nodes.
    ///
    /// # Complexity
    ///
    /// O(depth) where depth is the depth of `b` in the dominator tree.
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        if !self.is_reachable(a) || !self.is_reachable(b) {
            return false;
        }
        self.dominators(b).any(|d| d == a)
    }

    /// Checks if node `a` strictly dominates node `b`.
    #[inline]
    pub fn strictly_dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.dominates(a, b)
    }

    /// Returns an iterator over all dominators of a node, from the node itself
    /// up to (and including) the entry node.
    ///
    /// The iterator is empty for unreachable nodes.
    pub fn dominators(&self, node: NodeId) -> DominatorIterator<'_> {
        DominatorIterator {
            tree: self,
            current: self.is_reachable(node).then_some(node),
        }
    }

    /// Returns the depth of a node in the dominator tree.
    ///
    /// The entry node has depth 0; unreachable nodes have no depth.
    pub fn depth(&self, node: NodeId) -> Option<usize> {
        if !self.is_reachable(node) {
            return None;
        }
        Some(self.dominators(node).count() - 1)
    }

    /// Returns the children of a node in the dominator tree.
    ///
    /// Children are nodes whose immediate dominator is the given node.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.children
            .get(node.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the deepest node that dominates both `a` and `b`.
    ///
    /// The query is commutative and associative, so folding it over a set of
    /// nodes gives the nearest common dominator of the whole set in any order.
    /// An unreachable input is ignored: the other input is returned.
    ///
    /// # Complexity
    ///
    /// O(depth(a) + depth(b)).
    pub fn nearest_common_dominator(&self, a: NodeId, b: NodeId) -> NodeId {
        let (Some(mut depth_a), Some(mut depth_b)) = (self.depth(a), self.depth(b)) else {
            return if self.is_reachable(a) { a } else { b };
        };

        let (mut a, mut b) = (a, b);
        while depth_a > depth_b {
            a = self.parent_or_entry(a);
            depth_a -= 1;
        }
        while depth_b > depth_a {
            b = self.parent_or_entry(b);
            depth_b -= 1;
        }
        while a != b {
            a = self.parent_or_entry(a);
            b = self.parent_or_entry(b);
        }
        a
    }

    /// Returns the number of nodes in the dominator tree.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    fn parent_or_entry(&self, node: NodeId) -> NodeId {
        self.immediate_dominator(node).unwrap_or(self.entry)
    }
}

/// Iterator over dominators of a node, from the node up to the entry.
pub struct DominatorIterator<'a> {
    tree: &'a DominatorTree,
    current: Option<NodeId>,
}

impl Iterator for DominatorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.immediate_dominator(current);
        Some(current)
    }
}

/// Computes the dominator tree for a graph using the Lengauer-Tarjan algorithm.
///
/// # Arguments
///
/// * `graph` - The graph to analyze
/// * `entry` - The node every path starts from
///
/// # Complexity
///
/// - Time: O(E log V) with the simple link/eval used here
/// - Space: O(V)
///
/// # Algorithm Overview
///
/// 1. **DFS numbering**: Assign DFS numbers to nodes and compute the DFS tree
/// 2. **Semidominators**: Compute semidominators in reverse DFS order
/// 3. **Implicit idom**: Resolve buckets while linking the spanning forest
/// 4. **Explicit idom**: Convert implicit to explicit immediate dominators
pub fn compute_dominators<G>(graph: &G, entry: NodeId) -> DominatorTree
where
    G: Successors + Predecessors,
{
    let node_count = graph.node_count();

    if node_count == 0 || entry.index() >= node_count {
        return DominatorTree {
            entry,
            idom: vec![None; node_count],
            children: vec![Vec::new(); node_count],
            node_count,
        };
    }

    let mut lt = LengauerTarjan::new(node_count, entry);
    lt.compute(graph);

    let idom = lt.into_idom();
    let mut children = vec![Vec::new(); node_count];
    for (index, parent) in idom.iter().enumerate() {
        if let Some(parent) = parent {
            children[parent.index()].push(NodeId::new(index));
        }
    }

    DominatorTree {
        entry,
        idom,
        children,
        node_count,
    }
}

/// Convenience function to compute dominators for a [`RootedGraph`].
///
/// This is equivalent to calling `compute_dominators(graph, graph.entry())`.
pub fn compute_dominators_rooted<G>(graph: &G) -> DominatorTree
where
    G: RootedGraph,
{
    compute_dominators(graph, graph.entry())
}

/// Internal state for the Lengauer-Tarjan algorithm.
struct LengauerTarjan {
    entry: NodeId,
    /// DFS number for each node (0 = not visited)
    dfnum: Vec<usize>,
    /// Node with each DFS number minus one (inverse of dfnum)
    vertex: Vec<NodeId>,
    /// Parent in DFS tree
    parent: Vec<Option<NodeId>>,
    /// Semidominator, compared through its DFS number
    semi: Vec<NodeId>,
    idom: Vec<Option<NodeId>>,
    /// Ancestor in the spanning forest for link-eval
    ancestor: Vec<Option<NodeId>>,
    /// Node with minimal semidominator on the compressed path
    best: Vec<NodeId>,
    /// Nodes whose semidominator is this node
    bucket: Vec<Vec<NodeId>>,
}

impl LengauerTarjan {
    fn new(n: usize, entry: NodeId) -> Self {
        Self {
            entry,
            dfnum: vec![0; n],
            vertex: Vec::with_capacity(n),
            parent: vec![None; n],
            semi: (0..n).map(NodeId::new).collect(),
            idom: vec![None; n],
            ancestor: vec![None; n],
            best: (0..n).map(NodeId::new).collect(),
            bucket: vec![Vec::new(); n],
        }
    }

    fn compute<G: Successors + Predecessors>(&mut self, graph: &G) {
        self.number(graph);

        for i in (1..self.vertex.len()).rev() {
            let w = self.vertex[i];
            let Some(parent_w) = self.parent[w.index()] else {
                continue;
            };

            for v in graph.predecessors(w) {
                // Edges from unreachable code do not constrain dominance
                if self.dfnum.get(v.index()).copied().unwrap_or(0) == 0 {
                    continue;
                }
                let u = self.eval(v);
                if self.semi_num(u) < self.semi_num(w) {
                    self.semi[w.index()] = self.semi[u.index()];
                }
            }

            let semi_w = self.semi[w.index()];
            self.bucket[semi_w.index()].push(w);
            self.ancestor[w.index()] = Some(parent_w);

            for v in std::mem::take(&mut self.bucket[parent_w.index()]) {
                let u = self.eval(v);
                self.idom[v.index()] = if self.semi_num(u) < self.semi_num(v) {
                    Some(u)
                } else {
                    Some(parent_w)
                };
            }
        }

        for i in 1..self.vertex.len() {
            let w = self.vertex[i];
            let semi_w = self.semi[w.index()];
            if let Some(idom_w) = self.idom[w.index()] {
                if idom_w != semi_w {
                    self.idom[w.index()] = self.idom[idom_w.index()];
                }
            }
        }
    }

    fn into_idom(self) -> Vec<Option<NodeId>> {
        let mut idom = self.idom;
        idom[self.entry.index()] = None;
        idom
    }

    #[inline]
    fn semi_num(&self, node: NodeId) -> usize {
        self.dfnum[self.semi[node.index()].index()]
    }

    /// Iterative preorder numbering; the parent of a node is whichever visited
    /// node pushed the stack entry it was numbered from.
    fn number<G: Successors>(&mut self, graph: &G) {
        let mut stack = vec![(self.entry, None)];

        while let Some((node, parent)) = stack.pop() {
            let idx = node.index();
            if idx >= self.dfnum.len() || self.dfnum[idx] != 0 {
                continue;
            }

            self.vertex.push(node);
            self.dfnum[idx] = self.vertex.len();
            self.parent[idx] = parent;

            for succ in graph.successors(node) {
                if self.dfnum.get(succ.index()) == Some(&0) {
                    stack.push((succ, Some(node)));
                }
            }
        }
    }

    /// Returns the node with minimal semidominator on the forest path above `v`.
    fn eval(&mut self, v: NodeId) -> NodeId {
        if self.ancestor[v.index()].is_none() {
            return v;
        }
        self.compress(v);
        self.best[v.index()]
    }

    /// Path compression, bottom-up over the collected forest path.
    fn compress(&mut self, v: NodeId) {
        let mut path = Vec::new();
        let mut current = v;
        while let Some(ancestor) = self.ancestor[current.index()] {
            if self.ancestor[ancestor.index()].is_none() {
                break;
            }
            path.push(current);
            current = ancestor;
        }

        while let Some(node) = path.pop() {
            let Some(ancestor) = self.ancestor[node.index()] else {
                continue;
            };
            let best_ancestor = self.best[ancestor.index()];
            if self.semi_num(best_ancestor) < self.semi_num(self.best[node.index()]) {
                self.best[node.index()] = best_ancestor;
            }
            self.ancestor[node.index()] = self.ancestor[ancestor.index()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::traits::tests::TestGraph;

    fn n(index: usize) -> NodeId {
        NodeId::new(index)
    }

    #[test]
    fn test_dominator_empty_graph() {
        let graph = TestGraph::new(0, &[]);
        let dom_tree = compute_dominators(&graph, n(0));
        assert_eq!(dom_tree.node_count(), 0);
        assert!(!dom_tree.is_reachable(n(0)));
    }

    #[test]
    fn test_dominator_linear_chain() {
        let graph = TestGraph::new(4, &[(0, 1), (1, 2), (2, 3)]);
        let dom_tree = compute_dominators_rooted(&graph);

        assert_eq!(dom_tree.immediate_dominator(n(0)), None);
        assert_eq!(dom_tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(dom_tree.immediate_dominator(n(3)), Some(n(2)));
        assert_eq!(dom_tree.depth(n(3)), Some(3));
        assert!(dom_tree.dominates(n(1), n(3)));
        assert!(!dom_tree.dominates(n(3), n(1)));
    }

    #[test]
    fn test_dominator_diamond() {
        //      0
        //     / \
        //    1   2
        //     \ /
        //      3
        let graph = TestGraph::new(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let dom_tree = compute_dominators_rooted(&graph);

        assert_eq!(dom_tree.immediate_dominator(n(3)), Some(n(0)));
        assert!(!dom_tree.strictly_dominates(n(1), n(3)));
        assert!(!dom_tree.strictly_dominates(n(2), n(3)));
        assert_eq!(dom_tree.children(n(0)), &[n(1), n(2), n(3)]);
    }

    #[test]
    fn test_dominator_loop() {
        // 0 -> 1 -> 2 -> 1, 1 -> 3
        let graph = TestGraph::new(4, &[(0, 1), (1, 2), (2, 1), (1, 3)]);
        let dom_tree = compute_dominators_rooted(&graph);

        assert_eq!(dom_tree.immediate_dominator(n(2)), Some(n(1)));
        assert_eq!(dom_tree.immediate_dominator(n(3)), Some(n(1)));
        assert!(dom_tree.dominates(n(1), n(2)));
    }

    #[test]
    fn test_dominator_semidominator_differs_from_parent() {
        // Classic case where the DFS parent is not the immediate dominator:
        // 0 -> 1 -> 2 -> 3, 0 -> 3, 3 -> 4, 1 -> 4
        let graph = TestGraph::new(5, &[(0, 1), (1, 2), (2, 3), (0, 3), (3, 4), (1, 4)]);
        let dom_tree = compute_dominators_rooted(&graph);

        assert_eq!(dom_tree.immediate_dominator(n(2)), Some(n(1)));
        assert_eq!(dom_tree.immediate_dominator(n(3)), Some(n(0)));
        assert_eq!(dom_tree.immediate_dominator(n(4)), Some(n(0)));
    }

    #[test]
    fn test_dominator_iterator() {
        let graph = TestGraph::new(3, &[(0, 1), (1, 2)]);
        let dom_tree = compute_dominators_rooted(&graph);
        let chain: Vec<NodeId> = dom_tree.dominators(n(2)).collect();
        assert_eq!(chain, vec![n(2), n(1), n(0)]);
    }

    #[test]
    fn test_dominator_unreachable_node() {
        // 2 has an edge into the graph but nothing reaches it
        let graph = TestGraph::new(3, &[(0, 1), (2, 1)]);
        let dom_tree = compute_dominators_rooted(&graph);

        assert!(!dom_tree.is_reachable(n(2)));
        assert_eq!(dom_tree.immediate_dominator(n(2)), None);
        assert_eq!(dom_tree.depth(n(2)), None);
        assert!(!dom_tree.dominates(n(0), n(2)));
        assert_eq!(dom_tree.immediate_dominator(n(1)), Some(n(0)));
        assert_eq!(dom_tree.dominators(n(2)).count(), 0);
    }

    #[test]
    fn test_nearest_common_dominator() {
        //        0
        //        |
        //        1
        //       / \
        //      2   3
        //     / \   \
        //    4   5   6
        let graph = TestGraph::new(7, &[(0, 1), (1, 2), (1, 3), (2, 4), (2, 5), (3, 6)]);
        let dom_tree = compute_dominators_rooted(&graph);

        assert_eq!(dom_tree.nearest_common_dominator(n(4), n(5)), n(2));
        assert_eq!(dom_tree.nearest_common_dominator(n(4), n(6)), n(1));
        assert_eq!(dom_tree.nearest_common_dominator(n(2), n(4)), n(2));
        assert_eq!(dom_tree.nearest_common_dominator(n(5), n(5)), n(5));
        assert_eq!(dom_tree.nearest_common_dominator(n(0), n(6)), n(0));
    }

    #[test]
    fn test_nearest_common_dominator_fold_order_independent() {
        let graph = TestGraph::new(7, &[(0, 1), (1, 2), (1, 3), (2, 4), (2, 5), (3, 6)]);
        let dom_tree = compute_dominators_rooted(&graph);

        let blocks = [n(4), n(5), n(6)];
        let forward = blocks
            .iter()
            .copied()
            .reduce(|a, b| dom_tree.nearest_common_dominator(a, b));
        let backward = blocks
            .iter()
            .rev()
            .copied()
            .reduce(|a, b| dom_tree.nearest_common_dominator(a, b));
        assert_eq!(forward, Some(n(1)));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_nearest_common_dominator_ignores_unreachable() {
        let graph = TestGraph::new(3, &[(0, 1), (2, 1)]);
        let dom_tree = compute_dominators_rooted(&graph);
        assert_eq!(dom_tree.nearest_common_dominator(n(2), n(1)), n(1));
        assert_eq!(dom_tree.nearest_common_dominator(n(1), n(2)), n(1));
    }
}
