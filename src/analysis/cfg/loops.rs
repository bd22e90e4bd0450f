//! Natural loop detection and the loop nest.
//!
//! Loops are found from back edges: an edge `n -> h` where `h` dominates `n`.
//! Every back edge into the same header contributes to one [`LoopInfo`], whose
//! body is the set of blocks that reach a latch without passing through the
//! header. Nesting is derived from body containment.
//!
//! # Loop Structure
//!
//! ```text
//!     [preheader]     <- single predecessor of the header outside the loop
//!          |
//!          v
//!     [header] <------+  <- dominates every block of the loop
//!          |          |
//!          v          |
//!     [body ...]      |
//!          |          |
//!          v          |
//!     [latch] --------+  <- source of a back edge
//!          |
//!          v
//!     [exit ...]         <- outside the loop, with a predecessor inside
//! ```
//!
//! # Loop Depth
//!
//! [`LoopForest::loop_depth`] is the number of loops enclosing a block: 0 for
//! straight-line code, 1 for the body of an outermost loop, and so on. Code
//! motion uses it to prefer blocks that execute less often.
//!
//! ```rust,ignore
//! use gcmotion::analysis::cfg::detect_loops;
//! use gcmotion::utils::graph::algorithms::compute_dominators;
//!
//! let dominators = compute_dominators(&graph, entry);
//! let forest = detect_loops(&graph, &dominators);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::utils::graph::{algorithms::DominatorTree, GraphBase, NodeId, Predecessors, Successors};

/// Classification of loop types based on structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopType {
    /// Exit condition tested at the header.
    /// ```text
    /// while (cond) { body }
    /// ```
    PreTested,

    /// Exit condition tested at the latch.
    /// ```text
    /// do { body } while (cond)
    /// ```
    PostTested,

    /// No edge leaves the loop.
    Infinite,

    /// Multiple latches or exits scattered through the body.
    Complex,
}

/// An edge leaving a loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopExit {
    /// The block inside the loop that branches out.
    pub exiting_block: NodeId,
    /// The block outside the loop that is the exit target.
    pub exit_block: NodeId,
}

/// A natural loop and its place in the loop nest.
#[derive(Debug, Clone)]
pub struct LoopInfo {
    /// The header block.
    pub header: NodeId,

    /// All blocks in the loop body, header included.
    pub body: BTreeSet<NodeId>,

    /// Back edge sources.
    pub latches: Vec<NodeId>,

    /// The single predecessor of the header outside the loop, if there is
    /// exactly one.
    pub preheader: Option<NodeId>,

    /// Exit edges, ordered by exiting block.
    pub exits: Vec<LoopExit>,

    /// Nesting depth (0 = outermost).
    pub depth: usize,

    /// Classification of the loop type.
    pub loop_type: LoopType,

    /// Header of the enclosing loop.
    pub parent: Option<NodeId>,

    /// Headers of the immediately nested loops.
    pub children: Vec<NodeId>,
}

impl LoopInfo {
    /// Creates a loop containing only its header.
    #[must_use]
    pub fn new(header: NodeId) -> Self {
        let mut body = BTreeSet::new();
        body.insert(header);
        Self {
            header,
            body,
            latches: Vec::new(),
            preheader: None,
            exits: Vec::new(),
            depth: 0,
            loop_type: LoopType::Complex,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Returns true if this loop contains the given block.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.body.contains(&node)
    }

    /// Returns the number of blocks in the loop.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Returns true if the loop has exactly one latch.
    #[must_use]
    pub fn has_single_latch(&self) -> bool {
        self.latches.len() == 1
    }

    /// Returns the single latch if there is exactly one.
    #[must_use]
    pub fn single_latch(&self) -> Option<NodeId> {
        match self.latches.as_slice() {
            [latch] => Some(*latch),
            _ => None,
        }
    }

    /// Returns true if the loop has a preheader.
    #[must_use]
    pub fn has_preheader(&self) -> bool {
        self.preheader.is_some()
    }

    /// Returns true if the loop has a preheader and a single latch.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.has_preheader() && self.has_single_latch()
    }

    /// Returns the targets of all exit edges.
    pub fn exit_blocks(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.exits.iter().map(|e| e.exit_block)
    }

    /// Returns true if the header is also an exiting block.
    #[must_use]
    pub fn header_is_exiting(&self) -> bool {
        self.exits.iter().any(|e| e.exiting_block == self.header)
    }

    /// Returns true if a latch is also an exiting block.
    #[must_use]
    pub fn latch_is_exiting(&self) -> bool {
        self.exits
            .iter()
            .any(|e| self.latches.contains(&e.exiting_block))
    }
}

/// All loops of a function, with a block to innermost-loop map.
#[derive(Debug, Clone)]
pub struct LoopForest {
    /// Loops ordered by header.
    loops: Vec<LoopInfo>,
    /// Innermost loop containing each block.
    block_to_loop: Vec<Option<usize>>,
}

impl LoopForest {
    /// Creates an empty loop forest.
    #[must_use]
    pub fn new(block_count: usize) -> Self {
        Self {
            loops: Vec::new(),
            block_to_loop: vec![None; block_count],
        }
    }

    /// Adds a loop to the forest.
    ///
    /// A block already mapped to a loop is remapped only if the new loop is
    /// nested more deeply.
    pub fn add_loop(&mut self, loop_info: LoopInfo) {
        let loop_idx = self.loops.len();

        for &block in &loop_info.body {
            let Some(slot) = self.block_to_loop.get_mut(block.index()) else {
                continue;
            };
            match *slot {
                Some(existing) if self.loops[existing].depth >= loop_info.depth => {}
                _ => *slot = Some(loop_idx),
            }
        }

        self.loops.push(loop_info);
    }

    /// Returns all loops in the forest.
    #[must_use]
    pub fn loops(&self) -> &[LoopInfo] {
        &self.loops
    }

    /// Returns the number of loops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loops.len()
    }

    /// Returns true if there are no loops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Returns the innermost loop containing the given block.
    #[must_use]
    pub fn innermost_loop(&self, block: NodeId) -> Option<&LoopInfo> {
        self.block_to_loop
            .get(block.index())
            .copied()
            .flatten()
            .map(|idx| &self.loops[idx])
    }

    /// Returns the loop with the given header.
    #[must_use]
    pub fn loop_for_header(&self, header: NodeId) -> Option<&LoopInfo> {
        self.loops.iter().find(|l| l.header == header)
    }

    /// Returns the loop depth for a block (0 if not in any loop).
    #[must_use]
    pub fn loop_depth(&self, block: NodeId) -> usize {
        self.innermost_loop(block).map_or(0, |l| l.depth + 1)
    }

    /// Returns true if a block is in any loop.
    #[must_use]
    pub fn is_in_loop(&self, block: NodeId) -> bool {
        self.innermost_loop(block).is_some()
    }

    /// Iterates over all loops in the forest.
    pub fn iter(&self) -> impl Iterator<Item = &LoopInfo> {
        self.loops.iter()
    }
}

/// Detects all natural loops in a graph.
///
/// # Algorithm
///
/// 1. Finds back edges using dominance (`n -> h` where `h` dominates `n`).
/// 2. Grows each loop body backwards from its latches up to the header.
/// 3. Computes preheaders, exits and loop types.
/// 4. Derives nesting from body containment.
///
/// Blocks unreachable from the dominator tree's entry never join a loop.
#[must_use]
pub fn detect_loops<G>(graph: &G, dominators: &DominatorTree) -> LoopForest
where
    G: GraphBase + Successors + Predecessors,
{
    let mut forest = LoopForest::new(graph.node_count());
    let mut loops_by_header: BTreeMap<NodeId, LoopInfo> = BTreeMap::new();

    for node in graph.node_ids() {
        for succ in graph.successors(node) {
            if dominators.dominates(succ, node) {
                let loop_info = loops_by_header
                    .entry(succ)
                    .or_insert_with(|| LoopInfo::new(succ));

                if !loop_info.latches.contains(&node) {
                    loop_info.latches.push(node);
                }
                expand_loop_body(graph, dominators, loop_info, node);
            }
        }
    }

    for loop_info in loops_by_header.values_mut() {
        compute_preheader(graph, loop_info);
        compute_exits(graph, loop_info);
        loop_info.loop_type = classify_loop(loop_info);
    }

    // BTreeMap iteration keeps the loops ordered by header.
    let mut loops: Vec<LoopInfo> = loops_by_header.into_values().collect();
    compute_nesting(&mut loops);

    for loop_info in loops {
        forest.add_loop(loop_info);
    }

    forest
}

/// Returns true as soon as one back edge is found.
#[must_use]
pub fn has_back_edges<G>(graph: &G, dominators: &DominatorTree) -> bool
where
    G: GraphBase + Successors,
{
    graph
        .node_ids()
        .any(|node| graph.successors(node).any(|succ| dominators.dominates(succ, node)))
}

fn expand_loop_body<G>(graph: &G, dominators: &DominatorTree, loop_info: &mut LoopInfo, latch: NodeId)
where
    G: Predecessors,
{
    if loop_info.body.contains(&latch) {
        return;
    }

    let mut worklist = vec![latch];

    while let Some(node) = worklist.pop() {
        if loop_info.body.insert(node) {
            for pred in graph.predecessors(node) {
                if dominators.is_reachable(pred) && !loop_info.body.contains(&pred) {
                    worklist.push(pred);
                }
            }
        }
    }
}

fn compute_preheader<G>(graph: &G, loop_info: &mut LoopInfo)
where
    G: Predecessors,
{
    let outside: Vec<NodeId> = graph
        .predecessors(loop_info.header)
        .filter(|pred| !loop_info.body.contains(pred))
        .collect();

    loop_info.preheader = match outside.as_slice() {
        [single] => Some(*single),
        _ => None,
    };
}

fn compute_exits<G>(graph: &G, loop_info: &mut LoopInfo)
where
    G: Successors,
{
    loop_info.exits.clear();

    for &body_block in &loop_info.body {
        for succ in graph.successors(body_block) {
            if !loop_info.body.contains(&succ) {
                loop_info.exits.push(LoopExit {
                    exiting_block: body_block,
                    exit_block: succ,
                });
            }
        }
    }
}

fn classify_loop(loop_info: &LoopInfo) -> LoopType {
    if loop_info.exits.is_empty() {
        return LoopType::Infinite;
    }

    if let Some(latch) = loop_info.single_latch() {
        if loop_info.exits.iter().all(|e| e.exiting_block == latch) {
            return LoopType::PostTested;
        }
    } else {
        return LoopType::Complex;
    }

    if loop_info
        .exits
        .iter()
        .all(|e| e.exiting_block == loop_info.header)
    {
        return LoopType::PreTested;
    }

    LoopType::Complex
}

/// Fills in `parent`, `children` and `depth`.
///
/// The parent of a loop is the smallest other loop whose body contains its
/// header. Ties on size are broken by header index.
fn compute_nesting(loops: &mut [LoopInfo]) {
    let n = loops.len();
    let header_to_idx: BTreeMap<NodeId, usize> = loops
        .iter()
        .enumerate()
        .map(|(i, l)| (l.header, i))
        .collect();

    for i in 0..n {
        let header = loops[i].header;
        loops[i].parent = (0..n)
            .filter(|&j| j != i && loops[j].body.contains(&header))
            .min_by_key(|&j| (loops[j].size(), loops[j].header))
            .map(|j| loops[j].header);
    }

    for i in 0..n {
        if let Some(parent_idx) = loops[i]
            .parent
            .and_then(|parent| header_to_idx.get(&parent).copied())
        {
            let child = loops[i].header;
            loops[parent_idx].children.push(child);
        }
    }

    for i in 0..n {
        let mut depth = 0;
        let mut current = loops[i].parent;
        while let Some(parent_idx) = current.and_then(|h| header_to_idx.get(&h).copied()) {
            depth += 1;
            if depth > n {
                break;
            }
            current = loops[parent_idx].parent;
        }
        loops[i].depth = depth;
    }
}
