//! Final instruction order inside each block.
//!
//! Scheduling only decides blocks. Once it is done, every block's sequence
//! is rebuilt from the block's contents alone, so a second run over the
//! result produces the same layout.
//!
//! A skeleton of operations keeps its relative order. Every other operation
//! is inserted immediately before its first user in the block, or before
//! the terminator if it has none there. Users are inserted before their
//! operands, and operations that become ready together are taken in order
//! of their result value.
//!
//! With near-use placement the skeleton is the pinned operations. Without
//! it the skeleton is every operation the block held before the pass, so
//! only operations arriving from other blocks are placed.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    analysis::SsaVarId,
    compiler::passes::gcm::{OpId, Placement, Scheduler},
    utils::graph::NodeId,
};

impl Scheduler<'_> {
    /// Rebuilds the sequence of every reachable block.
    ///
    /// `initial_order` is the per-block sequence before scheduling started.
    pub(crate) fn arrange_blocks(&mut self, initial_order: &[Vec<OpId>]) {
        for (index, before) in initial_order.iter().enumerate() {
            let block = NodeId::new(index);
            if !self.depths.is_annotated(block) {
                continue;
            }

            let skeleton: Vec<OpId> = before
                .iter()
                .copied()
                .filter(|&id| self.placement.block(id) == block)
                .filter(|&id| !self.config.place_near_uses || self.placement.is_pinned(id))
                .collect();
            let floating: Vec<OpId> = self
                .placement
                .sequence(block)
                .iter()
                .copied()
                .filter(|id| !skeleton.contains(id))
                .collect();

            let layout = arrange(&self.placement, skeleton, &floating);
            self.placement.set_sequence(block, layout);
        }
    }
}

fn arrange(placement: &Placement, skeleton: Vec<OpId>, floating: &[OpId]) -> Vec<OpId> {
    let key = |id: OpId| (placement.result(id).map_or(usize::MAX, SsaVarId::index), id);
    let members: BTreeSet<OpId> = floating.iter().copied().collect();

    // Floating users each operation still waits for.
    let mut waiting: BTreeMap<OpId, usize> = floating
        .iter()
        .map(|&id| {
            let users = placement
                .uses(id)
                .iter()
                .filter(|user| members.contains(user))
                .count();
            (id, users)
        })
        .collect();
    let mut ready: BTreeSet<(usize, OpId)> = waiting
        .iter()
        .filter(|&(_, &users)| users == 0)
        .map(|(&id, _)| key(id))
        .collect();

    let mut layout = skeleton;
    while !waiting.is_empty() {
        // Only a cyclic (malformed) function leaves nothing ready.
        let next = match ready.pop_first() {
            Some((_, id)) => id,
            None => match waiting.keys().copied().min_by_key(|&id| key(id)) {
                Some(id) => id,
                None => break,
            },
        };
        waiting.remove(&next);
        insert_before_first_use(placement, &mut layout, next);

        let operands: BTreeSet<OpId> = placement.operands(next).iter().copied().collect();
        for operand in operands {
            if let Some(users) = waiting.get_mut(&operand) {
                *users = users.saturating_sub(1);
                if *users == 0 {
                    ready.insert(key(operand));
                }
            }
        }
    }

    layout
}

fn insert_before_first_use(placement: &Placement, layout: &mut Vec<OpId>, id: OpId) {
    let users = placement.uses(id);
    let at = layout
        .iter()
        .position(|other| users.contains(other))
        .unwrap_or_else(|| match layout.last() {
            Some(&last) if placement.is_terminator(last) => layout.len() - 1,
            _ => layout.len(),
        });
    layout.insert(at, id);
}
