//! Late scheduling: move each operation down towards its uses, then back up
//! out of loops as far as its early position allows.
//!
//! The latest legal block is the nearest common dominator of all use blocks.
//! A phi reads its operand at the end of the matching predecessor, so for phi
//! users that predecessor counts as the use block. Between that LCA and the
//! block the early phase chose, the block with the smallest loop depth wins;
//! on a tie the one closest to the LCA is kept.
//!
//! Only the block is final here. The order inside each block is rebuilt
//! afterwards by [`Scheduler::arrange_blocks`].

use crate::{
    compiler::passes::gcm::{dominance, placement::InsertPoint, OpId, Scheduler},
    utils::graph::NodeId,
};

impl Scheduler<'_> {
    /// Schedules every user of `root` transitively, then `root` itself.
    ///
    /// Each operation's body runs at most once per phase. Pinned operations
    /// are walked but never relocated.
    pub(crate) fn schedule_late(&mut self, root: OpId) {
        if !self.enter(root) {
            return;
        }

        let mut stack = vec![(root, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            if let Some(&user) = self.placement.uses(id).get(next) {
                frame.1 += 1;
                if self.enter(user) {
                    stack.push((user, 0));
                }
                continue;
            }

            stack.pop();
            self.stats.late_visits += 1;
            self.place_late(id);
        }
    }

    fn place_late(&mut self, id: OpId) {
        let current = self.placement.block(id);
        if self.placement.is_pinned(id) || !self.depths.is_annotated(current) {
            return;
        }

        let use_blocks: Vec<NodeId> = self
            .placement
            .uses(id)
            .iter()
            .flat_map(|&user| self.placement.use_blocks(id, user))
            .collect();
        let Some(lca) = dominance::nearest_common_dominator(self.dominators, use_blocks) else {
            return;
        };

        if !self.dominators.dominates(current, lca) {
            self.stats.skipped += 1;
            return;
        }

        let best = if self.config.hoist_out_of_loops {
            self.shallowest_loop_block(lca, current)
        } else {
            lca
        };

        if best != current {
            let at = self
                .placement
                .first_use_in(id, best)
                .map_or(InsertPoint::BeforeTerminator, InsertPoint::Before);
            self.placement.relocate(id, best, at);
        }
    }

    /// Walks from `lca` up the dominator tree to `limit` (inclusive) and
    /// returns the block with the smallest loop depth, keeping the one
    /// closest to `lca` on ties.
    fn shallowest_loop_block(&self, lca: NodeId, limit: NodeId) -> NodeId {
        let mut best = lca;
        let mut best_depth = self.loops.loop_depth(lca);

        for block in self.dominators.dominators(lca) {
            let depth = self.loops.loop_depth(block);
            if depth < best_depth {
                best = block;
                best_depth = depth;
            }
            if block == limit {
                break;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analysis::{LoopAnalyzer, SsaFunction, SsaFunctionBuilder, SsaOp, SsaVarId},
        compiler::passes::gcm::{GcmConfig, Placement, Scheduler},
        utils::graph::NodeId,
    };

    /// B0 -> B1 (preheader) -> B2 (header) <-> B3 (body), B2 -> B4 (exit).
    ///
    /// `v3 = mul v0, v1` sits in B0 and is only used in the loop body.
    fn loop_with_invariant() -> SsaFunction {
        SsaFunctionBuilder::new(2).build_with(|f| {
            let (a, b) = (f.arg(0), f.arg(1));
            let i = f.var();
            let inv = f.var();
            let next = f.var();
            f.block(0, |bb| {
                bb.op(SsaOp::Mul {
                    dest: inv,
                    left: a,
                    right: b,
                });
                bb.jump(1);
            });
            f.block(1, |bb| bb.jump(2));
            f.block(2, |bb| {
                bb.phi_into(i, &[(1, a), (3, next)]);
                let cond = bb.clt(i, b);
                bb.branch(cond, 3, 4);
            });
            f.block(3, |bb| {
                bb.op(SsaOp::Add {
                    dest: next,
                    left: i,
                    right: inv,
                });
                bb.jump(2);
            });
            f.block(4, |bb| bb.ret_val(i));
        })
    }

    fn find(scheduler: &Scheduler<'_>, var: SsaVarId) -> super::OpId {
        scheduler
            .placement
            .ids()
            .find(|&id| scheduler.placement.result(id) == Some(var))
            .unwrap()
    }

    #[test]
    fn test_late_stops_before_loop() {
        let ssa = loop_with_invariant();
        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
        let config = GcmConfig::default();
        let mut scheduler =
            Scheduler::new(Placement::build(&ssa).unwrap(), &dominators, &loops, &config);

        let inv = find(&scheduler, SsaVarId::new(3));
        scheduler.schedule_late(inv);

        // LCA is the body B3; B2 and B3 are in the loop, B1 is the first
        // loop-free block on the way up.
        assert_eq!(scheduler.placement.block(inv), NodeId::new(1));
        assert_eq!(scheduler.placement.sequence(NodeId::new(1))[0], inv);
    }

    #[test]
    fn test_sink_only_moves_to_lca() {
        let ssa = loop_with_invariant();
        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
        let config = GcmConfig::sink_only();
        let mut scheduler =
            Scheduler::new(Placement::build(&ssa).unwrap(), &dominators, &loops, &config);

        let inv = find(&scheduler, SsaVarId::new(3));
        scheduler.schedule_late(inv);

        assert_eq!(scheduler.placement.block(inv), NodeId::new(3));
        let add = find(&scheduler, SsaVarId::new(4));
        assert_eq!(scheduler.placement.sequence(NodeId::new(3))[0], inv);
        assert_eq!(scheduler.placement.sequence(NodeId::new(3))[1], add);
    }

    #[test]
    fn test_tie_keeps_block_closest_to_lca() {
        // B0 -> B1 -> B2 -> B3, no loops: every block has depth 0.
        let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
            let a = f.arg(0);
            let x = f.var();
            f.block(0, |b| {
                b.op(SsaOp::Neg {
                    dest: x,
                    operand: a,
                });
                b.jump(1);
            });
            f.block(1, |b| b.jump(2));
            f.block(2, |b| b.jump(3));
            f.block(3, |b| b.ret_val(x));
        });
        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
        let config = GcmConfig::default();
        let mut scheduler =
            Scheduler::new(Placement::build(&ssa).unwrap(), &dominators, &loops, &config);

        let x = find(&scheduler, SsaVarId::new(1));
        scheduler.schedule_late(x);
        assert_eq!(scheduler.placement.block(x), NodeId::new(3));
    }

    #[test]
    fn test_phi_operand_uses_predecessor_block() {
        // B0: branch v0 -> B1 / B2; B1, B2: jump B3;
        // B3: v2 = phi(v1 from B1, v0 from B2); ret v2
        // v1 = neg v0 sits in B0 and is only used on the B1 -> B3 edge.
        let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
            let a = f.arg(0);
            let neg = f.var();
            f.block(0, |b| {
                b.op(SsaOp::Neg {
                    dest: neg,
                    operand: a,
                });
                b.branch(a, 1, 2);
            });
            f.block(1, |b| b.jump(3));
            f.block(2, |b| b.jump(3));
            f.block(3, |b| {
                let merged = b.phi(&[(1, neg), (2, a)]);
                b.ret_val(merged);
            });
        });
        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
        let config = GcmConfig::default();
        let mut scheduler =
            Scheduler::new(Placement::build(&ssa).unwrap(), &dominators, &loops, &config);

        let neg = find(&scheduler, SsaVarId::new(1));
        scheduler.schedule_late(neg);
        assert_eq!(scheduler.placement.block(neg), NodeId::new(1));
    }

    #[test]
    fn test_no_uses_stays_put() {
        let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
            let a = f.arg(0);
            f.block(0, |b| {
                let _ = b.neg(a);
                b.jump(1);
            });
            f.block(1, |b| b.ret());
        });
        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
        let config = GcmConfig::default();
        let mut scheduler =
            Scheduler::new(Placement::build(&ssa).unwrap(), &dominators, &loops, &config);

        let neg = find(&scheduler, SsaVarId::new(1));
        scheduler.schedule_late(neg);
        assert_eq!(scheduler.placement.block(neg), NodeId::new(0));
        assert_eq!(scheduler.stats.late_visits, 1);
    }
}
