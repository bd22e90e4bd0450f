//! Early scheduling: move each operation up to the shallowest block where
//! all of its operands are available.
//!
//! The block chosen is the deepest of the operands' (already scheduled)
//! blocks, or the dominator-tree root if the operation reads no
//! operation-defined value. Since every operand block dominates the
//! operation's original block they all lie on one dominator chain, so a
//! depth comparison is enough to pick the deepest.

use crate::compiler::passes::gcm::{placement::InsertPoint, OpId, Scheduler};

impl Scheduler<'_> {
    /// Schedules `root` and, first, every operand it transitively depends on.
    ///
    /// Each operation's body runs at most once per phase. Pinned operations
    /// are walked but never relocated.
    pub(crate) fn schedule_early(&mut self, root: OpId) {
        if !self.enter(root) {
            return;
        }

        let mut stack = vec![(root, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            if let Some(&operand) = self.placement.operands(id).get(next) {
                frame.1 += 1;
                if self.enter(operand) {
                    stack.push((operand, 0));
                }
                continue;
            }

            stack.pop();
            self.stats.early_visits += 1;
            self.place_early(id);
        }
    }

    fn place_early(&mut self, id: OpId) {
        if self.placement.is_pinned(id) || !self.depths.is_annotated(self.placement.block(id)) {
            return;
        }

        let mut target = self.dominators.entry();
        for &operand in self.placement.operands(id) {
            target = self.depths.deeper(target, self.placement.block(operand));
        }

        if self.placement.block(id) != target {
            self.placement
                .relocate(id, target, InsertPoint::BeforeTerminator);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        analysis::{LoopAnalyzer, SsaFunctionBuilder, SsaOp},
        compiler::passes::gcm::{GcmConfig, Placement, Scheduler},
        utils::graph::NodeId,
    };

    #[test]
    fn test_early_hoists_to_deepest_operand_block() {
        // B0: v1 = const 1; branch v0 -> B1 / B2
        // B1: v2 = const 2; jump B3
        // B2: jump B3
        // B3: v3 = add v0, v1; v4 = mul v3, v3; ret v4
        let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
            let a = f.arg(0);
            let one = f.var();
            let sum = f.var();
            f.block(0, |b| {
                b.op(SsaOp::Const {
                    dest: one,
                    value: crate::analysis::ConstValue::I32(1),
                });
                b.branch(a, 1, 2);
            });
            f.block(1, |b| {
                let _ = b.const_i32(2);
                b.jump(3);
            });
            f.block(2, |b| b.jump(3));
            f.block(3, |b| {
                b.op(SsaOp::Add {
                    dest: sum,
                    left: a,
                    right: one,
                });
                let prod = b.mul(sum, sum);
                b.ret_val(prod);
            });
        });

        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
        let placement = Placement::build(&ssa).unwrap();
        let config = GcmConfig::default();
        let mut scheduler = Scheduler::new(placement, &dominators, &loops, &config);

        let ret = scheduler
            .placement
            .ids()
            .find(|&id| scheduler.placement.describe(id).starts_with("ret"))
            .unwrap();
        let mul = scheduler.placement.operands(ret)[0];
        scheduler.schedule_early(mul);

        let add = scheduler.placement.operands(mul)[0];
        assert_eq!(scheduler.placement.block(add), NodeId::new(0));
        assert_eq!(scheduler.placement.block(mul), NodeId::new(0));
        assert_eq!(scheduler.stats.early_visits, 3);

        // Both landed in front of B0's branch, in dependency order.
        let seq = scheduler.placement.sequence(NodeId::new(0));
        assert_eq!(seq.len(), 4);
        assert_eq!(seq[1], add);
        assert_eq!(seq[2], mul);

        // A second call is memoized.
        scheduler.schedule_early(mul);
        assert_eq!(scheduler.stats.early_visits, 3);
    }
}
