//! Loop analysis over an SSA function.
//!
//! [`LoopAnalyzer`] builds the [`SsaCfg`] view of a function, computes its
//! dominator tree and detects loops in one go. Code motion needs both
//! results, so they are handed out together by [`LoopAnalyzer::analyze_all`].

use crate::{
    analysis::{
        cfg::{detect_loops, LoopForest},
        SsaCfg, SsaFunction,
    },
    utils::graph::algorithms::{compute_dominators_rooted, DominatorTree},
};

/// Computes dominators and the loop nest of an SSA function.
pub struct LoopAnalyzer<'a> {
    cfg: SsaCfg<'a>,
}

impl<'a> LoopAnalyzer<'a> {
    /// Creates an analyzer over the CFG of `ssa`.
    #[must_use]
    pub fn new(ssa: &'a SsaFunction) -> Self {
        Self {
            cfg: SsaCfg::from_ssa(ssa),
        }
    }

    /// Returns the CFG view the analyzer works on.
    #[must_use]
    pub fn cfg(&self) -> &SsaCfg<'a> {
        &self.cfg
    }

    /// Computes the dominator tree rooted at block 0.
    #[must_use]
    pub fn dominators(&self) -> DominatorTree {
        compute_dominators_rooted(&self.cfg)
    }

    /// Detects all natural loops.
    #[must_use]
    pub fn analyze(&self) -> LoopForest {
        detect_loops(&self.cfg, &self.dominators())
    }

    /// Computes the dominator tree and the loops found with it.
    #[must_use]
    pub fn analyze_all(&self) -> (DominatorTree, LoopForest) {
        let dominators = self.dominators();
        let loops = detect_loops(&self.cfg, &dominators);
        (dominators, loops)
    }
}

/// Extension trait for running loop analysis directly on an [`SsaFunction`].
pub trait SsaLoopAnalysis {
    /// Detects all natural loops in the function.
    fn analyze_loops(&self) -> LoopForest;
}

impl SsaLoopAnalysis for SsaFunction {
    fn analyze_loops(&self) -> LoopForest {
        LoopAnalyzer::new(self).analyze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::SsaFunctionBuilder, utils::graph::NodeId};

    #[test]
    fn test_counting_loop() {
        // B0 -> B1 (header) -> B2 (body) -> B1, B1 -> B3 (exit)
        let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
            let n = f.arg(0);
            let i = f.var();
            let next = f.var();
            let mut zero = n;
            f.block(0, |b| {
                zero = b.const_i32(0);
                b.jump(1);
            });
            f.block(1, |b| {
                b.phi_into(i, &[(0, zero), (2, next)]);
                let cond = b.clt(i, n);
                b.branch(cond, 2, 3);
            });
            f.block(2, |b| {
                let one = b.const_i32(1);
                b.op(crate::analysis::SsaOp::Add {
                    dest: next,
                    left: i,
                    right: one,
                });
                b.jump(1);
            });
            f.block(3, |b| b.ret_val(i));
        });

        let forest = ssa.analyze_loops();
        assert_eq!(forest.len(), 1);

        let loop_info = &forest.loops()[0];
        assert_eq!(loop_info.header, NodeId::new(1));
        assert_eq!(loop_info.preheader, Some(NodeId::new(0)));
        assert_eq!(loop_info.latches, vec![NodeId::new(2)]);
        assert_eq!(forest.loop_depth(NodeId::new(2)), 1);
        assert_eq!(forest.loop_depth(NodeId::new(3)), 0);
    }

    #[test]
    fn test_analyze_all_shares_dominators() {
        let ssa = SsaFunctionBuilder::new(0).build_with(|f| {
            f.block(0, |b| b.jump(1));
            f.block(1, |b| b.jump(1));
        });

        let analyzer = LoopAnalyzer::new(&ssa);
        let (dominators, loops) = analyzer.analyze_all();
        assert_eq!(analyzer.cfg().block_count(), 2);
        assert_eq!(dominators.immediate_dominator(NodeId::new(1)), Some(NodeId::new(0)));
        assert_eq!(loops.len(), 1);
        assert_eq!(loops.loops()[0].loop_type, crate::analysis::cfg::LoopType::Infinite);
    }

    #[test]
    fn test_straight_line_has_no_loops() {
        let ssa = SsaFunctionBuilder::new(0).build_with(|f| {
            f.block(0, |b| b.jump(1));
            f.block(1, |b| b.ret());
        });
        assert!(ssa.analyze_loops().is_empty());
    }
}
