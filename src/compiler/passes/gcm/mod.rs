//! Global Code Motion.
//!
//! Repositions movable operations of one function to cut the number of
//! times they execute while keeping every use dominated by its definition.
//! Computations leave loops when their operands allow it and otherwise sink
//! towards their consumers. Phis, terminators, calls, exception-handling
//! pads, memory accesses and trapping arithmetic never move.
//!
//! # Algorithm
//!
//! The pass follows Click's two-phase scheduling:
//!
//! 1. Annotate every block with its depth in the dominator tree.
//! 2. **Early**: starting from the operands of every pinned operation, move
//!    each operation to the shallowest block that still sees all of its
//!    operands (the deepest operand block).
//! 3. Clear the visitation memo.
//! 4. **Late**: starting from the users of every pinned operation, and then
//!    from any operation not reached that way, compute the nearest common
//!    dominator of all use blocks and walk from there up to the early block,
//!    picking the block with the smallest loop depth.
//! 5. Rebuild the order inside every block from its contents: pinned
//!    operations keep their order and every other operation goes right
//!    before its first use. Running the pass again changes nothing.
//!
//! ```text
//!  before                      after
//!
//!  B0: jump B1                 B0: t = mul a, b       <- hoisted
//!  B1: i = phi(a, i')              jump B1
//!      c = clt i, b            B1: i = phi(a, i')
//!      branch c, B2, B3            c = clt i, b
//!  B2: t = mul a, b                branch c, B2, B3
//!      i' = add i, t           B2: i' = add i, t
//!      jump B1                     jump B1
//! ```
//!
//! Both phases use explicit stacks rather than recursion and run each
//! operation's body at most once per phase. The dominator tree and loop
//! forest are read-only inputs computed by the caller.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gcmotion::{analysis::LoopAnalyzer, compiler::GlobalCodeMotion};
//!
//! let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
//! let stats = GlobalCodeMotion::new().run(&mut ssa, &dominators, &loops)?;
//! println!("{} hoisted, {} sunk", stats.hoisted, stats.sunk);
//! ```

mod config;
mod dominance;
mod early;
mod late;
mod order;
mod pinning;
mod placement;

use std::fmt;

use strum::{Display, EnumIter};

pub use config::GcmConfig;
pub use dominance::{nearest_common_dominator, DominatorDepths};
pub use pinning::{is_pinned, pin_reason, PinReason};
pub use placement::{InsertPoint, OpId, Placement};

use crate::{
    analysis::{cfg::LoopForest, LoopAnalyzer, SsaFunction},
    compiler::{CompilerContext, EventKind, SsaPass},
    utils::graph::{algorithms::DominatorTree, NodeId},
    Error, Result,
};

/// How a relocated operation moved relative to its original block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum MotionKind {
    /// The new block has a smaller loop depth.
    Hoisted,
    /// The new block is strictly dominated by the original one.
    Sunk,
    /// Any other change of block.
    Moved,
}

impl MotionKind {
    /// The event kind recorded for this motion.
    #[must_use]
    pub fn event_kind(self) -> EventKind {
        match self {
            Self::Hoisted => EventKind::InstructionHoisted,
            Self::Sunk => EventKind::InstructionSunk,
            Self::Moved => EventKind::InstructionMoved,
        }
    }
}

/// One operation that ended up in a different block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Rendering of the operation, e.g. `v7 = mul v0, v1`.
    pub operation: String,
    /// Block before the pass.
    pub from: usize,
    /// Block after the pass.
    pub to: usize,
    /// Classification of the move.
    pub kind: MotionKind,
}

impl fmt::Display for Relocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: B{} -> B{}", self.operation, self.from, self.to)
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcmStats {
    /// Operations whose early body ran.
    pub early_visits: usize,
    /// Operations whose late body ran.
    pub late_visits: usize,
    /// Operations that ended in a different block than they started in.
    pub moved: usize,
    /// Of `moved`, those that reached a smaller loop depth.
    pub hoisted: usize,
    /// Of `moved`, those that went down the dominator tree.
    pub sunk: usize,
    /// Operations left in place because their block did not dominate their
    /// uses.
    pub skipped: usize,
    /// True if any block's instruction order differs from the input.
    pub reordered: bool,
    /// Every change of block, in arena order.
    pub relocations: Vec<Relocation>,
}

impl GcmStats {
    /// Returns true if the function was modified.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.moved > 0 || self.reordered
    }
}

/// Scheduling state for one run: the arena plus read-only analyses.
pub(crate) struct Scheduler<'a> {
    pub(crate) placement: Placement,
    pub(crate) dominators: &'a DominatorTree,
    pub(crate) loops: &'a LoopForest,
    pub(crate) depths: DominatorDepths,
    pub(crate) config: &'a GcmConfig,
    pub(crate) visited: Vec<bool>,
    pub(crate) stats: GcmStats,
}

impl<'a> Scheduler<'a> {
    pub(crate) fn new(
        placement: Placement,
        dominators: &'a DominatorTree,
        loops: &'a LoopForest,
        config: &'a GcmConfig,
    ) -> Self {
        let visited = vec![false; placement.len()];
        Self {
            placement,
            dominators,
            loops,
            depths: DominatorDepths::annotate(dominators),
            config,
            visited,
            stats: GcmStats::default(),
        }
    }

    /// Marks `id` visited; returns false if it already was.
    pub(crate) fn enter(&mut self, id: OpId) -> bool {
        !std::mem::replace(&mut self.visited[id.index()], true)
    }

    fn reset_memo(&mut self) {
        self.visited.fill(false);
    }

    fn is_live_root(&self, id: OpId) -> bool {
        self.placement.is_pinned(id) && self.depths.is_annotated(self.placement.block(id))
    }

    fn run_early(&mut self) {
        let roots: Vec<OpId> = self.placement.ids().filter(|&id| self.is_live_root(id)).collect();
        for root in roots {
            self.visited[root.index()] = true;
            let operands = self.placement.operands(root).to_vec();
            for operand in operands {
                self.schedule_early(operand);
            }
        }
    }

    fn run_late(&mut self) {
        let roots: Vec<OpId> = self.placement.ids().filter(|&id| self.is_live_root(id)).collect();
        for root in roots {
            self.visited[root.index()] = true;
            let users = self.placement.uses(root).to_vec();
            for user in users {
                self.schedule_late(user);
            }
        }

        // Values computed only from arguments and constants have no pinned
        // ancestor, so the seeds above never reach them.
        let remaining: Vec<OpId> = self.placement.ids().collect();
        for id in remaining {
            self.schedule_late(id);
        }
    }

    fn classify(&self, from: NodeId, to: NodeId) -> MotionKind {
        if self.loops.loop_depth(to) < self.loops.loop_depth(from) {
            MotionKind::Hoisted
        } else if self.dominators.strictly_dominates(from, to) {
            MotionKind::Sunk
        } else {
            MotionKind::Moved
        }
    }

    fn summarize(&mut self, initial_order: &[Vec<OpId>]) {
        let mut relocations = Vec::new();
        for id in self.placement.ids() {
            let (from, to) = (self.placement.origin(id), self.placement.block(id));
            if from == to {
                continue;
            }
            relocations.push(Relocation {
                operation: self.placement.describe(id),
                from: from.index(),
                to: to.index(),
                kind: self.classify(from, to),
            });
        }

        self.stats.moved = relocations.len();
        self.stats.hoisted = relocations
            .iter()
            .filter(|r| r.kind == MotionKind::Hoisted)
            .count();
        self.stats.sunk = relocations
            .iter()
            .filter(|r| r.kind == MotionKind::Sunk)
            .count();
        self.stats.reordered = initial_order
            .iter()
            .enumerate()
            .any(|(block, sequence)| self.placement.sequence(NodeId::new(block)) != sequence.as_slice());
        self.stats.relocations = relocations;
    }
}

/// The code motion core.
///
/// Holds only configuration; every call to [`run`](Self::run) works on the
/// function and analyses it is given.
#[derive(Debug, Clone, Default)]
pub struct GlobalCodeMotion {
    config: GcmConfig,
}

impl GlobalCodeMotion {
    /// Creates the transformation with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the transformation with a custom configuration.
    #[must_use]
    pub fn with_config(config: GcmConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GcmConfig {
        &self.config
    }

    /// Schedules every movable operation of `ssa` in place.
    ///
    /// `dominators` must be the dominator tree of `ssa`'s CFG rooted at the
    /// entry, and `loops` its loop forest. Blocks unreachable from the root
    /// are left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::GraphError`] if `dominators` covers a different number of
    ///   blocks than `ssa` has.
    /// - [`Error::Malformed`] if a value is defined more than once.
    pub fn run(
        &self,
        ssa: &mut SsaFunction,
        dominators: &DominatorTree,
        loops: &LoopForest,
    ) -> Result<GcmStats> {
        if ssa.is_empty() {
            return Ok(GcmStats::default());
        }
        if dominators.node_count() != ssa.block_count() {
            return Err(Error::GraphError(format!(
                "dominator tree covers {} blocks but the function has {}",
                dominators.node_count(),
                ssa.block_count()
            )));
        }

        let placement = Placement::build(ssa)?;
        let initial_order: Vec<Vec<OpId>> = (0..ssa.block_count())
            .map(|block| placement.sequence(NodeId::new(block)).to_vec())
            .collect();

        let mut scheduler = Scheduler::new(placement, dominators, loops, &self.config);
        scheduler.run_early();
        scheduler.reset_memo();
        scheduler.run_late();
        scheduler.arrange_blocks(&initial_order);
        scheduler.summarize(&initial_order);

        let Scheduler {
            placement, stats, ..
        } = scheduler;
        if stats.changed() {
            placement.materialize(ssa);
        }
        Ok(stats)
    }
}

/// [`SsaPass`] wrapper around [`GlobalCodeMotion`].
///
/// Computes the dominator tree and loop forest of each function, runs the
/// core once and records one event per relocated operation.
#[derive(Debug, Clone, Default)]
pub struct GlobalCodeMotionPass {
    gcm: GlobalCodeMotion,
}

impl GlobalCodeMotionPass {
    /// Creates the pass with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the pass with a custom configuration.
    #[must_use]
    pub fn with_config(config: GcmConfig) -> Self {
        Self {
            gcm: GlobalCodeMotion::with_config(config),
        }
    }
}

impl SsaPass for GlobalCodeMotionPass {
    fn name(&self) -> &'static str {
        "gcm"
    }

    fn description(&self) -> &'static str {
        "Hoists computations out of loops and sinks them towards their uses"
    }

    fn should_run(&self, ssa: &SsaFunction, _ctx: &CompilerContext) -> bool {
        !ssa.is_empty() && ssa.total_instruction_count() <= self.gcm.config().max_instructions
    }

    fn run_on_function(&self, ssa: &mut SsaFunction, ctx: &CompilerContext) -> Result<bool> {
        let function = ssa.name().to_string();
        ctx.events
            .record(EventKind::PassStarted)
            .function(function.as_str())
            .pass(self.name());

        let (dominators, loops) = LoopAnalyzer::new(ssa).analyze_all();
        let stats = match self.gcm.run(ssa, &dominators, &loops) {
            Ok(stats) => stats,
            Err(e) => {
                ctx.events
                    .record(EventKind::Error)
                    .function(function.as_str())
                    .pass(self.name())
                    .message(e.to_string());
                return Err(e);
            }
        };

        for relocation in &stats.relocations {
            ctx.events
                .record(relocation.kind.event_kind())
                .at(function.as_str(), relocation.to)
                .pass(self.name())
                .message(relocation.to_string());
        }
        if stats.skipped > 0 {
            ctx.events
                .record(EventKind::Warning)
                .function(function.as_str())
                .pass(self.name())
                .message(format!(
                    "{} operations left in place: block does not dominate their uses",
                    stats.skipped
                ));
        }

        ctx.events
            .record(EventKind::PassCompleted)
            .function(function.as_str())
            .pass(self.name())
            .message(format!(
                "{} moved ({} hoisted, {} sunk)",
                stats.moved, stats.hoisted, stats.sunk
            ));

        Ok(stats.changed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{SsaFunctionBuilder, SsaOp, SsaVarId};

    /// B0 -> B1 (header) <-> B2 (body), B1 -> B3 (exit).
    ///
    /// `v5 = mul v0, v1` is written inside the loop body.
    fn invariant_in_body() -> SsaFunction {
        SsaFunctionBuilder::new(2).name("sum").build_with(|f| {
            let (a, b) = (f.arg(0), f.arg(1));
            let i = f.var();
            let next = f.var();
            f.block(0, |bb| bb.jump(1));
            f.block(1, |bb| {
                bb.phi_into(i, &[(0, a), (2, next)]);
                let cond = bb.clt(i, b);
                bb.branch(cond, 2, 3);
            });
            f.block(2, |bb| {
                let inv = bb.mul(a, b);
                bb.op(SsaOp::Add {
                    dest: next,
                    left: i,
                    right: inv,
                });
                bb.jump(1);
            });
            f.block(3, |bb| bb.ret_val(i));
        })
    }

    #[test]
    fn test_run_hoists_and_reports() {
        let mut ssa = invariant_in_body();
        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();

        let stats = GlobalCodeMotion::new()
            .run(&mut ssa, &dominators, &loops)
            .unwrap();

        assert!(stats.changed());
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.hoisted, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.relocations[0].from, 2);
        assert_eq!(stats.relocations[0].to, 0);
        assert_eq!(stats.relocations[0].to_string(), "v5 = mul v0, v1: B2 -> B0");

        let entry = ssa.block(0).unwrap();
        assert_eq!(entry.instruction_count(), 2);
        assert_eq!(entry.instructions()[0].def(), Some(SsaVarId::new(5)));
    }

    #[test]
    fn test_graph_mismatch_is_rejected() {
        let mut ssa = invariant_in_body();
        let other = SsaFunctionBuilder::new(0).build_with(|f| f.block(0, |b| b.ret()));
        let (dominators, loops) = LoopAnalyzer::new(&other).analyze_all();

        let err = GlobalCodeMotion::new()
            .run(&mut ssa, &dominators, &loops)
            .unwrap_err();
        assert!(matches!(err, Error::GraphError(_)));
    }

    #[test]
    fn test_empty_function_is_noop() {
        let mut ssa = SsaFunction::new(0);
        let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
        let stats = GlobalCodeMotion::new()
            .run(&mut ssa, &dominators, &loops)
            .unwrap();
        assert!(!stats.changed());
    }

    #[test]
    fn test_pass_records_events() {
        let mut ssa = invariant_in_body();
        let ctx = CompilerContext::new();
        let pass = GlobalCodeMotionPass::new();

        assert!(pass.should_run(&ssa, &ctx));
        assert!(pass.run_on_function(&mut ssa, &ctx).unwrap());

        assert!(ctx.events.has(EventKind::PassStarted));
        assert!(ctx.events.has(EventKind::PassCompleted));
        assert_eq!(ctx.events.count_kind(EventKind::InstructionHoisted), 1);

        let hoisted = ctx.events.filter_kind(EventKind::InstructionHoisted).next().unwrap();
        assert_eq!(hoisted.function.as_deref(), Some("sum"));
        assert_eq!(hoisted.location, Some(0));
        assert_eq!(hoisted.pass.as_deref(), Some("gcm"));

        // Nothing left to do the second time around.
        assert!(!pass.run_on_function(&mut ssa, &ctx).unwrap());
    }

    #[test]
    fn test_pass_respects_instruction_limit() {
        let ssa = invariant_in_body();
        let ctx = CompilerContext::new();
        let pass = GlobalCodeMotionPass::with_config(GcmConfig::new().with_max_instructions(2));
        assert!(!pass.should_run(&ssa, &ctx));
        assert!(!pass.should_run(&SsaFunction::new(0), &CompilerContext::new()));
    }
}
