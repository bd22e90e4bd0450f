//! Program analysis over SSA form.
//!
//! - [`ssa`] - the SSA representation, its builder and dominance verifier
//! - [`cfg`] - natural loop detection and the loop forest
//!
//! Both build on the generic graph infrastructure in [`crate::utils::graph`].
//!
//! # Usage
//!
//! ```rust
//! use gcmotion::analysis::{LoopAnalyzer, SsaFunctionBuilder};
//!
//! let ssa = SsaFunctionBuilder::new(1).build_with(|f| {
//!     let n = f.arg(0);
//!     let i = f.var();
//!     let next = f.var();
//!     f.block(0, |b| b.jump(1));
//!     f.block(1, |b| {
//!         b.phi_into(i, &[(0, n), (2, next)]);
//!         let c = b.clt(i, n);
//!         b.branch(c, 2, 3);
//!     });
//!     f.block(2, |b| {
//!         b.op(gcmotion::analysis::SsaOp::Neg { dest: next, operand: i });
//!         b.jump(1);
//!     });
//!     f.block(3, |b| b.ret());
//! });
//!
//! let (_dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
//! assert_eq!(loops.len(), 1);
//! ```

pub mod cfg;
pub mod ssa;

pub use cfg::{detect_loops, LoopAnalyzer, LoopForest, LoopInfo, LoopType, SsaLoopAnalysis};
pub use ssa::{
    verify_dominance, ConstValue, DefSite, OpTraits, PhiNode, PhiOperand, SsaBlock,
    SsaBlockBuilder, SsaCfg, SsaFunction, SsaFunctionBuilder, SsaFunctionContext, SsaInstruction,
    SsaOp, SsaVarId,
};
