//! # gcmotion Prelude
//!
//! The types most callers need to build a function, analyse it and run
//! code motion over it.
//!
//! ```rust
//! use gcmotion::prelude::*;
//!
//! let mut ssa = SsaFunctionBuilder::new(2).build_with(|f| {
//!     let (a, b) = (f.arg(0), f.arg(1));
//!     f.block(0, |blk| {
//!         let sum = blk.add(a, b);
//!         blk.ret_val(sum);
//!     });
//! });
//!
//! let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
//! let stats = GlobalCodeMotion::new().run(&mut ssa, &dominators, &loops)?;
//! assert_eq!(stats.moved, 0);
//! # Ok::<(), gcmotion::Error>(())
//! ```

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all gcmotion operations
pub use crate::Error;

/// The result type used throughout gcmotion
pub use crate::Result;

// ================================================================================================
// SSA Representation
// ================================================================================================

pub use crate::analysis::{
    verify_dominance, ConstValue, PhiNode, SsaBlock, SsaCfg, SsaFunction, SsaFunctionBuilder,
    SsaInstruction, SsaOp, SsaVarId,
};

// ================================================================================================
// Analyses
// ================================================================================================

pub use crate::analysis::{LoopAnalyzer, LoopForest, LoopInfo, SsaLoopAnalysis};
pub use crate::utils::graph::{
    algorithms::{compute_dominators, compute_dominators_rooted, DominatorTree},
    NodeId,
};

// ================================================================================================
// Code Motion
// ================================================================================================

pub use crate::compiler::{
    passes::gcm::{MotionKind, PinReason, Relocation},
    CompilerContext, EventKind, EventLog, GcmConfig, GcmStats, GlobalCodeMotion,
    GlobalCodeMotionPass, SsaPass,
};
