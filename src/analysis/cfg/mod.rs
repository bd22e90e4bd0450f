//! Control flow structure derived from an SSA function.
//!
//! # Key Components
//!
//! - [`LoopInfo`] - A natural loop: header, body, latches, preheader, exits
//! - [`LoopForest`] - All loops of a function with per-block nesting queries
//! - [`detect_loops`] - Loop detection over any graph with a dominator tree
//! - [`LoopAnalyzer`] - Dominators and loops for an [`SsaFunction`](crate::analysis::SsaFunction)
//!
//! ```rust,ignore
//! use gcmotion::analysis::LoopAnalyzer;
//!
//! let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
//! for loop_info in loops.iter() {
//!     println!("loop at {} (depth {})", loop_info.header, loop_info.depth);
//! }
//! ```

mod analyzer;
mod loops;

pub use analyzer::{LoopAnalyzer, SsaLoopAnalysis};
pub use loops::{detect_loops, has_back_edges, LoopExit, LoopForest, LoopInfo, LoopType};
