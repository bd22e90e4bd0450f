//! Static Single Assignment (SSA) form for function bodies.
//!
//! Every value is assigned exactly once, and every use names its defining
//! value directly. Control-flow merges are expressed with phi nodes.
//!
//! # Architecture
//!
//! - `variable` - SSA value identifiers and definition sites
//! - `value` - Constant values
//! - `ops` - Decomposed SSA operations and their scheduling traits
//! - `phi` - Phi node representation for control flow merges
//! - `instruction` - SSA instructions
//! - `block` - SSA basic blocks containing phi nodes and instructions
//! - `function` - A complete function body
//! - `builder` - Closure-based construction API
//! - `cfg` - Control-flow graph view over a function
//! - `verify` - Dominance verification
//!
//! # Usage
//!
//! ```rust
//! use gcmotion::analysis::{verify_dominance, SsaCfg, SsaFunctionBuilder};
//! use gcmotion::utils::graph::algorithms::compute_dominators_rooted;
//!
//! let ssa = SsaFunctionBuilder::new(2).build_with(|f| {
//!     let (a, b) = (f.arg(0), f.arg(1));
//!     f.block(0, |blk| {
//!         let sum = blk.add(a, b);
//!         blk.ret_val(sum);
//!     });
//! });
//!
//! let cfg = SsaCfg::from_ssa(&ssa);
//! let dominators = compute_dominators_rooted(&cfg);
//! assert!(verify_dominance(&ssa, &dominators).is_ok());
//! ```

mod block;
mod builder;
mod cfg;
mod function;
mod instruction;
mod ops;
mod phi;
mod value;
mod variable;
mod verify;

pub use block::SsaBlock;
pub use builder::{SsaBlockBuilder, SsaFunctionBuilder, SsaFunctionContext};
pub use cfg::SsaCfg;
pub use function::SsaFunction;
pub use instruction::SsaInstruction;
pub use ops::{OpTraits, SsaOp};
pub use phi::{PhiNode, PhiOperand};
pub use value::ConstValue;
pub use variable::{DefSite, SsaVarId};
pub use verify::verify_dominance;
