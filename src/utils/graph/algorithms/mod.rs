//! Graph algorithms for control-flow analysis.
//!
//! ## Dominator Analysis
//!
//! - [`compute_dominators`] - Compute the dominator tree using Lengauer-Tarjan
//! - [`compute_dominators_rooted`] - Same, starting from the graph's entry
//! - [`DominatorTree`] - Result of dominator computation, with ancestry,
//!   depth and nearest-common-dominator queries
//!
//! | Algorithm | Time Complexity | Use Case |
//! |-----------|-----------------|----------|
//! | Dominators | O(E log V) | Loop analysis, code motion legality |
//! | Nearest common dominator | O(tree height) | Late scheduling bounds |

mod dominators;

pub use dominators::{
    compute_dominators, compute_dominators_rooted, DominatorIterator, DominatorTree,
};
