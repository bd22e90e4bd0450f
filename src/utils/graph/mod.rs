//! Control-flow graph infrastructure.
//!
//! - [`NodeId`] - Strongly-typed block identifier
//! - [`GraphBase`], [`Successors`], [`Predecessors`], [`RootedGraph`] -
//!   abstraction traits the algorithms are written against
//! - [`algorithms`] - Dominator tree computation and queries
//!
//! The concrete graph used by the passes is
//! [`SsaCfg`](crate::analysis::SsaCfg), a borrowed view over an
//! [`SsaFunction`](crate::analysis::SsaFunction) whose edges are read from
//! block terminators.

mod node;
pub(crate) mod traits;

pub mod algorithms;

pub use node::NodeId;
pub use traits::{GraphBase, Predecessors, RootedGraph, Successors};
