//! SSA transformation passes.
//!
//! - [`gcm`] - Global Code Motion: hoists loop-invariant computations and
//!   sinks the rest towards their uses

pub mod gcm;

pub use gcm::{GcmConfig, GcmStats, GlobalCodeMotion, GlobalCodeMotionPass};
