//! Transformation infrastructure over SSA form.
//!
//! - [`crate::analysis`] - SSA representation, CFG view, loop detection
//! - [`compiler`](self) - passes and the state they share
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CompilerContext          Shared state for one compilation   │
//! │    └─ EventLog            Lock-free change and diagnostic log │
//! │                                                              │
//! │  SsaPass trait            Interface for all passes           │
//! │    ├─ should_run()        Per-function gate                  │
//! │    ├─ run_on_function()   Per-function transformation        │
//! │    ├─ initialize()        One-time setup                     │
//! │    └─ finalize()          Cleanup                            │
//! │                                                              │
//! │  Passes                                                      │
//! │    └─ GlobalCodeMotionPass  hoisting and sinking             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod context;
mod events;
mod pass;
pub mod passes;

pub use context::CompilerContext;
pub use events::{DerivedStats, Event, EventBuilder, EventKind, EventLog};
pub use pass::SsaPass;
pub use passes::{GcmConfig, GcmStats, GlobalCodeMotion, GlobalCodeMotionPass};
