// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # gcmotion
//!
//! [![Crates.io](https://img.shields.io/crates/v/gcmotion.svg)](https://crates.io/crates/gcmotion)
//! [![Documentation](https://docs.rs/gcmotion/badge.svg)](https://docs.rs/gcmotion)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/gcmotion/blob/main/LICENSE-APACHE)
//!
//! Global Code Motion over SSA form. Every movable operation of a function
//! is rescheduled to the block where it executes least often while still
//! dominating all of its uses: loop-invariant computations leave loops,
//! everything else sinks towards its consumers.
//!
//! ## Features
//!
//! - **SSA representation** - Blocks of phis and decomposed operations, with a
//!   closure-based builder and a dominance verifier
//! - **Dominator trees** - Lengauer-Tarjan with depth and nearest common
//!   dominator queries
//! - **Loop forest** - Natural loop detection with nesting, preheaders and exits
//! - **Code motion** - Click-style early/late scheduling with loop-depth
//!   aware placement
//! - **Change tracking** - A lock-free event log recording every relocation
//!
//! ## Quick Start
//!
//! ```rust
//! use gcmotion::prelude::*;
//!
//! // B0 -> B1 (header) <-> B2 (body), B1 -> B3
//! let mut ssa = SsaFunctionBuilder::new(2).build_with(|f| {
//!     let (a, b) = (f.arg(0), f.arg(1));
//!     let i = f.var();
//!     let next = f.var();
//!     f.block(0, |blk| blk.jump(1));
//!     f.block(1, |blk| {
//!         blk.phi_into(i, &[(0, a), (2, next)]);
//!         let cond = blk.clt(i, b);
//!         blk.branch(cond, 2, 3);
//!     });
//!     f.block(2, |blk| {
//!         let invariant = blk.mul(a, b);
//!         blk.op(SsaOp::Add { dest: next, left: i, right: invariant });
//!         blk.jump(1);
//!     });
//!     f.block(3, |blk| blk.ret_val(i));
//! });
//!
//! let (dominators, loops) = LoopAnalyzer::new(&ssa).analyze_all();
//! let stats = GlobalCodeMotion::new().run(&mut ssa, &dominators, &loops)?;
//!
//! assert_eq!(stats.hoisted, 1);
//! assert!(verify_dominance(&ssa, &dominators).is_ok());
//! # Ok::<(), gcmotion::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`utils::graph`] - Graph traits, node ids and dominator computation
//! - [`analysis`] - SSA form, its CFG view and loop detection
//! - [`compiler`] - The pass interface, the event log and the code motion pass
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with [`Error`] describing
//! what went wrong: malformed input (a value defined twice), a dominator
//! tree that does not belong to the function, or a dominance violation
//! found by [`analysis::verify_dominance`].

#[macro_use]
pub(crate) mod error;

/// Shared utilities: graph traits and algorithms.
pub mod utils;

/// Convenient re-exports of the most commonly used types.
pub mod prelude;

pub mod analysis;
pub mod compiler;

/// `gcmotion` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `gcmotion` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
