//! Shared utilities used by the analyses and passes.

pub mod graph;
