//! Shared state handed to every pass.

use std::time::{Duration, Instant};

use crate::compiler::events::{DerivedStats, EventLog};

/// State shared by the passes of one compilation.
///
/// Only holds shared references internally, so one context can be used
/// from several threads while passes run on different functions.
pub struct CompilerContext {
    /// Events recorded by all passes.
    pub events: EventLog,

    start_time: Instant,
}

impl Default for CompilerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerContext {
    /// Creates a context with an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: EventLog::new(),
            start_time: Instant::now(),
        }
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Statistics over everything recorded so far, with the elapsed time.
    #[must_use]
    pub fn stats(&self) -> DerivedStats {
        DerivedStats::from_log(&self.events).with_time(self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::EventKind;

    #[test]
    fn test_stats_reflect_events() {
        let ctx = CompilerContext::new();
        ctx.events.record(EventKind::InstructionSunk).at("f", 2);
        ctx.events.record(EventKind::PassCompleted).function("f");

        let stats = ctx.stats();
        assert_eq!(stats.instructions_sunk, 1);
        assert_eq!(stats.passes_run, 1);
    }
}
