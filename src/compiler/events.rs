//! Event logging for SSA passes.
//!
//! Passes record what they changed and why into an [`EventLog`] shared
//! through the [`CompilerContext`](crate::compiler::CompilerContext). Events
//! can be inspected for debugging or summarized with [`DerivedStats`].
//!
//! # Architecture
//!
//! - [`Event`] - A single recorded event
//! - [`EventLog`] - Append-only collection of events with query helpers
//! - [`EventBuilder`] - Fluent API for creating events, pushed into the log on drop
//!
//! Recording only needs `&self`: the log is backed by a `boxcar::Vec`, so
//! passes holding a shared context can log without locking.
//!
//! # Example
//!
//! ```rust,ignore
//! use gcmotion::compiler::{EventKind, EventLog};
//!
//! let log = EventLog::new();
//!
//! log.record(EventKind::InstructionHoisted)
//!     .at("sum", 1)
//!     .message("v7 = mul v0, v1: B3 -> B1");
//!
//! log.info("Starting pass: gcm");
//! println!("{}", log.summary());
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    time::Duration,
};

use strum::{EnumCount, EnumIter};

/// Categories of events that can be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumCount)]
pub enum EventKind {
    /// An operation moved to a block with smaller loop depth.
    InstructionHoisted,
    /// An operation moved down into a block dominated by its old block.
    InstructionSunk,
    /// An operation moved to another block without changing loop depth
    /// or dominance relation to its old block.
    InstructionMoved,

    /// An SSA pass started on a function.
    PassStarted,
    /// An SSA pass finished on a function.
    PassCompleted,

    /// Informational message.
    Info,
    /// Something unexpected that did not stop the pass.
    Warning,
    /// A pass failed.
    Error,
}

impl EventKind {
    /// Returns a short human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::InstructionHoisted => "instruction hoisted",
            Self::InstructionSunk => "instruction sunk",
            Self::InstructionMoved => "instruction moved",
            Self::PassStarted => "pass started",
            Self::PassCompleted => "pass completed",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns true if this event records a change to the code.
    #[must_use]
    pub fn is_transformation(&self) -> bool {
        matches!(
            self,
            Self::InstructionHoisted | Self::InstructionSunk | Self::InstructionMoved
        )
    }

    /// Returns true for info, warning and error messages.
    #[must_use]
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Info | Self::Warning | Self::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A single recorded event.
#[derive(Debug, Clone)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Name of the function the event belongs to.
    pub function: Option<String>,
    /// Block index within the function.
    pub location: Option<usize>,
    /// Free-form description.
    pub message: String,
    /// Name of the pass that recorded the event.
    pub pass: Option<String>,
}

impl Event {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            function: None,
            location: None,
            message: message.into(),
            pass: None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        match (&self.function, self.location) {
            (Some(function), Some(block)) => write!(f, " {function}@B{block}")?,
            (Some(function), None) => write!(f, " {function}")?,
            (None, Some(block)) => write!(f, " B{block}")?,
            (None, None) => {}
        }
        write!(f, " {}", self.message)
    }
}

/// Fluent builder for an [`Event`].
///
/// The event is pushed into the log when the builder is dropped, so a
/// statement like `log.record(kind).at(name, 3);` records it.
pub struct EventBuilder<'a> {
    log: &'a EventLog,
    kind: EventKind,
    function: Option<String>,
    location: Option<usize>,
    message: Option<String>,
    pass: Option<String>,
}

impl<'a> EventBuilder<'a> {
    fn new(log: &'a EventLog, kind: EventKind) -> Self {
        Self {
            log,
            kind,
            function: None,
            location: None,
            message: None,
            pass: None,
        }
    }

    /// Sets function and block.
    pub fn at(mut self, function: impl Into<String>, block: usize) -> Self {
        self.function = Some(function.into());
        self.location = Some(block);
        self
    }

    /// Sets the function.
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Sets the block.
    pub fn location(mut self, block: usize) -> Self {
        self.location = Some(block);
        self
    }

    /// Sets the message. Defaults to the kind's description.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Sets the recording pass.
    pub fn pass(mut self, pass_name: impl Into<String>) -> Self {
        self.pass = Some(pass_name.into());
        self
    }
}

impl Drop for EventBuilder<'_> {
    fn drop(&mut self) {
        let message = self
            .message
            .take()
            .unwrap_or_else(|| self.kind.description().to_string());

        self.log.events.push(Event {
            kind: self.kind,
            function: self.function.take(),
            location: self.location.take(),
            message,
            pass: self.pass.take(),
        });
    }
}

/// Append-only collection of events.
#[derive(Debug)]
pub struct EventLog {
    events: boxcar::Vec<Event>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventLog {
    fn clone(&self) -> Self {
        let new_log = Self::new();
        new_log.merge(self);
        new_log
    }
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: boxcar::Vec::new(),
        }
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.count() == 0
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.count()
    }

    /// Starts recording an event of the given kind.
    pub fn record(&self, kind: EventKind) -> EventBuilder<'_> {
        EventBuilder::new(self, kind)
    }

    /// Records an informational message.
    pub fn info(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Info, message));
    }

    /// Records a warning.
    pub fn warn(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Warning, message));
    }

    /// Records an error.
    pub fn error(&self, message: impl Into<String>) {
        self.events.push(Event::new(EventKind::Error, message));
    }

    /// Appends copies of all events of `other`.
    pub fn merge(&self, other: &EventLog) {
        for (_, event) in &other.events {
            self.events.push(event.clone());
        }
    }

    /// Returns true if an event of `kind` was recorded.
    #[must_use]
    pub fn has(&self, kind: EventKind) -> bool {
        self.events.iter().any(|(_, e)| e.kind == kind)
    }

    /// Returns true if an event of any of `kinds` was recorded.
    #[must_use]
    pub fn has_any(&self, kinds: &[EventKind]) -> bool {
        self.events.iter().any(|(_, e)| kinds.contains(&e.kind))
    }

    /// Counts events of `kind`.
    #[must_use]
    pub fn count_kind(&self, kind: EventKind) -> usize {
        self.filter_kind(kind).count()
    }

    /// Iterates over all events in recording order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|(_, e)| e)
    }

    /// Iterates over events of `kind`.
    pub fn filter_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(move |e| e.kind == kind)
    }

    /// Iterates over events recorded for `function`.
    pub fn filter_function<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.iter()
            .filter(move |e| e.function.as_deref() == Some(function))
    }

    /// Iterates over events that record a code change.
    pub fn transformations(&self) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(|e| e.kind.is_transformation())
    }

    /// Iterates over info, warning and error events.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Event> + '_ {
        self.iter().filter(|e| e.kind.is_diagnostic())
    }

    /// Iterates over warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &Event> + '_ {
        self.filter_kind(EventKind::Warning)
    }

    /// Iterates over errors.
    pub fn errors(&self) -> impl Iterator<Item = &Event> + '_ {
        self.filter_kind(EventKind::Error)
    }

    /// Counts events per kind.
    #[must_use]
    pub fn count_by_kind(&self) -> BTreeMap<EventKind, usize> {
        let mut counts = BTreeMap::new();
        for event in self.iter() {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Counts events that record a code change.
    #[must_use]
    pub fn transformation_count(&self) -> usize {
        self.transformations().count()
    }

    /// Counts distinct functions that received a transformation.
    #[must_use]
    pub fn functions_affected(&self) -> usize {
        self.transformations()
            .filter_map(|e| e.function.as_deref())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Short summary of the transformation counts.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no events".to_string();
        }

        let parts: Vec<String> = self
            .count_by_kind()
            .into_iter()
            .filter(|(kind, _)| kind.is_transformation())
            .map(|(kind, count)| format!("{count} {kind}"))
            .collect();

        if parts.is_empty() {
            return format!("{} events", self.len());
        }

        parts.join(", ")
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = EventLogIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        EventLogIter {
            inner: self.events.iter(),
        }
    }
}

/// Iterator over the events of an [`EventLog`].
pub struct EventLogIter<'a> {
    inner: boxcar::Iter<'a, Event>,
}

impl<'a> Iterator for EventLogIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, e)| e)
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<T: IntoIterator<Item = Event>>(iter: T) -> Self {
        let log = Self::new();
        for event in iter {
            log.events.push(event);
        }
        log
    }
}

/// Statistics derived from an [`EventLog`].
#[derive(Debug, Clone, Default)]
pub struct DerivedStats {
    /// Functions with at least one transformation.
    pub functions_transformed: usize,
    /// Operations hoisted to a shallower loop depth.
    pub instructions_hoisted: usize,
    /// Operations sunk into a dominated block.
    pub instructions_sunk: usize,
    /// Other relocations.
    pub instructions_moved: usize,
    /// Completed pass runs.
    pub passes_run: usize,
    /// Warnings recorded.
    pub warnings: usize,
    /// Errors recorded.
    pub errors: usize,
    /// Wall time, if the caller measured it.
    pub total_time: Duration,
}

impl DerivedStats {
    /// Computes the statistics of `log`.
    #[must_use]
    pub fn from_log(log: &EventLog) -> Self {
        let counts = log.count_by_kind();
        let get = |kind: EventKind| counts.get(&kind).copied().unwrap_or(0);

        Self {
            functions_transformed: log.functions_affected(),
            instructions_hoisted: get(EventKind::InstructionHoisted),
            instructions_sunk: get(EventKind::InstructionSunk),
            instructions_moved: get(EventKind::InstructionMoved),
            passes_run: get(EventKind::PassCompleted),
            warnings: get(EventKind::Warning),
            errors: get(EventKind::Error),
            total_time: Duration::ZERO,
        }
    }

    /// Attaches a measured wall time.
    #[must_use]
    pub fn with_time(mut self, time: Duration) -> Self {
        self.total_time = time;
        self
    }

    /// Total number of relocated operations.
    #[must_use]
    pub fn total_moved(&self) -> usize {
        self.instructions_hoisted + self.instructions_sunk + self.instructions_moved
    }

    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.functions_transformed > 0 {
            parts.push(format!("{} functions", self.functions_transformed));
        }
        if self.instructions_hoisted > 0 {
            parts.push(format!("{} hoisted", self.instructions_hoisted));
        }
        if self.instructions_sunk > 0 {
            parts.push(format!("{} sunk", self.instructions_sunk));
        }
        if self.instructions_moved > 0 {
            parts.push(format!("{} moved", self.instructions_moved));
        }
        if self.errors > 0 {
            parts.push(format!("{} errors", self.errors));
        }
        if self.warnings > 0 {
            parts.push(format!("{} warnings", self.warnings));
        }

        let stats = if parts.is_empty() {
            "no transformations".to_string()
        } else {
            parts.join(", ")
        };

        if self.total_time.as_millis() > 0 {
            format!("{stats} in {:?}", self.total_time)
        } else {
            stats
        }
    }
}

impl fmt::Display for DerivedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_empty_log() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(!log.has(EventKind::InstructionHoisted));
        assert_eq!(log.summary(), "no events");
    }

    #[test]
    fn test_record_event() {
        let log = EventLog::new();

        log.record(EventKind::InstructionHoisted)
            .at("sum", 1)
            .pass("gcm")
            .message("v7: B3 -> B1");

        assert_eq!(log.len(), 1);
        let event = log.iter().next().unwrap();
        assert_eq!(event.function.as_deref(), Some("sum"));
        assert_eq!(event.location, Some(1));
        assert_eq!(event.pass.as_deref(), Some("gcm"));
        assert_eq!(event.to_string(), "[instruction hoisted] sum@B1 v7: B3 -> B1");
    }

    #[test]
    fn test_default_message_is_description() {
        let log = EventLog::new();
        log.record(EventKind::PassStarted).location(0);
        assert_eq!(log.iter().next().unwrap().message, "pass started");
    }

    #[test]
    fn test_info_warn_error() {
        let log = EventLog::new();

        log.info("informational message");
        log.warn("warning message");
        log.error("error message");

        assert_eq!(log.count_kind(EventKind::Info), 1);
        assert_eq!(log.warnings().count(), 1);
        assert_eq!(log.errors().count(), 1);
        assert_eq!(log.diagnostics().count(), 3);
        assert_eq!(log.transformation_count(), 0);
        assert_eq!(log.summary(), "3 events");
    }

    #[test]
    fn test_merge_and_clone() {
        let log1 = EventLog::new();
        let log2 = EventLog::new();

        log1.record(EventKind::InstructionSunk).at("f", 2);
        log2.record(EventKind::InstructionMoved).at("g", 3);

        log1.merge(&log2);
        let copy = log1.clone();

        assert_eq!(copy.len(), 2);
        assert!(copy.has_any(&[EventKind::InstructionMoved]));
        assert_eq!(copy.filter_function("g").count(), 1);
    }

    #[test]
    fn test_summary_and_derived_stats() {
        let log = EventLog::new();

        log.record(EventKind::InstructionHoisted).at("f", 1);
        log.record(EventKind::InstructionHoisted).at("f", 1);
        log.record(EventKind::InstructionSunk).at("g", 4);
        log.record(EventKind::PassCompleted).function("f");
        log.warn("skipped");

        assert_eq!(log.summary(), "2 instruction hoisted, 1 instruction sunk");

        let stats = DerivedStats::from_log(&log);
        assert_eq!(stats.functions_transformed, 2);
        assert_eq!(stats.instructions_hoisted, 2);
        assert_eq!(stats.instructions_sunk, 1);
        assert_eq!(stats.total_moved(), 3);
        assert_eq!(stats.passes_run, 1);
        assert_eq!(stats.warnings, 1);
        assert_eq!(stats.to_string(), "2 functions, 2 hoisted, 1 sunk, 1 warnings");
    }

    #[test]
    fn test_kind_classification_is_exclusive() {
        assert_eq!(EventKind::iter().count(), EventKind::COUNT);
        for kind in EventKind::iter() {
            assert!(!(kind.is_transformation() && kind.is_diagnostic()), "{kind}");
        }
    }

    #[test]
    fn test_from_iterator() {
        let log: EventLog = (0..3)
            .map(|i| Event::new(EventKind::Info, format!("line {i}")))
            .collect();
        assert_eq!(log.len(), 3);
        assert_eq!((&log).into_iter().last().unwrap().message, "line 2");
    }
}
