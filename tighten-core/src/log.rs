// tighten-core/src/log.rs
// ============================================================================
// Module: Execution log (C1)
// Description: Append-only, timestamped, metadata-tagged record of pipeline
// steps.
// ============================================================================

//! ## Overview
//! The log builder is the single mutable collaborator threaded through the
//! orchestrator's stages (`spec.md` §3 "Ownership", §9 "Ownership of the
//! execution log"). It is passed by exclusive reference and never aliased;
//! a snapshot is built at each log-flush boundary. Metadata values may be
//! explicitly absent (`null`) rather than omitted, matching `spec.md` §4.1.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::clock::Clock;

/// A metadata value attached to a log entry. `Null` is distinct from the key
/// being absent entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Explicit absence of a value.
    Null,
    /// A string value.
    Text(String),
    /// A signed integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
}

/// A single execution log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// UTC timestamp from the injected clock.
    #[serde(rename = "timestampUtc")]
    pub timestamp_utc: String,
    /// Canonical step identifier (e.g. `model.ingested`, `pipeline.completed`).
    pub step: String,
    /// Human-readable message.
    pub message: String,
    /// Namespaced metadata (`counts.*`, `flags.*`, `paths.*`, `timestamps.*`).
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

/// An immutable snapshot of the execution log, produced by [`ExecutionLog::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLogSnapshot {
    /// Entries in append order.
    pub entries: Vec<LogEntry>,
}

impl ExecutionLogSnapshot {
    /// Returns the steps in order, for assertions against canonical step
    /// sequences (`spec.md` §8, scenario S1).
    #[must_use]
    pub fn steps(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.step.as_str()).collect()
    }
}

/// The mutable execution log builder. One instance is threaded through a
/// single pipeline run; it is never shared across runs.
#[derive(Debug)]
pub struct ExecutionLog<'clock> {
    clock: &'clock dyn Clock,
    entries: Vec<LogEntry>,
}

impl<'clock> ExecutionLog<'clock> {
    /// Creates an empty log driven by the given clock.
    #[must_use]
    pub fn new(clock: &'clock dyn Clock) -> Self {
        Self { clock, entries: Vec::new() }
    }

    /// Appends a step with no metadata.
    pub fn record(&mut self, step: impl Into<String>, message: impl Into<String>) {
        self.record_with_metadata(step, message, BTreeMap::new());
    }

    /// Appends a step with metadata.
    pub fn record_with_metadata(
        &mut self,
        step: impl Into<String>,
        message: impl Into<String>,
        metadata: BTreeMap<String, MetadataValue>,
    ) {
        self.entries.push(LogEntry {
            timestamp_utc: self.clock.now_utc_rfc3339(),
            step: step.into(),
            message: message.into(),
            metadata,
        });
    }

    /// Produces an immutable snapshot of every entry recorded so far.
    #[must_use]
    pub fn build(&self) -> ExecutionLogSnapshot {
        ExecutionLogSnapshot { entries: self.entries.clone() }
    }
}

/// Convenience builder for a single entry's metadata map.
#[derive(Debug, Default)]
pub struct MetadataBuilder {
    map: BTreeMap<String, MetadataValue>,
}

impl MetadataBuilder {
    /// Starts an empty metadata map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a text value under a namespaced key.
    #[must_use]
    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.map.insert(key.into(), MetadataValue::Text(value.into()));
        self
    }

    /// Sets a count value under a namespaced key.
    #[must_use]
    pub fn count(mut self, key: impl Into<String>, value: i64) -> Self {
        self.map.insert(key.into(), MetadataValue::Integer(value));
        self
    }

    /// Sets a flag value under a namespaced key.
    #[must_use]
    pub fn flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.map.insert(key.into(), MetadataValue::Boolean(value));
        self
    }

    /// Sets an explicit null under a namespaced key.
    #[must_use]
    pub fn null(mut self, key: impl Into<String>) -> Self {
        self.map.insert(key.into(), MetadataValue::Null);
        self
    }

    /// Finishes the map.
    #[must_use]
    pub fn build(self) -> BTreeMap<String, MetadataValue> {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    #[test]
    fn records_append_in_order() {
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);
        log.record("request.received", "received");
        log.record("pipeline.completed", "done");
        let snapshot = log.build();
        assert_eq!(snapshot.steps(), vec!["request.received", "pipeline.completed"]);
    }

    #[test]
    fn metadata_supports_explicit_null() {
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);
        let metadata = MetadataBuilder::new().null("paths.seedOutput").build();
        log.record_with_metadata("staticData.seed.generated", "no seeds", metadata);
        let snapshot = log.build();
        assert_eq!(snapshot.entries[0].metadata.get("paths.seedOutput"), Some(&MetadataValue::Null));
    }

    #[test]
    fn snapshot_is_independent_of_further_mutation() {
        let clock = FixedClock::new("2026-01-01T00:00:00Z");
        let mut log = ExecutionLog::new(&clock);
        log.record("a", "a");
        let snapshot = log.build();
        log.record("b", "b");
        assert_eq!(snapshot.steps(), vec!["a"]);
    }
}
