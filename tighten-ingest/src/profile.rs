// tighten-ingest/src/profile.rs
// ============================================================================
// Module: Profile provider (C6)
// ============================================================================

//! ## Overview
//! Two capability variants behind [`ProfileProvider`] (`spec.md` §4.6):
//! [`FixtureProfileProvider`] reads a JSON snapshot through the file-system
//! facade; [`LiveProfileProvider`] runs per-table probes against an injected
//! [`ConnectionFactory`] on a bounded worker pool, downgrading a timed-out
//! probe to `Unknown` plus a [`CoverageAnomaly`] rather than failing the run
//! (`spec.md` §5: "all cross-task communication is through message passing
//! to a single collector").

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::Duration;

use tighten_core::filesystem::FileSystem;
use tighten_core::identifiers::Coordinate;
use tighten_core::profile::ColumnProfile;
use tighten_core::profile::CoverageAnomaly;
use tighten_core::profile::Probe;
use tighten_core::profile::ProbeStatus;
use tighten_core::profile::ProfileSnapshot;
use tighten_core::profile::Severity;

use crate::error::IngestError;

/// A capability that produces a profile snapshot and any non-fatal
/// warnings (`spec.md` §4.6: "both variants return `(snapshot, warnings)`").
pub trait ProfileProvider {
    /// Captures a profile snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] only for conditions the provider cannot
    /// downgrade to a coverage anomaly (e.g. the fixture file is absent).
    fn capture(&self) -> Result<(ProfileSnapshot, Vec<String>), IngestError>;
}

/// Reads a profile snapshot verbatim from a JSON fixture file.
pub struct FixtureProfileProvider<'a> {
    filesystem: &'a dyn FileSystem,
    path: PathBuf,
}

impl<'a> FixtureProfileProvider<'a> {
    /// Builds a fixture provider reading from `path` through `filesystem`.
    #[must_use]
    pub fn new(filesystem: &'a dyn FileSystem, path: impl Into<PathBuf>) -> Self {
        Self { filesystem, path: path.into() }
    }
}

impl ProfileProvider for FixtureProfileProvider<'_> {
    fn capture(&self) -> Result<(ProfileSnapshot, Vec<String>), IngestError> {
        let bytes = self.filesystem.read(&self.path).map_err(|err| IngestError::ProfileFixtureUnreadable {
            path: self.path.display().to_string(),
            message: err.to_string(),
        })?;
        let snapshot: ProfileSnapshot = serde_json::from_slice(&bytes).map_err(|err| {
            IngestError::ProfileFixtureUnreadable { path: self.path.display().to_string(), message: err.to_string() }
        })?;
        Ok((snapshot, Vec::new()))
    }
}

/// A single table's worth of live probing: a connection to run scan queries
/// against, scoped to one worker and disposed on scope exit.
pub trait TableConnection: Send {
    /// Runs the null-count/row-count probe for `coordinate`.
    ///
    /// # Errors
    ///
    /// Returns an error message when the probe query itself fails (not on
    /// timeout — timeouts are detected by the caller's `recv_timeout`).
    fn probe_column(&self, coordinate: &Coordinate) -> Result<ColumnProfile, String>;
}

/// Opens one [`TableConnection`] per worker (`spec.md` §5: "database
/// connections are one-per-worker and disposed on scope exit").
pub trait ConnectionFactory: Send + Sync {
    /// Opens a new connection.
    ///
    /// # Errors
    ///
    /// Returns an error description when the connection cannot be opened.
    fn open(&self) -> Result<Box<dyn TableConnection>, String>;
}

/// Tuning knobs for the live profile provider (`spec.md` §4.6, §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveProfileOptions {
    /// Degree of worker-pool parallelism (`spec.md` §5 default: 4).
    pub parallelism: usize,
    /// Maximum rows sampled per table.
    pub row_cap: u64,
    /// Per-table probe timeout.
    pub per_table_timeout: Duration,
}

impl Default for LiveProfileOptions {
    fn default() -> Self {
        Self { parallelism: 4, row_cap: 0, per_table_timeout: Duration::from_secs(30) }
    }
}

/// Captures a profile snapshot by running per-table probes against a live
/// connection factory on a bounded worker pool.
pub struct LiveProfileProvider {
    factory: Arc<dyn ConnectionFactory>,
    targets: Vec<Coordinate>,
    options: LiveProfileOptions,
}

impl LiveProfileProvider {
    /// Builds a live provider probing `targets` through `factory`.
    #[must_use]
    pub fn new(factory: Arc<dyn ConnectionFactory>, targets: Vec<Coordinate>, options: LiveProfileOptions) -> Self {
        Self { factory, targets, options }
    }
}

enum WorkerOutcome {
    Profiled(ColumnProfile),
    Failed(Coordinate, String),
}

impl ProfileProvider for LiveProfileProvider {
    fn capture(&self) -> Result<(ProfileSnapshot, Vec<String>), IngestError> {
        let queue = Arc::new(Mutex::new(self.targets.clone()));
        let (sender, receiver) = mpsc::channel::<WorkerOutcome>();
        let worker_count = self.options.parallelism.max(1).min(self.targets.len().max(1));

        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let queue = Arc::clone(&queue);
            let sender = sender.clone();
            let factory = Arc::clone(&self.factory);
            handles.push(std::thread::spawn(move || {
                let connection = match factory.open() {
                    Ok(connection) => connection,
                    Err(message) => {
                        if let Some(first) = queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pop() {
                            let _ = sender.send(WorkerOutcome::Failed(first, message));
                        }
                        return;
                    }
                };
                loop {
                    let next = queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner).pop();
                    let Some(coordinate) = next else {
                        break;
                    };
                    let outcome = match connection.probe_column(&coordinate) {
                        Ok(profile) => WorkerOutcome::Profiled(profile),
                        Err(message) => WorkerOutcome::Failed(coordinate, message),
                    };
                    if sender.send(outcome).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(sender);

        let mut columns = Vec::new();
        let mut anomalies = Vec::new();
        let mut received = 0usize;
        while received < self.targets.len() {
            match receiver.recv_timeout(self.options.per_table_timeout) {
                Ok(WorkerOutcome::Profiled(profile)) => {
                    columns.push(profile);
                    received += 1;
                }
                Ok(WorkerOutcome::Failed(coordinate, message)) => {
                    anomalies.push(CoverageAnomaly {
                        coordinate: coordinate.clone(),
                        severity: Severity::Warning,
                        message: format!("Coverage anomaly: probe for {coordinate} failed: {message}"),
                    });
                    received += 1;
                }
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        for handle in handles {
            let _ = handle.join();
        }

        for remaining in queue.lock().unwrap_or_else(std::sync::PoisonError::into_inner).drain(..) {
            anomalies.push(CoverageAnomaly {
                coordinate: remaining.clone(),
                severity: Severity::Warning,
                message: format!("Coverage anomaly: probe for {remaining} timed out"),
            });
        }

        for anomaly in &anomalies {
            columns.push(ColumnProfile {
                coordinate: anomaly.coordinate.clone(),
                row_count: 0,
                null_count: 0,
                probe: Probe { status: ProbeStatus::Unknown, sampling_size: None, captured_at: String::new() },
            });
        }

        let warnings = anomalies.iter().map(|anomaly| anomaly.message.clone()).collect();
        let snapshot = ProfileSnapshot { columns, coverage_anomalies: anomalies, ..ProfileSnapshot::default() };
        Ok((snapshot, warnings))
    }
}

/// Resolves a fixture path against a base directory, used by callers wiring
/// `FixtureProfileProvider` from configuration.
#[must_use]
pub fn resolve_fixture_path(base_dir: &Path, relative: &str) -> PathBuf {
    base_dir.join(relative)
}

#[cfg(test)]
mod tests {
    use tighten_core::filesystem::InMemoryFileSystem;

    use super::*;

    #[test]
    fn fixture_provider_reads_snapshot_from_facade() {
        let fs = InMemoryFileSystem::new();
        let path = PathBuf::from("/profiles/edge-case.json");
        fs.write_atomic(&path, br#"{"columns":[],"uniqueCandidates":[],"compositeUniqueCandidates":[],"foreignKeys":[],"coverageAnomalies":[]}"#).unwrap_or_default();
        let provider = FixtureProfileProvider::new(&fs, path);
        let (snapshot, warnings) = provider.capture().unwrap();
        assert!(snapshot.columns.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn fixture_provider_surfaces_missing_file() {
        let fs = InMemoryFileSystem::new();
        let provider = FixtureProfileProvider::new(&fs, PathBuf::from("/missing.json"));
        assert!(provider.capture().is_err());
    }

    struct FlakyConnection;
    impl TableConnection for FlakyConnection {
        fn probe_column(&self, coordinate: &Coordinate) -> Result<ColumnProfile, String> {
            if coordinate.table == "Slow" {
                std::thread::sleep(Duration::from_millis(50));
                Ok(ColumnProfile {
                    coordinate: coordinate.clone(),
                    row_count: 1,
                    null_count: 0,
                    probe: Probe {
                        status: ProbeStatus::Succeeded,
                        sampling_size: None,
                        captured_at: "2026-01-01T00:00:00Z".to_string(),
                    },
                })
            } else {
                Ok(ColumnProfile {
                    coordinate: coordinate.clone(),
                    row_count: 10,
                    null_count: 0,
                    probe: Probe {
                        status: ProbeStatus::Succeeded,
                        sampling_size: None,
                        captured_at: "2026-01-01T00:00:00Z".to_string(),
                    },
                })
            }
        }
    }

    struct FlakyFactory;
    impl ConnectionFactory for FlakyFactory {
        fn open(&self) -> Result<Box<dyn TableConnection>, String> {
            Ok(Box::new(FlakyConnection))
        }
    }

    #[test]
    fn live_provider_downgrades_timeout_to_coverage_anomaly() {
        let options =
            LiveProfileOptions { parallelism: 1, row_cap: 0, per_table_timeout: Duration::from_millis(5) };
        let provider = LiveProfileProvider::new(
            Arc::new(FlakyFactory),
            vec![Coordinate::member("dbo", "Slow", "Name")],
            options,
        );
        let (snapshot, warnings) = provider.capture().unwrap();
        assert_eq!(snapshot.coverage_anomalies.len(), 1);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn live_provider_captures_fast_probes_successfully() {
        let options =
            LiveProfileOptions { parallelism: 2, row_cap: 0, per_table_timeout: Duration::from_secs(5) };
        let provider = LiveProfileProvider::new(
            Arc::new(FlakyFactory),
            vec![Coordinate::member("dbo", "Customer", "Name"), Coordinate::member("dbo", "City", "Name")],
            options,
        );
        let (snapshot, warnings) = provider.capture().unwrap();
        assert_eq!(snapshot.columns.len(), 2);
        assert!(warnings.is_empty());
    }
}
