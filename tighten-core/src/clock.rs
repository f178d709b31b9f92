// tighten-core/src/clock.rs
// ============================================================================
// Module: Clock facade
// Description: Injectable time source so persisted timestamps and tests can
// pin time deterministically.
// ============================================================================

//! ## Overview
//! `spec.md` §9 requires a clock capability with a default system-UTC
//! implementation; every persisted timestamp goes through it. Tests use
//! [`FixedClock`] (pinned) or [`SteppedClock`] (advances on demand, used for
//! TTL-expiry scenario S4).

use std::cell::Cell;
use std::time::SystemTime;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A source of UTC time.
pub trait Clock {
    /// Returns the current UTC time as an RFC 3339 string.
    fn now_utc_rfc3339(&self) -> String;

    /// Returns the current UTC time as seconds since the Unix epoch, used
    /// for TTL comparisons.
    fn now_unix_seconds(&self) -> i64;
}

/// The default clock: reads the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc_rfc3339(&self) -> String {
        OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    }

    fn now_unix_seconds(&self) -> i64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|duration| i64::try_from(duration.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// A clock pinned to a single instant, for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    rfc3339: String,
    unix_seconds: i64,
}

impl FixedClock {
    /// Pins the clock to the given RFC 3339 instant.
    ///
    /// # Panics
    ///
    /// Panics if `rfc3339` cannot be parsed — this is test-only
    /// construction, not a runtime path, so a malformed literal is a
    /// programmer error.
    #[must_use]
    pub fn new(rfc3339: &str) -> Self {
        let parsed = OffsetDateTime::parse(rfc3339, &Rfc3339)
            .unwrap_or_else(|_| panic!("invalid RFC 3339 literal: {rfc3339}"));
        Self { rfc3339: rfc3339.to_string(), unix_seconds: parsed.unix_timestamp() }
    }
}

impl Clock for FixedClock {
    fn now_utc_rfc3339(&self) -> String {
        self.rfc3339.clone()
    }

    fn now_unix_seconds(&self) -> i64 {
        self.unix_seconds
    }
}

/// A clock that can be advanced explicitly, for TTL-expiry scenarios
/// (`spec.md` §8, scenario S4).
#[derive(Debug)]
pub struct SteppedClock {
    unix_seconds: Cell<i64>,
}

impl SteppedClock {
    /// Starts the clock at the given RFC 3339 instant.
    ///
    /// # Panics
    ///
    /// Panics if `rfc3339` cannot be parsed.
    #[must_use]
    pub fn new(rfc3339: &str) -> Self {
        let parsed = OffsetDateTime::parse(rfc3339, &Rfc3339)
            .unwrap_or_else(|_| panic!("invalid RFC 3339 literal: {rfc3339}"));
        Self { unix_seconds: Cell::new(parsed.unix_timestamp()) }
    }

    /// Advances the clock by the given number of seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        self.unix_seconds.set(self.unix_seconds.get() + seconds);
    }
}

impl Clock for SteppedClock {
    fn now_utc_rfc3339(&self) -> String {
        OffsetDateTime::from_unix_timestamp(self.unix_seconds.get())
            .ok()
            .and_then(|instant| instant.format(&Rfc3339).ok())
            .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
    }

    fn now_unix_seconds(&self) -> i64 {
        self.unix_seconds.get()
    }
}
