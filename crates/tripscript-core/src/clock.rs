//! Clock abstraction supplying the logical apply timestamp.
//!
//! The engine itself never reads the wall clock; callers obtain a timestamp
//! from a `Clock` at the boundary and pass it into evaluation.

use chrono::{DateTime, Utc};

use crate::error::EngineError;

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an operator-supplied instant, used to replay
/// evaluations at a chosen point in time.
#[derive(Debug, Clone, Copy)]
pub struct PinnedClock(DateTime<Utc>);

impl PinnedClock {
    /// Parses an RFC 3339 timestamp into a pinned clock.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::MalformedDocument` if the timestamp does not parse.
    pub fn from_rfc3339(raw: &str) -> Result<Self, EngineError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|at| Self(at.with_timezone(&Utc)))
            .map_err(|e| EngineError::MalformedDocument(format!("invalid timestamp \"{raw}\": {e}")))
    }
}

impl Clock for PinnedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pinned_clock_returns_parsed_instant_in_utc() {
        let clock = PinnedClock::from_rfc3339("2026-01-15T12:00:00+02:00").unwrap();

        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_pinned_clock_rejects_garbage() {
        match PinnedClock::from_rfc3339("noon-ish") {
            Err(EngineError::MalformedDocument(msg)) => assert!(msg.contains("noon-ish")),
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }
}
