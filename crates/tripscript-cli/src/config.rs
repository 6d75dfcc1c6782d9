//! Command configuration.
//!
//! Values arrive through clap, which reads the `TRIPSCRIPT_*` environment
//! variables when the matching flag is absent. This module turns the raw
//! strings into typed settings.

use chrono::FixedOffset;
use clap::ValueEnum;
use tripscript_core::clock::{Clock, PinnedClock, SystemClock};

use crate::error::AppError;

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub log_format: LogFormat,
    /// Display timezone for templated times.
    pub timezone: Option<FixedOffset>,
    /// Pinned evaluation time, RFC 3339.
    pub now: Option<String>,
}

impl Config {
    /// Validates raw settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the timezone or pinned time is unusable.
    pub fn resolve(log_format: LogFormat, timezone: Option<&str>, now: Option<&str>) -> Result<Self, AppError> {
        let config = Self {
            log_format,
            timezone: timezone.map(parse_timezone).transpose()?,
            now: now.map(str::trim).filter(|raw| !raw.is_empty()).map(str::to_owned),
        };
        // Fail before any command runs.
        config.clock()?;
        Ok(config)
    }

    /// The clock evaluation should read: pinned when `now` is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `now` is not RFC 3339.
    pub fn clock(&self) -> Result<Box<dyn Clock>, AppError> {
        match self.now.as_deref() {
            Some(raw) => PinnedClock::from_rfc3339(raw)
                .map(|clock| Box::new(clock) as Box<dyn Clock>)
                .map_err(|e| AppError::Config(format!("TRIPSCRIPT_NOW: {e}"))),
            None => Ok(Box::new(SystemClock)),
        }
    }
}

/// Parses `UTC`, `Z` or a fixed `±HH:MM` offset.
///
/// # Errors
///
/// Returns `AppError::Config` for named zones and malformed offsets.
pub fn parse_timezone(raw: &str) -> Result<FixedOffset, AppError> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(|| AppError::Config("UTC offset unavailable".to_owned()));
    }
    raw.parse::<FixedOffset>().map_err(|_| {
        AppError::Config(format!(
            "TRIPSCRIPT_TIMEZONE must be UTC or a fixed offset like +02:00, got \"{raw}\""
        ))
    })
}
