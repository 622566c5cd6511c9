//! crates/avatar_studio_core/src/time.rs
//!
//! Timestamp normalisation for job records.
//!
//! The backend emits two conventions in the same `YYYY-MM-DD HH:MM:SS` format:
//! `created_at` is already wall-clock time in the display zone, while
//! `started_at` and `completed_at` are UTC wall-clock time. Each raw value is
//! tagged with its convention at ingestion (`Timestamp::Local` / `Timestamp::Utc`)
//! so downstream code cannot apply the wrong conversion.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Rendering used for every user-facing timestamp: 24-hour clock, whole seconds.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rendering of a missing timestamp or metric.
pub const UNAVAILABLE: &str = "-";

// `%.f` also accepts a value without a fractional part.
const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

//=========================================================================================
// Errors and the Tagged Timestamp
//=========================================================================================

/// A raw timestamp that could not be read. Callers resolve it to "unavailable".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("Timestamp is empty")]
    Empty,
    #[error("Malformed timestamp: {0}")]
    Malformed(String),
}

/// A backend timestamp together with the convention it was emitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Wall-clock fields already expressed in the display zone.
    Local(NaiveDateTime),
    /// Wall-clock fields expressed in UTC.
    Utc(NaiveDateTime),
}

impl Timestamp {
    /// Reads `raw` as display-zone wall-clock time.
    pub fn local(raw: &str) -> Result<Self, TimestampError> {
        parse_wall_clock(raw).map(Timestamp::Local)
    }

    /// Reads `raw` as UTC wall-clock time.
    pub fn utc(raw: &str) -> Result<Self, TimestampError> {
        parse_wall_clock(raw).map(Timestamp::Utc)
    }
}

fn parse_wall_clock(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }
    // ISO-style `T` separators are accepted alongside the plain space.
    let normalized = trimmed.replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&normalized, WIRE_FORMAT)
        .map_err(|_| TimestampError::Malformed(raw.to_string()))
}

//=========================================================================================
// TimeNormalizer
//=========================================================================================

/// Converts tagged timestamps into instants in a fixed display zone and derives
/// interval metrics from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    zone: FixedOffset,
}

impl TimeNormalizer {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    /// Resolves a tagged timestamp to an absolute instant in the display zone.
    pub fn resolve(&self, timestamp: Timestamp) -> Result<DateTime<FixedOffset>, TimestampError> {
        match timestamp {
            Timestamp::Local(naive) => self
                .zone
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| TimestampError::Malformed(naive.to_string())),
            Timestamp::Utc(naive) => Ok(Utc.from_utc_datetime(&naive).with_timezone(&self.zone)),
        }
    }

    /// Interprets `raw` as wall-clock time that is already in the display zone.
    pub fn parse_display_local(&self, raw: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
        self.resolve(Timestamp::local(raw)?)
    }

    /// Interprets `raw` as UTC wall-clock time and converts it to the display zone.
    pub fn parse_source_utc(&self, raw: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
        self.resolve(Timestamp::utc(raw)?)
    }

    pub fn format_for_display(&self, instant: &DateTime<FixedOffset>) -> String {
        instant
            .with_timezone(&self.zone)
            .format(DISPLAY_FORMAT)
            .to_string()
    }

    /// Renders an optional tagged timestamp, or `-` when it is missing or unresolvable.
    pub fn render(&self, timestamp: Option<Timestamp>) -> String {
        timestamp
            .and_then(|ts| self.resolve(ts).ok())
            .map(|instant| self.format_for_display(&instant))
            .unwrap_or_else(|| UNAVAILABLE.to_string())
    }

    /// Whole seconds from `start` to `end`, rounded to the nearest second.
    ///
    /// `None` when either side is unavailable or `end` precedes `start`; a negative
    /// interval is never returned.
    pub fn seconds_between(
        start: Option<&DateTime<FixedOffset>>,
        end: Option<&DateTime<FixedOffset>>,
    ) -> Option<u64> {
        let (start, end) = (start?, end?);
        let millis = end.signed_duration_since(*start).num_milliseconds();
        if millis < 0 {
            return None;
        }
        u64::try_from((millis + 500) / 1000).ok()
    }

    /// Seconds between two tagged timestamps, each resolved with its own convention.
    pub fn interval(&self, start: Option<Timestamp>, end: Option<Timestamp>) -> Option<u64> {
        let start = start.and_then(|ts| self.resolve(ts).ok());
        let end = end.and_then(|ts| self.resolve(ts).ok());
        Self::seconds_between(start.as_ref(), end.as_ref())
    }

    /// Processing time: both sides are UTC.
    pub fn duration(&self, started_raw: &str, completed_raw: &str) -> Option<u64> {
        let started = self.parse_source_utc(started_raw).ok();
        let completed = self.parse_source_utc(completed_raw).ok();
        Self::seconds_between(started.as_ref(), completed.as_ref())
    }

    /// Submission-to-completion time.
    ///
    /// `created_raw` is read as display-local and `completed_raw` as UTC. The two
    /// sides deliberately use different parsers because that is how the backend
    /// emits them.
    pub fn end_to_end(&self, created_raw: &str, completed_raw: &str) -> Option<u64> {
        let created = self.parse_display_local(created_raw).ok();
        let completed = self.parse_source_utc(completed_raw).ok();
        Self::seconds_between(created.as_ref(), completed.as_ref())
    }
}

/// Renders a derived metric as `"<n> sec"`, or `-` when unavailable.
pub fn format_seconds(seconds: Option<u64>) -> String {
    match seconds {
        Some(s) => format!("{} sec", s),
        None => UNAVAILABLE.to_string(),
    }
}
