//! Core data types for pageload events
//!
//! - `Event`: a single recorded visit
//! - `DailyBucket`: visit count for one calendar day
//! - `RangeBoundary` / `DateRange`: the transport-encoded query window

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single visit record
///
/// Only the timestamp is kept; any other fields the endpoint sends are ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// When the page was loaded
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event at the given instant
    pub fn new<Tz: TimeZone>(timestamp: DateTime<Tz>) -> Self {
        Self {
            timestamp: timestamp.with_timezone(&Utc),
        }
    }

    /// Create an event from Unix milliseconds
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|timestamp| Self { timestamp })
    }
}

/// Aggregated visit count for one calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyBucket {
    /// Day formatted as `month/day/year` without zero padding
    pub date: String,
    /// Number of events on that day
    pub visits: u64,
}

impl DailyBucket {
    pub fn new(date: impl Into<String>, visits: u64) -> Self {
        Self {
            date: date.into(),
            visits,
        }
    }
}

/// An opaque, transport-encoded date marking one end of the query window
///
/// The value is never decoded or validated; it is placed into the query string as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeBoundary(String);

impl RangeBoundary {
    /// Wrap a value that is already safe for a query string
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encode a raw value the same way `encodeURIComponent` does
    ///
    /// Alphanumerics and `-_.!~*'()` pass through; every other byte of the
    /// UTF-8 form becomes `%XX`.
    pub fn encode(raw: &str) -> Self {
        let encoded = urlencoding::encode(raw)
            .replace("%21", "!")
            .replace("%2A", "*")
            .replace("%27", "'")
            .replace("%28", "(")
            .replace("%29", ")");
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RangeBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The requested query window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: RangeBoundary,
    pub end: RangeBoundary,
}

impl DateRange {
    pub fn new(start: RangeBoundary, end: RangeBoundary) -> Self {
        Self { start, end }
    }

    /// Build a range from raw (unencoded) boundary values
    pub fn encode(start: &str, end: &str) -> Self {
        Self::new(RangeBoundary::encode(start), RangeBoundary::encode(end))
    }

    /// Query string understood by the pageloads endpoint
    pub fn query_string(&self) -> String {
        format!("start_date={}&end_date={}", self.start, self.end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ============================================
// Timestamp decoding
// ============================================

/// Timestamp as it may appear on the wire
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Event::from_millis(ms)
            .map(|e| e.timestamp)
            .ok_or_else(|| format!("timestamp out of range: {}", ms)),
        RawTimestamp::FractionalMillis(ms) => Event::from_millis(ms.trunc() as i64)
            .map(|e| e.timestamp)
            .ok_or_else(|| format!("timestamp out of range: {}", ms)),
        RawTimestamp::Text(s) => parse_timestamp(&s),
    };

    parsed.map_err(serde::de::Error::custom)
}

/// Date-time layouts without an offset
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Offset forms RFC 3339 does not cover (no seconds)
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"];

/// Parse a textual timestamp, reading offset-less date-times as local time
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp_in(s, &Local)
}

/// Parse a textual timestamp
///
/// - a date-time with an offset or `Z` is taken as-is
/// - a date-time without an offset is wall time in `tz`
/// - a bare date, year-month or year is midnight UTC on its first day
pub fn parse_timestamp_in<Tz: TimeZone>(s: &str, tz: &Tz) -> Result<DateTime<Utc>, String> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    if let Some(utc) = s.strip_suffix('Z') {
        if let Some(naive) = parse_naive(utc) {
            return Ok(naive.and_utc());
        }
    }

    if let Some(naive) = parse_naive(s) {
        return Ok(resolve_local(naive, tz));
    }

    if let Some(date) = parse_date_only(s) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(format!("invalid timestamp: {:?}", s))
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`
fn parse_date_only(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    let mut parts = s.split('-');
    let year = parts.next().filter(|y| y.len() == 4)?;
    let month = match parts.next() {
        Some(m) if m.len() == 2 => m,
        Some(_) => return None,
        None => "01",
    };
    if parts.next().is_some() || !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

/// Wall time in `tz` to an instant
///
/// Ambiguous times take the earlier instant. Times inside a spring-forward
/// gap are read with the offset in force before the gap, which lands them
/// after the transition (02:30 in a 02:00 to 03:00 gap becomes 03:30).
fn resolve_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let before = naive.checked_sub_signed(Duration::hours(24)).unwrap_or(naive);
            let offset = tz.offset_from_utc_datetime(&before).fix();
            (naive - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
        }
    }
}
