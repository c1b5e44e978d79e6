//! Pageload events
//!
//! - **types**: Event, DailyBucket and the encoded query window
//! - **aggregate**: bucketing events into a per-day series
//!
//! ```text
//!   [Event] → sort by instant → calendar day (local) → count per day → [DailyBucket]
//! ```

pub mod aggregate;
pub mod types;

pub use aggregate::{aggregate, aggregate_in, format_day, peak_day, total_visits};
pub use types::{parse_timestamp, parse_timestamp_in, DailyBucket, DateRange, Event, RangeBoundary};
