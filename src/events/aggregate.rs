//! Daily aggregation
//!
//! Turns a raw event list into the chart series: one `DailyBucket` per
//! calendar day, ordered by each day's first event.

use chrono::{Datelike, Local, NaiveDate, TimeZone};
use std::collections::HashMap;

use super::types::{DailyBucket, Event};

/// Bucket events by local calendar day
pub fn aggregate(events: &[Event]) -> Vec<DailyBucket> {
    aggregate_in(events, &Local)
}

/// Bucket events by calendar day in the given timezone
///
/// Output length equals the number of distinct days and the visit counts
/// sum to `events.len()`. Empty input gives an empty series.
pub fn aggregate_in<Tz: TimeZone>(events: &[Event], tz: &Tz) -> Vec<DailyBucket> {
    let mut timestamps: Vec<_> = events.iter().map(|e| e.timestamp).collect();
    timestamps.sort_unstable();

    // Day -> position in `buckets`, so first-seen order survives
    let mut positions: HashMap<NaiveDate, usize> = HashMap::new();
    let mut buckets: Vec<DailyBucket> = Vec::new();

    for ts in timestamps {
        let day = ts.with_timezone(tz).date_naive();
        match positions.get(&day) {
            Some(&idx) => buckets[idx].visits += 1,
            None => {
                positions.insert(day, buckets.len());
                buckets.push(DailyBucket::new(format_day(day), 1));
            }
        }
    }

    buckets
}

/// Format a day as `month/day/year`, no zero padding
pub fn format_day(day: NaiveDate) -> String {
    format!("{}/{}/{}", day.month(), day.day(), day.year())
}

/// Sum of visits across all buckets
pub fn total_visits(buckets: &[DailyBucket]) -> u64 {
    buckets.iter().map(|b| b.visits).sum()
}

/// The busiest day; ties go to the earliest
pub fn peak_day(buckets: &[DailyBucket]) -> Option<&DailyBucket> {
    buckets
        .iter()
        .fold(None, |best: Option<&DailyBucket>, b| match best {
            Some(current) if current.visits >= b.visits => Some(current),
            _ => Some(b),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use std::collections::HashSet;

    fn at<Tz: TimeZone>(tz: &Tz, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Event {
        Event::new(tz.with_ymd_and_hms(y, mo, d, h, mi, s).single().unwrap())
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
        assert!(aggregate_in(&[], &Utc).is_empty());
    }

    #[test]
    fn test_unsorted_input_orders_days_chronologically() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let events = vec![
            at(&tz, 2023, 1, 2, 23, 0, 0),
            at(&tz, 2023, 1, 1, 1, 0, 0),
            at(&tz, 2023, 1, 2, 5, 0, 0),
        ];

        let buckets = aggregate_in(&events, &tz);
        assert_eq!(
            buckets,
            vec![
                DailyBucket::new("1/1/2023", 1),
                DailyBucket::new("1/2/2023", 2),
            ]
        );
    }

    #[test]
    fn test_single_event() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let buckets = aggregate_in(&[at(&tz, 2023, 3, 15, 10, 0, 0)], &tz);
        assert_eq!(buckets, vec![DailyBucket::new("3/15/2023", 1)]);
    }

    #[test]
    fn test_same_day_edges() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let events = vec![
            at(&tz, 2023, 7, 4, 23, 59, 59),
            at(&tz, 2023, 7, 4, 0, 0, 1),
        ];
        assert_eq!(
            aggregate_in(&events, &tz),
            vec![DailyBucket::new("7/4/2023", 2)]
        );
    }

    #[test]
    fn test_local_time_default() {
        let events = vec![
            at(&Local, 2023, 1, 2, 23, 0, 0),
            at(&Local, 2023, 1, 1, 1, 0, 0),
            at(&Local, 2023, 1, 2, 5, 0, 0),
        ];
        assert_eq!(
            aggregate(&events),
            vec![
                DailyBucket::new("1/1/2023", 1),
                DailyBucket::new("1/2/2023", 2),
            ]
        );
    }

    #[test]
    fn test_day_boundary_depends_on_timezone() {
        // 2023-01-01T23:30Z is still Jan 1 in UTC but Jan 2 at UTC+2
        let events = vec![
            at(&Utc, 2023, 1, 1, 23, 30, 0),
            at(&Utc, 2023, 1, 1, 12, 0, 0),
        ];

        assert_eq!(
            aggregate_in(&events, &Utc),
            vec![DailyBucket::new("1/1/2023", 2)]
        );

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(
            aggregate_in(&events, &plus_two),
            vec![
                DailyBucket::new("1/1/2023", 1),
                DailyBucket::new("1/2/2023", 1),
            ]
        );
    }

    #[test]
    fn test_sorts_by_instant_not_by_label() {
        // "10/1/2023" sorts before "9/30/2023" as text
        let events = vec![
            at(&Utc, 2023, 10, 1, 8, 0, 0),
            at(&Utc, 2023, 9, 30, 8, 0, 0),
            at(&Utc, 2023, 10, 1, 9, 0, 0),
        ];
        let dates: Vec<_> = aggregate_in(&events, &Utc)
            .into_iter()
            .map(|b| b.date)
            .collect();
        assert_eq!(dates, vec!["9/30/2023", "10/1/2023"]);
    }

    #[test]
    fn test_counts_and_distinct_days() {
        // Pseudo-random spread over ~40 days, fixed seed
        let mut seed: i64 = 0x2545F491;
        let base = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap().timestamp_millis();
        let events: Vec<Event> = (0..500)
            .map(|_| {
                seed = (seed.wrapping_mul(6364136223846793005).wrapping_add(1)) & i64::MAX;
                Event::from_millis(base + seed % (40 * 86_400_000)).unwrap()
            })
            .collect();

        let tz = FixedOffset::west_opt(7 * 3600).unwrap();
        let buckets = aggregate_in(&events, &tz);

        assert_eq!(total_visits(&buckets), events.len() as u64);

        let distinct: HashSet<NaiveDate> = events
            .iter()
            .map(|e| e.timestamp.with_timezone(&tz).date_naive())
            .collect();
        assert_eq!(buckets.len(), distinct.len());

        let mut sorted: Vec<NaiveDate> = distinct.into_iter().collect();
        sorted.sort();
        let expected: Vec<String> = sorted.into_iter().map(format_day).collect();
        let actual: Vec<String> = buckets.into_iter().map(|b| b.date).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_format_day_no_padding() {
        let day = NaiveDate::from_ymd_opt(2023, 1, 5).unwrap();
        assert_eq!(format_day(day), "1/5/2023");
        let day = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        assert_eq!(format_day(day), "12/25/2023");
    }

    #[test]
    fn test_peak_day() {
        assert!(peak_day(&[]).is_none());

        let buckets = vec![
            DailyBucket::new("1/1/2023", 3),
            DailyBucket::new("1/2/2023", 7),
            DailyBucket::new("1/3/2023", 7),
        ];
        assert_eq!(peak_day(&buckets).unwrap().date, "1/2/2023");
        assert_eq!(total_visits(&buckets), 17);
    }
}
