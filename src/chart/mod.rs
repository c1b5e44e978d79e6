//! Chart Rendering
//!
//! Terminal rendition of the daily visits chart. The chart view draws one
//! bar per day scaled against the busiest day, with a trend marker that
//! follows the line between consecutive days. Table, CSV and JSON outputs
//! carry the same series for scripting.

use std::str::FromStr;
use thiserror::Error;

use crate::events::{peak_day, total_visits, DailyBucket};

/// Shown instead of a chart when the series is empty
pub const NO_DATA: &str = "No data available";

/// Chart appearance
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Width of the longest bar, in characters
    pub width: usize,
    /// Character bars are drawn with
    pub bar_char: char,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 50,
            bar_char: '#',
        }
    }
}

/// How to print a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Chart,
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chart" => Ok(OutputFormat::Chart),
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(ChartError::UnknownFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Chart => write!(f, "chart"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Errors that can occur while rendering
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Unknown output format: {0} (expected chart, table, csv or json)")]
    UnknownFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output was not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Render `buckets` in the requested format
pub fn render(
    buckets: &[DailyBucket],
    format: OutputFormat,
    config: &ChartConfig,
) -> Result<String, ChartError> {
    match format {
        OutputFormat::Chart => Ok(render_chart(buckets, config)),
        OutputFormat::Table => Ok(render_table(buckets)),
        OutputFormat::Csv => render_csv(buckets),
        OutputFormat::Json => render_json(buckets),
    }
}

/// Bar chart with a trend column
///
/// ```text
/// 1/1/2023 | #########################                          1
/// 1/2/2023 | ################################################## 2 ^
/// ```
pub fn render_chart(buckets: &[DailyBucket], config: &ChartConfig) -> String {
    let peak = match peak_day(buckets) {
        Some(peak) => peak,
        None => return format!("{}\n", NO_DATA),
    };

    let label_width = buckets.iter().map(|b| b.date.len()).max().unwrap_or(0);
    let count_width = peak.visits.to_string().len();
    let width = config.width.max(1);

    let mut out = String::new();
    let mut previous: Option<u64> = None;

    for bucket in buckets {
        let bar: String = std::iter::repeat(config.bar_char)
            .take(bar_length(bucket.visits, peak.visits, width))
            .collect();

        let trend = match previous {
            None => ' ',
            Some(prev) if bucket.visits > prev => '^',
            Some(prev) if bucket.visits < prev => 'v',
            Some(_) => '=',
        };

        let line = format!(
            "{:<lw$} | {:<w$} {:>cw$} {}",
            bucket.date,
            bar,
            bucket.visits,
            trend,
            lw = label_width,
            w = width,
            cw = count_width,
        );
        out.push_str(line.trim_end());
        out.push('\n');
        previous = Some(bucket.visits);
    }

    out.push_str(&format!(
        "total {} visits over {} days, peak {} ({})\n",
        total_visits(buckets),
        buckets.len(),
        peak.date,
        peak.visits
    ));

    out
}

/// Bar length relative to the peak, at least one cell for any visit
fn bar_length(visits: u64, peak: u64, width: usize) -> usize {
    if visits == 0 || peak == 0 {
        return 0;
    }
    let width = width as u64;
    (visits * width).div_ceil(peak).min(width) as usize
}

/// Two-column table
pub fn render_table(buckets: &[DailyBucket]) -> String {
    if buckets.is_empty() {
        return format!("{}\n", NO_DATA);
    }

    let mut out = String::new();
    out.push_str(&format!("{:<12} | {:>8}\n", "Date", "Visits"));
    out.push_str(&format!("{}\n", "-".repeat(23)));
    for bucket in buckets {
        out.push_str(&format!("{:<12} | {:>8}\n", bucket.date, bucket.visits));
    }
    out
}

/// `date,visits` CSV with a header row
pub fn render_csv(buckets: &[DailyBucket]) -> Result<String, ChartError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["date", "visits"])?;
    for bucket in buckets {
        writer.write_record([bucket.date.as_str(), bucket.visits.to_string().as_str()])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ChartError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Pretty JSON array of `{date, visits}`
pub fn render_json(buckets: &[DailyBucket]) -> Result<String, ChartError> {
    let mut out = serde_json::to_string_pretty(buckets)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Vec<DailyBucket> {
        vec![
            DailyBucket::new("1/1/2023", 1),
            DailyBucket::new("1/2/2023", 4),
            DailyBucket::new("1/3/2023", 4),
            DailyBucket::new("1/10/2023", 2),
        ]
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("chart".parse::<OutputFormat>().unwrap(), OutputFormat::Chart);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(" csv ".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!(matches!(
            "svg".parse::<OutputFormat>(),
            Err(ChartError::UnknownFormat(_))
        ));
        assert_eq!(OutputFormat::Table.to_string(), "table");
    }

    #[test]
    fn test_chart_no_data() {
        assert_eq!(
            render_chart(&[], &ChartConfig::default()),
            "No data available\n"
        );
    }

    #[test]
    fn test_chart_layout() {
        let config = ChartConfig {
            width: 8,
            bar_char: '*',
        };
        let chart = render_chart(&series(), &config);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "1/1/2023  | **       1");
        assert_eq!(lines[1], "1/2/2023  | ******** 4 ^");
        assert_eq!(lines[2], "1/3/2023  | ******** 4 =");
        assert_eq!(lines[3], "1/10/2023 | ****     2 v");
        assert_eq!(lines[4], "total 11 visits over 4 days, peak 1/2/2023 (4)");
    }

    #[test]
    fn test_bar_length() {
        assert_eq!(bar_length(0, 10, 50), 0);
        assert_eq!(bar_length(1, 1000, 50), 1);
        assert_eq!(bar_length(10, 10, 50), 50);
        assert_eq!(bar_length(5, 10, 50), 25);
    }

    #[test]
    fn test_table() {
        let table = render_table(&series());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Date         |   Visits");
        assert_eq!(lines[2], "1/1/2023     |        1");
        assert_eq!(lines.len(), 6);

        assert_eq!(render_table(&[]), "No data available\n");
    }

    #[test]
    fn test_csv() {
        let csv = render_csv(&series()).unwrap();
        assert_eq!(
            csv,
            "date,visits\n1/1/2023,1\n1/2/2023,4\n1/3/2023,4\n1/10/2023,2\n"
        );
        assert_eq!(render_csv(&[]).unwrap(), "date,visits\n");
    }

    #[test]
    fn test_json() {
        let json = render_json(&series()[..1]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["date"], "1/1/2023");
        assert_eq!(parsed[0]["visits"], 1);

        assert_eq!(render_json(&[]).unwrap().trim(), "[]");
    }

    #[test]
    fn test_render_dispatch() {
        let config = ChartConfig::default();
        let out = render(&series(), OutputFormat::Csv, &config).unwrap();
        assert!(out.starts_with("date,visits\n"));
        let out = render(&[], OutputFormat::Chart, &config).unwrap();
        assert_eq!(out, "No data available\n");
    }
}
