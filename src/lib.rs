//! # Pageloads
//!
//! Visitor charts for a website: fetch pageload events for a date range,
//! bucket them by local calendar day, and render the daily series.
//!
//! ## Modules
//!
//! - [`events`]: Event and bucket types, daily aggregation
//! - [`source`]: Event retrieval (HTTP client behind a trait)
//! - [`view`]: Range-driven fetch/apply state with stale-response guard
//! - [`chart`]: Terminal chart, table, CSV and JSON output
//! - [`config`]: TOML config with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pageloads::{ClientConfig, DateRange, PageloadsClient, PageloadsView, Rendering};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(PageloadsClient::new(ClientConfig::default())?);
//!     let mut view = PageloadsView::new(client);
//!
//!     view.refresh(DateRange::encode("2023-01-01", "2023-01-31")).await;
//!
//!     match view.render().await {
//!         Rendering::Chart(buckets) => {
//!             for bucket in buckets {
//!                 println!("{}: {}", bucket.date, bucket.visits);
//!             }
//!         }
//!         Rendering::NoData => println!("No data available"),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chart;
pub mod config;
pub mod events;
pub mod logging;
pub mod source;
pub mod view;

// Re-export top-level types for convenience
pub use events::{
    aggregate, aggregate_in, format_day, peak_day, total_visits, DailyBucket, DateRange, Event,
    RangeBoundary,
};

pub use source::{ClientConfig, EventSource, PageloadsClient, SourceError};

pub use view::{Applied, PageloadsView, Rendering};

pub use chart::{render, ChartConfig, ChartError, OutputFormat};

pub use config::{Config, ConfigError, LoggingConfig};
