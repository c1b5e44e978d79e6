//! Pageloads CLI
//!
//! Command-line front end for the visitor chart:
//! - Show the daily visits for one date range
//! - Watch: follow range changes fed on stdin
//! - Generate a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use pageloads::chart::{self, ChartConfig, OutputFormat};
use pageloads::config::{self, Config};
use pageloads::{DateRange, EventSource, PageloadsClient, PageloadsView, RangeBoundary, Rendering};

#[derive(Parser)]
#[command(name = "pageloads")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Daily visitor charts from pageload events")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Output format (chart, table, csv, json)
    #[arg(short, long, default_value = "chart", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one range and print it
    Show {
        /// Start of the range
        #[arg(short, long)]
        start: String,
        /// End of the range
        #[arg(short, long)]
        end: String,
        /// Values are already URL-encoded; send them untouched
        #[arg(long)]
        encoded: bool,
    },

    /// Read "start end" lines from stdin and redraw as responses arrive
    Watch {
        /// Values are already URL-encoded; send them untouched
        #[arg(long)]
        encoded: bool,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.source.base_url = url.clone();
    }

    pageloads::logging::init(&config.logging).context("failed to initialize logging")?;

    let format: OutputFormat = cli.format.parse()?;
    let chart_config = config.chart.chart_config();

    match cli.command {
        Commands::Show {
            start,
            end,
            encoded,
        } => {
            let mut view = build_view(&config)?;
            let range = make_range(&start, &end, encoded);

            let applied = view.refresh(range).await;
            tracing::debug!(?applied, "Fetch finished");

            print_view(&view, format, &chart_config).await?;
        }

        Commands::Watch { encoded } => {
            let view = build_view(&config)?;
            watch(view, encoded, format, &chart_config).await?;
        }

        Commands::Config { output } => {
            let content = config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("failed to create {:?}", parent))?;
                    }
                    std::fs::write(&path, &content)
                        .with_context(|| format!("failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", content);
                }
            }
        }
    }

    Ok(())
}

fn build_view(config: &Config) -> anyhow::Result<PageloadsView<PageloadsClient>> {
    let client = PageloadsClient::new(config.source.client_config())
        .context("failed to create HTTP client")?;
    tracing::info!(
        source = client.name(),
        url = %client.config().base_url,
        path = %client.config().path,
        "Using pageloads endpoint"
    );
    Ok(PageloadsView::new(Arc::new(client)))
}

fn make_range(start: &str, end: &str, encoded: bool) -> DateRange {
    if encoded {
        DateRange::new(
            RangeBoundary::from_encoded(start),
            RangeBoundary::from_encoded(end),
        )
    } else {
        DateRange::encode(start, end)
    }
}

/// Split a watch line into a range; `None` for anything malformed
fn parse_range_line(line: &str, encoded: bool) -> Option<DateRange> {
    let mut fields = line.split_whitespace();
    let start = fields.next()?;
    let end = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    Some(make_range(start, end, encoded))
}

async fn watch(
    mut view: PageloadsView<PageloadsClient>,
    encoded: bool,
    format: OutputFormat,
    chart_config: &ChartConfig,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut updates = view.subscribe();
    let mut in_flight = Vec::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_range_line(&line, encoded) {
                    Some(range) => {
                        if let Some(handle) = view.set_range(range) {
                            in_flight.push(handle);
                        }
                    }
                    None => tracing::warn!(%line, "Expected \"start end\", skipping line"),
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&view, format, chart_config).await?;
            }
        }

        in_flight.retain(|handle| !handle.is_finished());
    }

    // Input closed; let outstanding fetches land before exiting
    for handle in in_flight {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Pageloads fetch task did not complete");
        }
    }
    if updates.has_changed().unwrap_or(false) {
        print_view(&view, format, chart_config).await?;
    }

    Ok(())
}

async fn print_view(
    view: &PageloadsView<PageloadsClient>,
    format: OutputFormat,
    chart_config: &ChartConfig,
) -> anyhow::Result<()> {
    let output = match view.render().await {
        Rendering::Chart(buckets) => chart::render(&buckets, format, chart_config)?,
        Rendering::NoData => chart::render(&[], format, chart_config)?,
    };
    print!("{}", output);
    Ok(())
}
