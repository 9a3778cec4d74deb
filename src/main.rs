//! CLI entry point for the movement range pipeline.
//!
//! Builds one request from the command line, runs it, and writes the
//! resulting series as CSV to a file or stdout.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use movement_range::analysis::aggregate::{ComparisonMode, CustomSelection, GroupSelection, Selection};
use movement_range::analysis::overlay::PolicyJoin;
use movement_range::{
    boundary::BoundaryResolver,
    config::Config,
    country::{Country, Level},
    fetch::BasicClient,
    model::Metric,
    output::{write_csv, write_csv_file},
    pipeline::{Pipeline, Request, View},
    sources::RemoteFetcher,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "movement_range")]
#[command(about = "Assemble Movement Range Maps series for Pacific countries", long_about = None)]
struct Cli {
    /// JSON config file; environment variables are used when omitted
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Series for the whole country, or for selected provinces or cities
    Series {
        /// Country code or name (VNM, PHL, TLS)
        #[arg(short, long)]
        country: Country,

        /// national, provincial or city
        #[arg(short, long, default_value = "provincial")]
        level: Level,

        /// Unit to include; repeat for several. Defaults per country when omitted
        #[arg(short, long = "unit")]
        units: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Compare two custom groups of provinces and cities; defaults per country without group flags
    Compare {
        #[arg(short, long)]
        country: Country,

        #[arg(long = "g1-province")]
        group1_provinces: Vec<String>,

        #[arg(long = "g1-city")]
        group1_cities: Vec<String>,

        #[arg(long = "g2-province")]
        group2_provinces: Vec<String>,

        #[arg(long = "g2-city")]
        group2_cities: Vec<String>,

        /// Build group 2 as the complement of its selection, resampled weekly
        #[arg(long, default_value_t = false)]
        legacy: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the units selectable at a level
    Units {
        #[arg(short, long)]
        country: Country,

        #[arg(short, long, default_value = "provincial")]
        level: Level,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// mobility-change or staying-put
    #[arg(short, long, default_value = "mobility-change")]
    metric: Metric,

    /// CSV file to write; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drop points whose date has no policy data
    #[arg(long, default_value_t = false)]
    inner_policy_join: bool,
}

impl OutputArgs {
    fn policy_join(&self) -> PolicyJoin {
        if self.inner_policy_join {
            PolicyJoin::Inner
        } else {
            PolicyJoin::Left
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/movement_range.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("movement_range.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    let client = BasicClient::new(config.fetch_timeout())?;
    let fetcher = RemoteFetcher::new(client, config.sources.clone());
    let pipeline = Pipeline::new(fetcher, BoundaryResolver::new(&config.boundary_dir));

    match cli.command {
        Commands::Series {
            country,
            level,
            units,
            output,
        } => {
            let units = if units.is_empty() {
                country
                    .default_units(level)
                    .iter()
                    .map(|u| u.to_string())
                    .collect()
            } else {
                units
            };

            let selection = match level {
                Level::National => Selection::National,
                Level::Provincial => Selection::Provincial(units),
                Level::City => Selection::City(units),
                Level::Custom => bail!("use the compare subcommand for custom groups"),
            };

            let request = Request {
                country,
                metric: output.metric,
                selection,
                policy_join: output.policy_join(),
            };
            let view = pipeline.run(&request).await?;
            emit(&view, output.output.as_deref())?;
        }
        Commands::Compare {
            country,
            group1_provinces,
            group1_cities,
            group2_provinces,
            group2_cities,
            legacy,
            output,
        } => {
            let mode = if legacy {
                ComparisonMode::Legacy
            } else {
                ComparisonMode::Symmetric
            };
            let no_groups = group1_provinces.is_empty()
                && group1_cities.is_empty()
                && group2_provinces.is_empty()
                && group2_cities.is_empty();

            let custom = if no_groups {
                info!(country = country.code(), "Using default comparison groups");
                CustomSelection::defaults(country, mode)
            } else {
                CustomSelection {
                    group1: GroupSelection {
                        provinces: group1_provinces,
                        cities: group1_cities,
                    },
                    group2: GroupSelection {
                        provinces: group2_provinces,
                        cities: group2_cities,
                    },
                    mode,
                }
            };
            let selection = Selection::Custom(custom);

            let request = Request {
                country,
                metric: output.metric,
                selection,
                policy_join: output.policy_join(),
            };
            let view = pipeline.run(&request).await?;
            emit(&view, output.output.as_deref())?;
        }
        Commands::Units { country, level } => {
            let units = pipeline.units(country, level).await?;
            info!(country = country.code(), ?level, count = units.len(), "Selectable units");
            for unit in units {
                println!("{unit}");
            }
        }
    }

    Ok(())
}

/// Logs the view summary and writes its series as CSV.
fn emit(view: &View, path: Option<&Path>) -> Result<()> {
    for dataset in &view.degraded {
        warn!(%dataset, "Layer missing from this view");
    }
    if view.dropped_rows > 0 {
        warn!(dropped = view.dropped_rows, "Rows without boundary match were dropped");
    }
    for event in &view.events {
        info!(
            label = %event.label,
            area = %event.province_or_area,
            start = %event.start_date,
            end = %event.end_date,
            "Event"
        );
    }
    if view.series.is_empty() {
        info!("No data for this selection");
    }

    match path {
        Some(path) => write_csv_file(path, &view.series)?,
        None => write_csv(std::io::stdout().lock(), &view.series)?,
    }
    Ok(())
}
