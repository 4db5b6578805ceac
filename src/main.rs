//! CLI entry point for the bike-sharing dashboard.
//!
//! Provides subcommands for preparing the derived working set from a raw
//! table, and for querying it the way the dashboard's widgets do: grouped
//! counts, headline metrics, and weather trend lines.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bikeshare_dash::labels::{Season, Weather, Weekday};
use bikeshare_dash::normalize::{load_working_set, normalize, read_raw_records, write_working_set};
use bikeshare_dash::output::{OutputFormat, write_aggregation, write_metrics, write_trends};
use bikeshare_dash::query::{
    FilterSpec, GroupKey, KeyMetrics, Metric, Rider, WeatherVariable, aggregate_with, fit_trend,
    fit_trend_by_season,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Where the dashboard expects its derived working set.
const DEFAULT_DATA_PATH: &str = "dashboard/main_data.csv";

#[derive(Parser)]
#[command(name = "bikeshare_dash")]
#[command(about = "Explore hourly and daily bike-sharing rentals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the working-set file from a raw hourly or daily table
    Prepare {
        /// Raw table (hour.csv or day.csv, optionally .gz)
        #[arg(short, long, value_name = "RAW_CSV")]
        source: PathBuf,

        /// Where to write the derived file
        #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
        output: PathBuf,
    },
    /// Group filtered rentals by a dimension
    Query {
        #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Dimension to group by
        #[arg(short, long, value_enum)]
        group_by: GroupKey,

        /// Sum counts per group, or average them per row
        #[arg(short, long, value_enum, default_value_t = Metric::Sum)]
        metric: Metric,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show total rentals, average rentals and the casual/registered split
    Summary {
        #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Fit a least-squares line of rentals against a weather measurement
    Trend {
        #[arg(short, long, default_value = DEFAULT_DATA_PATH)]
        data: PathBuf,

        /// Weather measurement on the x axis
        #[arg(short, long, value_enum)]
        variable: WeatherVariable,

        /// Rider count on the y axis
        #[arg(short, long, value_enum, default_value_t = Rider::Total)]
        rider: Rider,

        /// Fit one line per season instead of one overall
        #[arg(long, default_value_t = false)]
        by_season: bool,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Filter widgets shared by every query subcommand. Repeating a selection
/// flag selects several values.
#[derive(Args, Debug)]
struct FilterArgs {
    /// First date to include
    #[arg(long, value_name = "YYYY-MM-DD")]
    from: Option<NaiveDate>,

    /// Last date to include
    #[arg(long, value_name = "YYYY-MM-DD")]
    to: Option<NaiveDate>,

    /// First hour to include (hourly data only)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    hour_from: Option<u8>,

    /// Last hour to include (hourly data only)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    hour_to: Option<u8>,

    #[arg(long, value_enum)]
    season: Vec<Season>,

    #[arg(long, value_enum)]
    weather: Vec<Weather>,

    #[arg(long, value_enum)]
    weekday: Vec<Weekday>,

    /// Only working days (true) or only weekends and holidays (false)
    #[arg(long, action = clap::ArgAction::Set)]
    working_day: Option<bool>,

    #[arg(long)]
    year: Vec<u16>,
}

impl FilterArgs {
    fn to_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::new();

        if self.from.is_some() || self.to.is_some() {
            spec = spec.date_range(
                self.from.unwrap_or(NaiveDate::MIN),
                self.to.unwrap_or(NaiveDate::MAX),
            );
        }
        if self.hour_from.is_some() || self.hour_to.is_some() {
            spec = spec.hour_range(self.hour_from.unwrap_or(0), self.hour_to.unwrap_or(23));
        }
        for &s in &self.season {
            spec = spec.season(s);
        }
        for &w in &self.weather {
            spec = spec.weather(w);
        }
        for &d in &self.weekday {
            spec = spec.weekday(d);
        }
        if let Some(working) = self.working_day {
            spec = spec.working_day(working);
        }
        for &y in &self.year {
            spec = spec.year(y);
        }

        spec
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare { source, output } => prepare(&source, &output)?,
        Commands::Query {
            data,
            group_by,
            metric,
            filters,
            format,
        } => {
            let table = load(&data)?;
            let spec = filters.to_spec();
            let result = aggregate_with(&table, &spec, group_by, metric)
                .with_context(|| format!("Failed to group by {:?}", group_by))?;

            if result.is_empty() {
                warn!(?spec, "No rows match the current filters");
            } else {
                info!(groups = result.len(), "Query complete");
            }
            write_aggregation(&mut std::io::stdout().lock(), &result, format)?;
        }
        Commands::Summary {
            data,
            filters,
            format,
        } => {
            let table = load(&data)?;
            let spec = filters.to_spec();
            let metrics = KeyMetrics::from_rows(spec.apply(&table));

            info!(
                rows = metrics.rows,
                total_rentals = metrics.total_rentals,
                "Summary computed"
            );
            write_metrics(&mut std::io::stdout().lock(), &metrics, format)?;
        }
        Commands::Trend {
            data,
            variable,
            rider,
            by_season,
            filters,
            format,
        } => {
            let table = load(&data)?;
            let rows = filters.to_spec().apply(&table);

            let lines: Vec<_> = if by_season {
                fit_trend_by_season(&rows, variable, rider)
                    .into_iter()
                    .map(|(season, line)| (Some(season), line))
                    .collect()
            } else {
                fit_trend(rows.iter().copied(), variable, rider)
                    .map(|line| (None, line))
                    .into_iter()
                    .collect()
            };

            if lines.is_empty() {
                warn!(rows = rows.len(), ?variable, "Not enough data to fit a trend");
            }
            write_trends(&mut std::io::stdout().lock(), &lines, format)?;
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
///
/// The returned guard must be held for the life of the process so the
/// file writer flushes on exit.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bikeshare_dash.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_dash.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

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

    Ok(file_guard)
}

/// Reads a raw table, derives its labels and writes the working-set file.
#[tracing::instrument(skip_all, fields(source = %source.display(), output = %output.display()))]
fn prepare(source: &Path, output: &Path) -> Result<()> {
    let raw = read_raw_records(source)
        .with_context(|| format!("Failed to read raw table {}", source.display()))?;
    let table = normalize(raw)
        .with_context(|| format!("Failed to normalize {}", source.display()))?;

    let hourly = table.first().is_some_and(|r| r.hour().is_some());
    info!(rows = table.len(), hourly, "Raw table normalized");

    write_working_set(output, &table)
        .with_context(|| format!("Failed to write working set {}", output.display()))?;
    Ok(())
}

fn load(data: &Path) -> Result<Vec<bikeshare_dash::records::CanonicalRecord>> {
    load_working_set(data).with_context(|| {
        format!(
            "Failed to load working set {} (run `prepare` to regenerate it)",
            data.display()
        )
    })
}
