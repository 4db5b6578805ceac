//! Rendering of query results.
//!
//! Supports a plain-text table, pretty JSON and CSV, all written to any
//! [`Write`] sink so the CLI can target stdout and tests can target a buffer.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use csv::WriterBuilder;
use serde::Serialize;

use crate::labels::Season;
use crate::query::{AggregationResult, GroupKey, KeyMetrics, Metric, Rider, TrendLine, WeatherVariable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub const EMPTY_STATE: &str = "No rentals match the current filters.";

fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_csv<T: Serialize>(out: &mut impl Write, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn key_heading(key: GroupKey) -> &'static str {
    match key {
        GroupKey::Hour => "Hour",
        GroupKey::Weekday => "Day of Week",
        GroupKey::Month => "Month",
        GroupKey::Season => "Season",
        GroupKey::Weather => "Weather",
        GroupKey::WorkingDay => "Day Type",
        GroupKey::Year => "Year",
        GroupKey::UserType => "User Type",
    }
}

/// Writes an [`AggregationResult`] in the requested format.
///
/// An empty result is still valid output: JSON gets an empty `groups` list,
/// CSV gets nothing, and the table prints [`EMPTY_STATE`].
pub fn write_aggregation(
    out: &mut impl Write,
    result: &AggregationResult,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, result),
        OutputFormat::Csv => write_csv(out, &result.groups),
        OutputFormat::Table => {
            if result.is_empty() {
                writeln!(out, "{}", EMPTY_STATE)?;
                return Ok(());
            }

            let precision = match result.metric {
                Metric::Sum => 0,
                Metric::Mean => 1,
            };
            let width = result
                .groups
                .iter()
                .map(|g| g.key.to_string().len())
                .max()
                .unwrap_or(0)
                .max(key_heading(result.group_key).len());

            writeln!(
                out,
                "{:<width$}  {:>8}  {:>12}  {:>12}  {:>12}",
                key_heading(result.group_key),
                "Rows",
                "Casual",
                "Registered",
                "Total",
            )?;
            for g in &result.groups {
                writeln!(
                    out,
                    "{:<width$}  {:>8}  {:>12.precision$}  {:>12.precision$}  {:>12.precision$}",
                    g.key.to_string(),
                    g.rows,
                    g.casual,
                    g.registered,
                    g.total,
                )?;
            }
            Ok(())
        }
    }
}

/// Writes the headline [`KeyMetrics`] in the requested format.
pub fn write_metrics(out: &mut impl Write, metrics: &KeyMetrics, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, metrics),
        OutputFormat::Csv => write_csv(out, [metrics]),
        OutputFormat::Table => {
            if metrics.rows == 0 {
                writeln!(out, "{}", EMPTY_STATE)?;
                return Ok(());
            }
            writeln!(out, "Total Bike Rentals     {}", metrics.total_rentals)?;
            writeln!(out, "Average Rentals        {:.1}", metrics.mean_rentals)?;
            writeln!(
                out,
                "Casual vs Registered   {:.1}% : {:.1}%",
                metrics.casual_pct, metrics.registered_pct
            )?;
            writeln!(out, "Records                {}", metrics.rows)?;
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct TrendRow {
    season: Option<&'static str>,
    variable: WeatherVariable,
    rider: Rider,
    points: usize,
    slope: f64,
    intercept: f64,
    r_squared: f64,
}

impl TrendRow {
    fn new(season: Option<Season>, line: &TrendLine) -> Self {
        TrendRow {
            season: season.map(Season::label),
            variable: line.variable,
            rider: line.rider,
            points: line.points,
            slope: line.slope,
            intercept: line.intercept,
            r_squared: line.r_squared,
        }
    }
}

/// Writes fitted trend lines; `season` is `None` for a fit over all rows.
pub fn write_trends(
    out: &mut impl Write,
    lines: &[(Option<Season>, TrendLine)],
    format: OutputFormat,
) -> Result<()> {
    let rows: Vec<TrendRow> = lines.iter().map(|(s, l)| TrendRow::new(*s, l)).collect();

    match format {
        OutputFormat::Json => write_json(out, &rows),
        OutputFormat::Csv => write_csv(out, &rows),
        OutputFormat::Table => {
            if rows.is_empty() {
                writeln!(out, "Not enough distinct points to fit a trend.")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:<8}  {:>8}  {:>12}  {:>12}  {:>6}",
                "Season", "Points", "Slope", "Intercept", "R^2"
            )?;
            for r in &rows {
                writeln!(
                    out,
                    "{:<8}  {:>8}  {:>12.2}  {:>12.2}  {:>6.3}",
                    r.season.unwrap_or("All"),
                    r.points,
                    r.slope,
                    r.intercept,
                    r.r_squared,
                )?;
            }
            Ok(())
        }
    }
}
