//! Output formatting and persistence for pipeline results.
//!
//! Supports pretty-printing, the JSON report (optionally gzip-compressed),
//! and CSV export of the adjusted curves and of the cleaned readings.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

use crate::analyzers::types::{AdjustedWeights, PipelineResult};
use crate::dates::{DATE_FORMAT, TIME_FORMAT};
use crate::store::DailyGroup;

/// Response envelope of a successful run.
#[derive(Serialize)]
pub struct Report<'a> {
    pub status: &'static str,
    #[serde(flatten)]
    pub result: &'a PipelineResult,
}

impl<'a> Report<'a> {
    pub fn success(result: &'a PipelineResult) -> Self {
        Self {
            status: "success",
            result,
        }
    }
}

#[derive(Serialize)]
struct SeriesRow {
    date: String,
    sow: f64,
    combined: f64,
    offspring: f64,
}

#[derive(Serialize)]
struct CleanedRow {
    date: String,
    time: String,
    weight: f64,
}

/// Logs a result using Rust's debug pretty-print format.
pub fn print_pretty(result: &PipelineResult) {
    debug!("{:#?}", result);
}

/// Logs the report as pretty-printed JSON.
pub fn print_json(result: &PipelineResult) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(&Report::success(result))?);
    Ok(())
}

/// Writes the JSON report to `path`, gzip-compressed when `gzip` is set.
pub fn write_report(path: &str, result: &PipelineResult, gzip: bool) -> Result<()> {
    let body = serde_json::to_vec_pretty(&Report::success(result))?;

    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        encoder.finish()?
    } else {
        body
    };

    std::fs::write(path, body).with_context(|| format!("failed to write report '{path}'"))?;
    debug!(path, gzip, "Report written");
    Ok(())
}

/// Writes the adjusted curves as CSV, one row per day.
pub fn write_series_csv(path: &str, adjusted: &AdjustedWeights) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;
    let mut writer = WriterBuilder::new().from_writer(file);

    for (i, date) in adjusted.dates.iter().enumerate() {
        writer.serialize(SeriesRow {
            date: date.format(DATE_FORMAT).to_string(),
            sow: adjusted.sow[i],
            combined: adjusted.combined[i],
            offspring: adjusted.offspring[i],
        })?;
    }
    writer.flush()?;

    debug!(path, rows = adjusted.len(), "Series CSV written");
    Ok(())
}

/// Writes cleaned readings as CSV in the same column layout the parser reads.
pub fn write_cleaned_csv(path: &str, groups: &[DailyGroup]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create '{path}'"))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(["Data", "Horário", "Peso"])?;

    let mut rows = 0usize;
    for obs in groups.iter().flat_map(|g| &g.observations) {
        writer.serialize(CleanedRow {
            date: obs.date.format(DATE_FORMAT).to_string(),
            time: obs.time.format(TIME_FORMAT).to_string(),
            weight: obs.weight,
        })?;
        rows += 1;
    }
    writer.flush()?;

    debug!(path, rows, "Cleaned CSV written");
    Ok(())
}
