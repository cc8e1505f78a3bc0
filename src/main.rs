//! CLI entry point for the sow weight-curve tool.
//!
//! Provides subcommands for running the full farrowing analysis on an
//! exported scale CSV and for producing an outlier-cleaned copy of it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sow_weight_curves::analyzers::pipeline::{analyze, clean};
use sow_weight_curves::config::{CleanOutput, PipelineConfig, PreEventPolicy};
use sow_weight_curves::dates::parse_calendar_date;
use sow_weight_curves::output::{print_json, print_pretty, write_cleaned_csv, write_report, write_series_csv};
use sow_weight_curves::parser::read_observations;
use sow_weight_curves::store::ObservationStore;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sow_weight_curves")]
#[command(about = "Estimate sow and litter weight curves around farrowing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by every subcommand that filters readings.
#[derive(clap::Args)]
struct FilterArgs {
    /// JSON config file; flags below take precedence over it
    #[arg(short, long)]
    config: Option<String>,

    /// Kernel bandwidth of the outlier filter, in weight units
    #[arg(long)]
    bandwidth: Option<f64>,

    /// Minimum density for a reading to be kept
    #[arg(long)]
    threshold: Option<f64>,

    /// Readings lighter than this are ignored
    #[arg(long)]
    min_weight: Option<f64>,
}

impl FilterArgs {
    fn load(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(bandwidth) = self.bandwidth {
            config.bandwidth = bandwidth;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(min_weight) = self.min_weight {
            config.min_weight = min_weight;
        }
        Ok(config)
    }
}

/// Merges `process` flags over the loaded config and validates the result.
fn process_config(
    filter: &FilterArgs,
    piglets: Option<usize>,
    pre_event_policy: Option<PreEventPolicy>,
    raw_clean_data: bool,
) -> Result<PipelineConfig> {
    let mut config = filter.load()?;
    if let Some(piglets) = piglets {
        config.segment_count = piglets;
    }
    if let Some(policy) = pre_event_policy {
        config.pre_event_policy = policy;
    }
    if raw_clean_data {
        config.clean_output = CleanOutput::Raw;
    }
    config.validate()?;
    Ok(config)
}

#[derive(Subcommand)]
enum Commands {
    /// Fit sow, combined and litter weight curves around the farrowing date
    Process {
        /// Scale export (CSV, or gzip-compressed CSV ending in .gz)
        #[arg(value_name = "INPUT")]
        input: String,

        /// Farrowing date, as YYYY-MM-DD or DD/MM/YYYY
        #[arg(short = 'd', long)]
        farrowing_date: String,

        /// Number of piglets, used as the number of weight bins per day.
        /// Required unless the config file sets `segment_count`
        #[arg(short = 'n', long)]
        piglets: Option<usize>,

        /// How curves are treated before farrowing
        #[arg(long, value_enum)]
        pre_event_policy: Option<PreEventPolicy>,

        /// Report the raw readings instead of the filtered ones
        #[arg(long, default_value_t = false)]
        raw_clean_data: bool,

        /// JSON report path (logged when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Gzip compress the JSON report
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Also export the adjusted curves as CSV
        #[arg(long)]
        series_csv: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Remove outlier readings and write the cleaned CSV
    Clean {
        /// Scale export (CSV, or gzip-compressed CSV ending in .gz)
        #[arg(value_name = "INPUT")]
        input: String,

        /// Cleaned CSV to write
        #[arg(short, long, default_value = "cleaned.csv")]
        output: String,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/sow_weight_curves.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sow_weight_curves.log"));

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

    match cli.command {
        Commands::Process {
            input,
            farrowing_date,
            piglets,
            pre_event_policy,
            raw_clean_data,
            output,
            gzip,
            series_csv,
            filter,
        } => {
            // fail on a bad config before reading any data
            let config = process_config(&filter, piglets, pre_event_policy, raw_clean_data)?;

            let event_date = parse_calendar_date(&farrowing_date)
                .context("invalid --farrowing-date")?;

            let store: ObservationStore = read_observations(&input, config.min_weight)?
                .into_iter()
                .collect();
            let result = analyze(&store, event_date, &config)?;
            print_pretty(&result);

            match output {
                Some(path) => {
                    write_report(&path, &result, gzip)?;
                    info!(path = %path, "Report written");
                }
                None => print_json(&result)?,
            }

            if let Some(path) = series_csv {
                write_series_csv(&path, &result.adjusted)?;
                info!(path = %path, days = result.adjusted.len(), "Series CSV written");
            }
        }
        Commands::Clean {
            input,
            output,
            filter,
        } => {
            let config = filter.load()?;
            config.validate_filter()?;

            let store: ObservationStore = read_observations(&input, config.min_weight)?
                .into_iter()
                .collect();
            let cleaned = clean(&store, &config);

            let kept: usize = cleaned.iter().map(|g| g.len()).sum();
            write_cleaned_csv(&output, &cleaned)?;
            info!(
                path = %output,
                days = cleaned.len(),
                kept,
                removed = store.observation_count() - kept,
                "Cleaned readings written"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_args(args: &[&str]) -> Result<PipelineConfig> {
        let cli = Cli::try_parse_from(
            ["sow_weight_curves", "process", "in.csv", "-d", "2024-03-03"]
                .iter()
                .chain(args),
        )?;
        match cli.command {
            Commands::Process {
                piglets,
                pre_event_policy,
                raw_clean_data,
                filter,
                ..
            } => process_config(&filter, piglets, pre_event_policy, raw_clean_data),
            Commands::Clean { .. } => unreachable!("parsed a process command"),
        }
    }

    #[test]
    fn test_process_without_piglets_rejected() {
        let err = process_args(&[]).unwrap_err();
        assert!(format!("{err:#}").contains("piglets"));
    }

    #[test]
    fn test_process_with_piglets() {
        let config = process_args(&["-n", "11", "--pre-event-policy", "regress"]).unwrap();
        assert_eq!(config.segment_count, 11);
        assert_eq!(config.pre_event_policy, PreEventPolicy::Regress);
    }

    #[test]
    fn test_process_piglets_from_config_file() {
        let path = format!("{}/sow_weight_curves_cli.json", std::env::temp_dir().display());
        std::fs::write(&path, r#"{ "segment_count": 9 }"#).unwrap();

        let config = process_args(&["--config", &path]).unwrap();
        assert_eq!(config.segment_count, 9);

        std::fs::remove_file(&path).unwrap();
    }
}
