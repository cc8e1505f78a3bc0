//! Run configuration for the weight-curve pipeline.
//!
//! Stored as a plain JSON object on disk. Every field except `segment_count`
//! is optional and falls back to its default; the bin count has no default
//! and must come from the file or the caller:
//! ```json
//! {
//!   "bandwidth": 0.5,
//!   "threshold": 0.01,
//!   "segment_count": 10,
//!   "min_weight": 100.0,
//!   "pre_event_policy": "zero_offspring",
//!   "clean_output": "filtered"
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

pub const DEFAULT_BANDWIDTH: f64 = 0.5;
pub const DEFAULT_THRESHOLD: f64 = 0.01;
pub const DEFAULT_MIN_WEIGHT: f64 = 100.0;

/// How the combined and offspring series are treated on days before the event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PreEventPolicy {
    /// Before the event the combined curve equals the sow curve, so the
    /// offspring weight is exactly zero.
    #[default]
    ZeroOffspring,
    /// Zero the raw combined weights before the event, then regress.
    ZeroCombinedInput,
    /// No zeroing: both curves come straight from their regressions.
    Regress,
}

/// Which observations are reported back as the cleaned dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanOutput {
    #[default]
    Filtered,
    Raw,
}

/// Parameters shared read-only by every stage of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Kernel bandwidth of the density estimate, in weight units.
    pub bandwidth: f64,
    /// Minimum density for an observation to survive outlier filtering.
    pub threshold: f64,
    /// Number of equal-width weight bins per day (the litter size).
    /// Zero means nobody supplied it, which `validate` rejects.
    pub segment_count: usize,
    /// Ingestion floor: lighter readings are not animal weighings.
    pub min_weight: f64,
    pub pre_event_policy: PreEventPolicy,
    pub clean_output: CleanOutput,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bandwidth: DEFAULT_BANDWIDTH,
            threshold: DEFAULT_THRESHOLD,
            segment_count: 0,
            min_weight: DEFAULT_MIN_WEIGHT,
            pre_event_policy: PreEventPolicy::default(),
            clean_output: CleanOutput::default(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration with the given bin count.
    pub fn with_segment_count(segment_count: usize) -> Self {
        Self {
            segment_count,
            ..Default::default()
        }
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file '{path}'"))?;
        Ok(config)
    }

    /// Rejects configurations that would make every day meaningless.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.segment_count < 1 {
            return Err(PipelineError::Configuration(
                "segment count (number of piglets) must be set to at least 1".to_string(),
            ));
        }
        self.validate_filter()
    }

    /// Checks only the outlier-filter and ingestion parameters.
    pub fn validate_filter(&self) -> Result<(), PipelineError> {
        if !self.bandwidth.is_finite() || self.bandwidth <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "bandwidth must be a positive number, got {}",
                self.bandwidth
            )));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(PipelineError::Configuration(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        if !self.min_weight.is_finite() {
            return Err(PipelineError::Configuration(format!(
                "min weight must be finite, got {}",
                self.min_weight
            )));
        }
        Ok(())
    }
}
