//! Error types for the weight-curve pipeline.

/// Structural failures that abort a whole run.
///
/// Per-day anomalies (an empty day, a regression segment with fewer than two
/// points) are absorbed by the pipeline and never surface here.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No observations to analyze")]
    EmptyInput,
}
