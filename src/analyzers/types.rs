//! Data types produced by the weight-curve pipeline.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzers::regression::BreakpointModel;
use crate::dates;
use crate::store::DailyGroup;

/// Sow-only and combined weight extracted from one day of readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySeriesPoint {
    #[serde(with = "dates::date_format")]
    pub date: NaiveDate,
    pub sow_weight: f64,
    /// Usually at least `sow_weight`, but nothing downstream relies on it.
    pub combined_weight: f64,
}

/// Smoothed curves, all parallel to `dates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdjustedWeights {
    #[serde(rename = "datas", with = "dates::date_list_format")]
    pub dates: Vec<NaiveDate>,
    #[serde(rename = "pesosAjustadosPorcas")]
    pub sow: Vec<f64>,
    #[serde(rename = "pesosAjustadosPorcasELeitoes")]
    pub combined: Vec<f64>,
    #[serde(rename = "pesosAjustadosLeitoes")]
    pub offspring: Vec<f64>,
}

impl AdjustedWeights {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Regression models behind the sow and combined curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FittedModels {
    pub sow: BreakpointModel,
    pub combined: BreakpointModel,
}

/// Complete outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub cleaned_data: Vec<DailyGroup>,
    #[serde(rename = "pesosAjustados")]
    pub adjusted: AdjustedWeights,
    /// `None` when no day survived filtering.
    pub models: Option<FittedModels>,
}
