//! Two-regime linear regression around a known breakpoint date.
//!
//! Days are converted to integer offsets from an anchor date. Days up to and
//! including the breakpoint are fitted by one least-squares line, later days
//! by another, and every day gets the prediction of its own regime.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use crate::analyzers::utility::mean;
use crate::dates::{self, day_offset};

/// Below this the x-spread of a segment is treated as zero.
const DEGENERATE_SPREAD: f64 = 1e-12;

/// A straight line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Ordinary least squares over `(x, y)` pairs.
    ///
    /// One point, or points sharing a single x, give a flat line through the
    /// mean. No points give `None`.
    pub fn ols(xs: &[f64], ys: &[f64]) -> Option<Self> {
        debug_assert_eq!(xs.len(), ys.len());
        if xs.is_empty() {
            return None;
        }

        let mean_x = mean(xs);
        let mean_y = mean(ys);

        let (sxy, sxx) = xs
            .iter()
            .zip(ys)
            .fold((0.0, 0.0), |(sxy, sxx), (&x, &y)| {
                let dx = x - mean_x;
                (sxy + dx * (y - mean_y), sxx + dx * dx)
            });

        if sxx <= DEGENERATE_SPREAD {
            return Some(Self {
                slope: 0.0,
                intercept: mean_y,
            });
        }

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// The two fitted regimes of one series.
///
/// A regime with no days is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointModel {
    #[serde(with = "dates::date_format")]
    pub breakpoint_date: NaiveDate,
    #[serde(with = "dates::date_format")]
    pub anchor_date: NaiveDate,
    pub before: Option<LinearFit>,
    pub after: Option<LinearFit>,
}

impl BreakpointModel {
    pub fn before_slope(&self) -> Option<f64> {
        self.before.map(|f| f.slope)
    }

    pub fn before_intercept(&self) -> Option<f64> {
        self.before.map(|f| f.intercept)
    }

    pub fn after_slope(&self) -> Option<f64> {
        self.after.map(|f| f.slope)
    }

    pub fn after_intercept(&self) -> Option<f64> {
        self.after.map(|f| f.intercept)
    }

    /// Prediction for `date` from the regime it belongs to.
    pub fn predict(&self, date: NaiveDate) -> Option<f64> {
        let x = day_offset(self.anchor_date, date);
        let fit = if x <= day_offset(self.anchor_date, self.breakpoint_date) {
            self.before
        } else {
            self.after
        };
        fit.map(|f| f.predict(x as f64))
    }
}

/// Smoothed series plus the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionOutput {
    pub model: BreakpointModel,
    /// One prediction per input day, in input order.
    pub predictions: Vec<f64>,
}

/// Fits the two regimes with offsets counted from `dates[0]`.
///
/// `dates` must be strictly increasing and parallel to `values`. Returns
/// `None` only when there are no dates at all.
pub fn fit_and_predict(
    dates: &[NaiveDate],
    values: &[f64],
    breakpoint: NaiveDate,
) -> Option<RegressionOutput> {
    let anchor = *dates.first()?;
    Some(fit_and_predict_from(anchor, dates, values, breakpoint))
}

/// Fits the two regimes with offsets counted from `anchor`.
pub fn fit_and_predict_from(
    anchor: NaiveDate,
    dates: &[NaiveDate],
    values: &[f64],
    breakpoint: NaiveDate,
) -> RegressionOutput {
    debug_assert_eq!(dates.len(), values.len());

    let offsets: Vec<f64> = dates
        .iter()
        .map(|&d| day_offset(anchor, d) as f64)
        .collect();
    let breakpoint_offset = day_offset(anchor, breakpoint);

    // dates are sorted, so the regimes are two contiguous slices
    let split = dates
        .iter()
        .filter(|&&d| day_offset(anchor, d) <= breakpoint_offset)
        .count();
    let (x_before, x_after) = offsets.split_at(split);
    let (y_before, y_after) = values.split_at(split);

    let before = LinearFit::ols(x_before, y_before);
    let after = LinearFit::ols(x_after, y_after);

    for (name, xs) in [("before", x_before), ("after", x_after)] {
        if xs.len() == 1 {
            warn!(regime = name, "Single day in regime, using a flat fit");
        }
    }

    let predictions = x_before
        .iter()
        .filter_map(|&x| before.map(|f| f.predict(x)))
        .chain(x_after.iter().filter_map(|&x| after.map(|f| f.predict(x))))
        .collect();

    RegressionOutput {
        model: BreakpointModel {
            breakpoint_date: breakpoint,
            anchor_date: anchor,
            before,
            after,
        },
        predictions,
    }
}
