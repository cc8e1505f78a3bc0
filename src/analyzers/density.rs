//! Kernel-density outlier filter for one day of readings.
//!
//! A Gaussian kernel density estimate is fitted over the day's weights and
//! evaluated at each weight itself. Readings sitting in a region with density
//! at or below the threshold are discarded as scale noise.

use std::f64::consts::PI;
use tracing::{debug, warn};

use crate::analyzers::utility::{max_value, min_value};
use crate::store::DailyGroup;

/// One-dimensional Gaussian kernel density estimate.
#[derive(Debug, Clone)]
pub struct KernelDensity<'a> {
    samples: &'a [f64],
    bandwidth: f64,
    norm: f64,
}

impl<'a> KernelDensity<'a> {
    /// Returns `None` when there is nothing to estimate from or the
    /// bandwidth is unusable.
    pub fn fit(samples: &'a [f64], bandwidth: f64) -> Option<Self> {
        if samples.is_empty() || !bandwidth.is_finite() || bandwidth <= 0.0 {
            return None;
        }
        let norm = 1.0 / (samples.len() as f64 * bandwidth * (2.0 * PI).sqrt());
        Some(Self {
            samples,
            bandwidth,
            norm,
        })
    }

    /// Estimated probability density at `x`.
    pub fn density_at(&self, x: f64) -> f64 {
        let sum: f64 = self
            .samples
            .iter()
            .map(|&s| {
                let u = (x - s) / self.bandwidth;
                (-0.5 * u * u).exp()
            })
            .sum();
        sum * self.norm
    }
}

/// Keep-flags for `weights`, one per input in the same order.
///
/// Groups of zero or one reading pass through untouched, as do groups with
/// no spread and any input whose densities are not finite.
pub fn keep_flags(weights: &[f64], bandwidth: f64, threshold: f64) -> Vec<bool> {
    if weights.len() <= 1 {
        return vec![true; weights.len()];
    }

    if min_value(weights) == max_value(weights) {
        debug!(count = weights.len(), "Zero-variance group, keeping all readings");
        return vec![true; weights.len()];
    }

    let Some(kde) = KernelDensity::fit(weights, bandwidth) else {
        warn!(bandwidth, "Density estimate unavailable, keeping all readings");
        return vec![true; weights.len()];
    };

    let densities: Vec<f64> = weights.iter().map(|&w| kde.density_at(w)).collect();
    if densities.iter().any(|d| !d.is_finite()) {
        warn!("Non-finite density, keeping all readings");
        return vec![true; weights.len()];
    }

    densities.into_iter().map(|d| d > threshold).collect()
}

/// Drops readings in low-density regions, preserving order.
pub fn filter_group(group: &DailyGroup, bandwidth: f64, threshold: f64) -> DailyGroup {
    let flags = keep_flags(&group.weights(), bandwidth, threshold);
    let observations: Vec<_> = group
        .observations
        .iter()
        .zip(flags)
        .filter_map(|(obs, keep)| keep.then_some(*obs))
        .collect();

    let removed = group.len() - observations.len();
    if removed > 0 {
        debug!(date = %group.date, removed, kept = observations.len(), "Outliers removed");
    }

    DailyGroup {
        date: group.date,
        observations,
    }
}
