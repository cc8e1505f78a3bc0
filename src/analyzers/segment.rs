//! Daily weight segmentation.
//!
//! A day's range of readings is cut into `segment_count` equal-width bins.
//! The heaviest reading in the lowest bin is taken as the sow alone, the
//! heaviest reading of the whole day as the sow weighed with her litter.

use crate::analyzers::utility::{max_value, min_value};

/// The two scalars extracted from one day of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyWeights {
    pub sow_weight: f64,
    pub combined_weight: f64,
}

/// `segment_count + 1` evenly spaced boundaries from `min` to `max` inclusive.
pub fn bin_boundaries(min: f64, max: f64, segment_count: usize) -> Vec<f64> {
    (0..=segment_count)
        .map(|i| min + (max - min) * i as f64 / segment_count as f64)
        .collect()
}

/// Index of the bin holding `weight`.
///
/// Bins are half-open `[b_i, b_{i+1})` except the last, which also holds the
/// top boundary.
pub fn bin_index(boundaries: &[f64], weight: f64) -> usize {
    let bins = boundaries.len().saturating_sub(1);
    if bins <= 1 {
        return 0;
    }
    boundaries[1..bins].partition_point(|&b| b <= weight)
}

/// Splits one day's weights into sow-only and combined weights.
///
/// Returns `None` for an empty day, which is then left out of every series.
/// `segment_count` must be at least 1.
pub fn segment(weights: &[f64], segment_count: usize) -> Option<DailyWeights> {
    let min = min_value(weights)?;
    let max = max_value(weights)?;

    if max == min {
        return Some(DailyWeights {
            sow_weight: min,
            combined_weight: max,
        });
    }

    let boundaries = bin_boundaries(min, max, segment_count.max(1));
    let sow_weight = weights
        .iter()
        .copied()
        .filter(|&w| bin_index(&boundaries, w) == 0)
        .reduce(f64::max)
        // rounding can push the minimum past the first inner boundary
        .unwrap_or(min);

    Some(DailyWeights {
        sow_weight,
        combined_weight: max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_boundaries_three_bins() {
        let b = bin_boundaries(100.0, 300.0, 3);
        assert_eq!(b.len(), 4);
        assert_close(b[0], 100.0);
        assert_close(b[1], 166.666_666_666_666_67);
        assert_close(b[2], 233.333_333_333_333_3);
        assert_close(b[3], 300.0);
    }

    #[test]
    fn test_bin_index_half_open() {
        let b = bin_boundaries(100.0, 300.0, 2);
        assert_eq!(bin_index(&b, 100.0), 0);
        assert_eq!(bin_index(&b, 199.9), 0);
        assert_eq!(bin_index(&b, 200.0), 1);
        // top edge belongs to the last bin
        assert_eq!(bin_index(&b, 300.0), 1);
    }

    #[test]
    fn test_single_bin_holds_everything() {
        let b = bin_boundaries(100.0, 300.0, 1);
        assert_eq!(bin_index(&b, 100.0), 0);
        assert_eq!(bin_index(&b, 300.0), 0);
        let w = segment(&[100.0, 250.0, 300.0], 1).unwrap();
        assert_eq!(w.sow_weight, 300.0);
        assert_eq!(w.combined_weight, 300.0);
    }

    #[test]
    fn test_segment_reference_day() {
        let w = segment(&[100.0, 100.0, 100.0, 200.0, 200.0, 300.0], 3).unwrap();
        assert_eq!(w.sow_weight, 100.0);
        assert_eq!(w.combined_weight, 300.0);
    }

    #[test]
    fn test_segment_lowest_bin_max() {
        let w = segment(&[200.0, 210.0, 205.0, 240.0, 260.0], 2).unwrap();
        // bins: [200, 230) and [230, 260]
        assert_eq!(w.sow_weight, 210.0);
        assert_eq!(w.combined_weight, 260.0);
    }

    #[test]
    fn test_segment_all_equal() {
        for count in [1, 2, 5, 12] {
            let w = segment(&[150.0, 150.0, 150.0], count).unwrap();
            assert_eq!(w.sow_weight, 150.0);
            assert_eq!(w.combined_weight, 150.0);
        }
    }

    #[test]
    fn test_segment_empty_day() {
        assert_eq!(segment(&[], 3), None);
    }

    #[test]
    fn test_segment_order_independent() {
        let a = segment(&[300.0, 100.0, 200.0, 100.0], 3).unwrap();
        let b = segment(&[100.0, 100.0, 200.0, 300.0], 3).unwrap();
        assert_eq!(a, b);
    }
}
