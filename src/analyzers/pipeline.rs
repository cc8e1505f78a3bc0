//! Store → outlier filter → segmenter → breakpoint regression.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::analyzers::density::filter_group;
use crate::analyzers::regression::fit_and_predict_from;
use crate::analyzers::segment::segment;
use crate::analyzers::types::{AdjustedWeights, DailySeriesPoint, FittedModels, PipelineResult};
use crate::config::{CleanOutput, PipelineConfig, PreEventPolicy};
use crate::dates::day_offset;
use crate::error::PipelineError;
use crate::store::{DailyGroup, ObservationStore};

/// Outlier-filters every day of the store, in date order.
pub fn clean(store: &ObservationStore, config: &PipelineConfig) -> Vec<DailyGroup> {
    store
        .groups()
        .iter()
        .map(|group| filter_group(group, config.bandwidth, config.threshold))
        .collect()
}

/// One series point per non-empty day; empty days are dropped.
pub fn daily_series(groups: &[DailyGroup], segment_count: usize) -> Vec<DailySeriesPoint> {
    groups
        .iter()
        .filter_map(|group| {
            let Some(weights) = segment(&group.weights(), segment_count) else {
                warn!(date = %group.date, "No readings left for day, dropping it");
                return None;
            };
            debug!(
                date = %group.date,
                sow = weights.sow_weight,
                combined = weights.combined_weight,
                "Day segmented"
            );
            Some(DailySeriesPoint {
                date: group.date,
                sow_weight: weights.sow_weight,
                combined_weight: weights.combined_weight,
            })
        })
        .collect()
}

/// Runs the whole analysis for one farrowing.
///
/// # Errors
///
/// Fails on an invalid configuration, checked before any day is touched, or
/// when the store holds no observations at all.
#[tracing::instrument(skip(store, config), fields(days = store.day_count(), event = %event_date))]
pub fn analyze(
    store: &ObservationStore,
    event_date: NaiveDate,
    config: &PipelineConfig,
) -> Result<PipelineResult, PipelineError> {
    config.validate()?;
    let anchor = store.anchor().ok_or(PipelineError::EmptyInput)?;

    let filtered = clean(store, config);
    let series = daily_series(&filtered, config.segment_count);

    let cleaned_data = match config.clean_output {
        CleanOutput::Filtered => filtered,
        CleanOutput::Raw => store.groups(),
    };

    if series.is_empty() {
        warn!("Every day was dropped, returning empty curves");
        return Ok(PipelineResult {
            cleaned_data,
            adjusted: AdjustedWeights::default(),
            models: None,
        });
    }

    let (adjusted, models) = adjust(anchor, &series, event_date, config.pre_event_policy);

    info!(
        days = adjusted.len(),
        observations = store.observation_count(),
        "Weight curves fitted"
    );

    Ok(PipelineResult {
        cleaned_data,
        adjusted,
        models: Some(models),
    })
}

/// Fits both curves and derives the offspring weight as their difference.
pub fn adjust(
    anchor: NaiveDate,
    series: &[DailySeriesPoint],
    event_date: NaiveDate,
    policy: PreEventPolicy,
) -> (AdjustedWeights, FittedModels) {
    let event_offset = day_offset(anchor, event_date);
    let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
    let pre_event: Vec<bool> = dates
        .iter()
        .map(|&d| day_offset(anchor, d) < event_offset)
        .collect();

    let sow_values: Vec<f64> = series.iter().map(|p| p.sow_weight).collect();
    let combined_values: Vec<f64> = series
        .iter()
        .zip(&pre_event)
        .map(|(p, &before)| {
            if before && policy == PreEventPolicy::ZeroCombinedInput {
                0.0
            } else {
                p.combined_weight
            }
        })
        .collect();

    let sow_fit = fit_and_predict_from(anchor, &dates, &sow_values, event_date);
    let combined_fit = fit_and_predict_from(anchor, &dates, &combined_values, event_date);

    let sow = sow_fit.predictions;
    let combined: Vec<f64> = combined_fit
        .predictions
        .iter()
        .zip(&sow)
        .zip(&pre_event)
        .map(|((&c, &s), &before)| {
            if before && policy == PreEventPolicy::ZeroOffspring {
                s
            } else {
                c
            }
        })
        .collect();
    let offspring = combined.iter().zip(&sow).map(|(c, s)| c - s).collect();

    (
        AdjustedWeights {
            dates,
            sow,
            combined,
            offspring,
        },
        FittedModels {
            sow: sow_fit.model,
            combined: combined_fit.model,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Observation;
    use chrono::{Duration, NaiveTime};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn point(day: i64, sow: f64, combined: f64) -> DailySeriesPoint {
        DailySeriesPoint {
            date: start() + Duration::days(day),
            sow_weight: sow,
            combined_weight: combined,
        }
    }

    fn store_from(days: &[&[f64]]) -> ObservationStore {
        days.iter()
            .enumerate()
            .flat_map(|(i, weights)| {
                let date = start() + Duration::days(i as i64);
                weights
                    .iter()
                    .map(move |&w| Observation::new(date, NaiveTime::MIN, w))
            })
            .collect()
    }

    fn series() -> Vec<DailySeriesPoint> {
        vec![
            point(0, 240.0, 240.5),
            point(1, 241.0, 241.2),
            point(2, 242.0, 242.1),
            point(3, 225.0, 250.0),
            point(4, 224.0, 252.0),
            point(5, 223.0, 255.0),
        ]
    }

    #[test]
    fn test_zero_offspring_policy() {
        let event = start() + Duration::days(2);
        let (adjusted, _) = adjust(start(), &series(), event, PreEventPolicy::ZeroOffspring);

        for i in 0..adjusted.len() {
            assert_eq!(adjusted.offspring[i], adjusted.combined[i] - adjusted.sow[i]);
        }
        assert_eq!(&adjusted.offspring[..2], &[0.0, 0.0]);
        // the event day itself is not forced to zero
        assert_ne!(adjusted.combined[2], adjusted.sow[2]);
    }

    #[test]
    fn test_regress_policy_keeps_regression() {
        let event = start() + Duration::days(2);
        let (adjusted, models) = adjust(start(), &series(), event, PreEventPolicy::Regress);

        let before = models.combined.before.unwrap();
        assert!((adjusted.combined[0] - before.predict(0.0)).abs() < 1e-9);
        assert_ne!(adjusted.offspring[0], 0.0);
    }

    #[test]
    fn test_zero_combined_input_policy() {
        let event = start() + Duration::days(2);
        let (adjusted, models) =
            adjust(start(), &series(), event, PreEventPolicy::ZeroCombinedInput);

        // the pre-event regime is fitted on (0, 0), (1, 0), (2, 242.1)
        let before = models.combined.before.unwrap();
        assert!((before.slope - 121.05).abs() < 1e-9);
        for i in 0..adjusted.len() {
            assert_eq!(adjusted.offspring[i], adjusted.combined[i] - adjusted.sow[i]);
        }
    }

    #[test]
    fn test_models_share_breakpoint() {
        let event = start() + Duration::days(2);
        let (_, models) = adjust(start(), &series(), event, PreEventPolicy::ZeroOffspring);
        assert_eq!(models.sow.breakpoint_date, event);
        assert_eq!(models.combined.breakpoint_date, event);
        assert_eq!(models.sow.anchor_date, start());
    }

    #[test]
    fn test_analyze_rejects_zero_segments() {
        let store = store_from(&[&[200.0, 210.0][..]]);
        let config = PipelineConfig::with_segment_count(0);
        let err = analyze(&store, start(), &config).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_analyze_empty_store() {
        let config = PipelineConfig::with_segment_count(2);
        assert_eq!(
            analyze(&ObservationStore::new(), start(), &config),
            Err(PipelineError::EmptyInput)
        );
    }

    #[test]
    fn test_daily_series_drops_empty_days() {
        let groups = vec![
            DailyGroup {
                date: start(),
                observations: vec![Observation::new(start(), NaiveTime::MIN, 200.0)],
            },
            DailyGroup {
                date: start() + Duration::days(1),
                observations: vec![],
            },
        ];

        let series = daily_series(&groups, 2);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, start());
    }

    #[test]
    fn test_clean_output_raw() {
        let mut day: Vec<f64> = (0..100).map(|i| 200.0 + (i % 4) as f64 * 0.1).collect();
        day.push(290.0);
        let store = store_from(&[&day[..], &[201.0, 201.2][..]]);

        let mut config = PipelineConfig::with_segment_count(2);
        let filtered = analyze(&store, start(), &config).unwrap();
        assert_eq!(filtered.cleaned_data[0].len(), 100);

        config.clean_output = CleanOutput::Raw;
        let raw = analyze(&store, start(), &config).unwrap();
        assert_eq!(raw.cleaned_data[0].len(), 101);
        // curves always come from filtered data
        assert_eq!(raw.adjusted, filtered.adjusted);
    }
}
