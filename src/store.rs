//! Per-day grouping of raw weighings.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dates;

/// A single scale reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(with = "dates::date_format")]
    pub date: NaiveDate,
    #[serde(with = "dates::time_format")]
    pub time: NaiveTime,
    pub weight: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, time: NaiveTime, weight: f64) -> Self {
        Self { date, time, weight }
    }
}

/// All readings of one calendar day, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGroup {
    #[serde(with = "dates::date_format")]
    pub date: NaiveDate,
    pub observations: Vec<Observation>,
}

impl DailyGroup {
    pub fn weights(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.weight).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Observations of one run, keyed by calendar day in ascending order.
///
/// Built once by the ingestion side and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ObservationStore {
    days: BTreeMap<NaiveDate, Vec<Observation>>,
}

impl ObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups observations by date, keeping arrival order within each day.
    pub fn from_observations(observations: impl IntoIterator<Item = Observation>) -> Self {
        let mut days: BTreeMap<NaiveDate, Vec<Observation>> = BTreeMap::new();
        for obs in observations {
            days.entry(obs.date).or_default().push(obs);
        }
        Self { days }
    }

    /// First day present; every day-offset of the run is measured from it.
    pub fn anchor(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn observation_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Daily groups sorted by date.
    pub fn groups(&self) -> Vec<DailyGroup> {
        self.days
            .iter()
            .map(|(date, observations)| DailyGroup {
                date: *date,
                observations: observations.clone(),
            })
            .collect()
    }
}

impl FromIterator<Observation> for ObservationStore {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::from_observations(iter)
    }
}
