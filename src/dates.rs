//! Calendar normalization for spreadsheet-exported weighings.
//!
//! Dates arrive as `DD/MM/YYYY` or ISO `YYYY-MM-DD`; times of day as
//! `HH:mm:ss`, `HH:mm`, or a spreadsheet day fraction (`0.5` is noon).

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveTime};

/// Canonical display format for calendar dates.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Canonical display format for times of day.
pub const TIME_FORMAT: &str = "%H:%M:%S";

const SECONDS_PER_DAY: u32 = 86_400;

/// Parses a calendar date in either `DD/MM/YYYY` or `YYYY-MM-DD` form.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| anyhow!("unrecognized date '{raw}', expected DD/MM/YYYY or YYYY-MM-DD"))
}

/// Parses a time of day. Empty input means midnight.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(NaiveTime::MIN);
    }

    if let Ok(time) = NaiveTime::parse_from_str(raw, TIME_FORMAT) {
        return Ok(time);
    }
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M") {
        return Ok(time);
    }

    let fraction: f64 = raw
        .parse()
        .map_err(|_| anyhow!("unrecognized time '{raw}', expected HH:mm:ss or a day fraction"))?;
    time_from_day_fraction(fraction)
}

/// Converts a spreadsheet day fraction into a time of day.
///
/// Hours and minutes are truncated, seconds rounded. Any integral day part
/// is ignored.
pub fn time_from_day_fraction(fraction: f64) -> Result<NaiveTime> {
    if !fraction.is_finite() || fraction < 0.0 {
        return Err(anyhow!("invalid day fraction {fraction}"));
    }

    let hours_f = fraction.fract() * 24.0;
    let hours = hours_f.floor();
    let minutes_f = (hours_f - hours) * 60.0;
    let minutes = minutes_f.floor();
    let seconds = ((minutes_f - minutes) * 60.0).round();

    let total = (hours as u32 * 3600 + minutes as u32 * 60 + seconds as u32) % SECONDS_PER_DAY;
    NaiveTime::from_num_seconds_from_midnight_opt(total, 0)
        .ok_or_else(|| anyhow!("day fraction {fraction} is out of range"))
}

/// Whole calendar days from `anchor` to `date` (negative when `date` is earlier).
pub fn day_offset(anchor: NaiveDate, date: NaiveDate) -> i64 {
    (date - anchor).num_days()
}

/// Serde adapter writing dates as `DD/MM/YYYY`.
pub mod date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for a list of dates written as `DD/MM/YYYY`.
pub mod date_list_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dates: &[NaiveDate], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(dates.len()))?;
        for date in dates {
            seq.serialize_element(&date.format(DATE_FORMAT).to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<NaiveDate>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| super::parse_calendar_date(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serde adapter writing times of day as `HH:mm:ss`.
pub mod time_format {
    use super::TIME_FORMAT;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}
