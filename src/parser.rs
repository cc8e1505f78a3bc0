//! CSV parser for exported scale readings.
//!
//! Expects a header row with the columns `Data`, `Horário` and `Peso`
//! (`date`, `time` and `weight` are accepted too). Files ending in `.gz` are
//! decompressed on the fly.

use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::dates::{parse_calendar_date, parse_time_of_day};
use crate::store::Observation;

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Data", alias = "date")]
    date: String,
    #[serde(rename = "Horário", alias = "Horario", alias = "time", default)]
    time: Option<String>,
    #[serde(rename = "Peso", alias = "weight")]
    weight: String,
}

/// Decodes weighings from CSV text, dropping rows lighter than `min_weight`.
///
/// # Errors
///
/// Returns an error naming the offending line if a row is malformed or its
/// date, time or weight cannot be read.
pub fn parse_observations<R: Read>(reader: R, min_weight: f64) -> Result<Vec<Observation>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut observations = Vec::new();
    let mut below_floor = 0usize;

    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        let row = result.with_context(|| format!("malformed CSV row at line {line}"))?;

        let date = parse_calendar_date(&row.date).with_context(|| format!("line {line}"))?;
        let time = parse_time_of_day(row.time.as_deref().unwrap_or(""))
            .with_context(|| format!("line {line}"))?;
        let weight = parse_weight(&row.weight).with_context(|| format!("line {line}"))?;

        if !weight.is_finite() {
            warn!(line, "Non-finite weight skipped");
            continue;
        }
        if weight < min_weight {
            below_floor += 1;
            continue;
        }

        observations.push(Observation::new(date, time, weight));
    }

    debug!(kept = observations.len(), below_floor, min_weight, "CSV decoded");
    Ok(observations)
}

/// Reads weighings from a CSV file, or a gzip-compressed one ending in `.gz`.
#[tracing::instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn read_observations(path: impl AsRef<Path>, min_weight: f64) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;

    let observations = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        parse_observations(GzDecoder::new(file), min_weight)?
    } else {
        parse_observations(file, min_weight)?
    };

    info!(count = observations.len(), "Observations loaded");
    Ok(observations)
}

/// Accepts both `212.5` and the comma-decimal `212,5`.
fn parse_weight(raw: &str) -> Result<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .map_err(|_| anyhow!("invalid weight '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_parse_portuguese_headers() {
        let csv = "Data,Horário,Peso\n05/03/2024,08:00:00,210.5\n05/03/2024,0.5,230\n";
        let observations = parse_observations(csv.as_bytes(), 100.0).unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(observations[0].weight, 210.5);
        assert_eq!(observations[1].time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_english_headers_without_time() {
        let csv = "date,weight\n2024-03-05,\"199,5\"\n";
        let observations = parse_observations(csv.as_bytes(), 100.0).unwrap();

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].time, NaiveTime::MIN);
        assert_eq!(observations[0].weight, 199.5);
    }

    #[test]
    fn test_weight_floor_applied() {
        let csv = "Data,Horário,Peso\n05/03/2024,08:00:00,99.9\n05/03/2024,08:01:00,100\n";
        let observations = parse_observations(csv.as_bytes(), 100.0).unwrap();

        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].weight, 100.0);
    }

    #[test]
    fn test_bad_date_reports_line() {
        let csv = "Data,Horário,Peso\n05/03/2024,08:00:00,210\nnot-a-date,08:00:00,210\n";
        let err = parse_observations(csv.as_bytes(), 100.0).unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
    }

    #[test]
    fn test_bad_weight_is_error() {
        let csv = "Data,Horário,Peso\n05/03/2024,08:00:00,heavy\n";
        assert!(parse_observations(csv.as_bytes(), 100.0).is_err());
    }

    #[test]
    fn test_read_gzip_file() {
        let path = format!("{}/sow_weight_curves_test.csv.gz", std::env::temp_dir().display());
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"Data,Horario,Peso\n05/03/2024,08:00:00,210\n")
            .unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let observations = read_observations(&path, 100.0).unwrap();
        assert_eq!(observations.len(), 1);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_observations("/nonexistent/weights.csv", 100.0).is_err());
    }
}
