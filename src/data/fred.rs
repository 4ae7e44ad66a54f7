//! FRED API integration for the treasury yield and recession series.
//!
//! `yc fetch` downloads DGS10, DGS2 and USREC and writes them in the same CSV
//! layout FRED uses for manual downloads, so the analysis reads either source.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{FetchConfig, SeriesCode};
use crate::error::{AppError, ErrorKind};
use crate::io::export::StagedFiles;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
/// FRED's per-request maximum; daily yields since 1962 fit comfortably.
const OBS_LIMIT: usize = 100_000;

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::new(ErrorKind::Fetch, "Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Fetch all observations for one series, ascending by date.
    pub fn fetch_series(&self, code: SeriesCode, start: Option<NaiveDate>) -> Result<Vec<Observation>, AppError> {
        let limit = OBS_LIMIT.to_string();
        let mut req = self.client.get(BASE_URL).query(&[
            ("series_id", code.code()),
            ("api_key", self.api_key.as_str()),
            ("file_type", "json"),
            ("sort_order", "asc"),
            ("limit", limit.as_str()),
        ]);

        if let Some(date) = start {
            req = req.query(&[("observation_start", date.to_string())]);
        }

        let resp = req
            .send()
            .map_err(|e| AppError::new(ErrorKind::Fetch, format!("FRED request for {code} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                ErrorKind::Fetch,
                format!("FRED request for {code} failed with status {}.", resp.status()),
            ));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::new(ErrorKind::Fetch, format!("Failed to parse FRED response for {code}: {e}")))?;

        tracing::info!(series = code.code(), observations = body.observations.len(), "fetched FRED series");
        Ok(body.observations)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub date: String,
    pub value: String,
}

/// Download the three series into `config.dir`. Returns the written paths.
///
/// All three downloads must succeed before any file is written, and the
/// files replace existing ones together or not at all.
pub fn fetch_inputs(config: &FetchConfig) -> Result<Vec<PathBuf>, AppError> {
    let client = FredClient::from_env()?;

    let mut rendered = Vec::with_capacity(SeriesCode::ALL.len());
    for code in SeriesCode::ALL {
        let observations = client.fetch_series(code, config.observation_start)?;
        if observations.is_empty() {
            return Err(AppError::new(
                ErrorKind::Fetch,
                format!("No observations returned for series {code}."),
            ));
        }
        rendered.push((code.default_file_name(), render_fred_csv(code, &observations)?));
    }

    write_fetched(&config.dir, &rendered)
}

fn write_fetched(dir: &Path, rendered: &[(&str, Vec<u8>)]) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(ErrorKind::Fetch, format!("Failed to create '{}': {e}", dir.display())))?;

    let mut staged = StagedFiles::new(ErrorKind::Fetch);
    for (name, bytes) in rendered {
        staged.stage(&dir.join(name), bytes)?;
    }
    let paths = staged.commit()?;
    tracing::info!(dir = %dir.display(), files = paths.len(), "wrote FRED series");
    Ok(paths)
}

/// Render observations as `observation_date,<CODE>` CSV.
///
/// FRED's `.` placeholder becomes an empty cell, matching its CSV downloads.
pub fn render_fred_csv(code: SeriesCode, observations: &[Observation]) -> Result<Vec<u8>, AppError> {
    let err = |e: csv::Error| AppError::new(ErrorKind::Fetch, format!("Failed to render {code} CSV: {e}"));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["observation_date", code.code()]).map_err(err)?;
    for obs in observations {
        NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| AppError::new(ErrorKind::Fetch, format!("Invalid FRED date '{}': {e}", obs.date)))?;
        let value = obs.value.trim();
        let value = if value == "." { "" } else { value };
        writer.write_record([obs.date.as_str(), value]).map_err(err)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::new(ErrorKind::Fetch, format!("Failed to flush {code} CSV: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::read_series;

    fn obs(date: &str, value: &str) -> Observation {
        Observation {
            date: date.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn placeholder_values_become_empty_cells() {
        let bytes = render_fred_csv(
            SeriesCode::Dgs10,
            &[obs("2024-01-01", "."), obs("2024-01-02", "3.95")],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "observation_date,DGS10\n2024-01-01,\n2024-01-02,3.95\n"
        );
    }

    #[test]
    fn rendered_csv_is_readable_by_ingest() {
        let bytes = render_fred_csv(
            SeriesCode::Usrec,
            &[obs("2020-01-01", "0"), obs("2020-02-01", "0"), obs("2020-03-01", "1")],
        )
        .unwrap();
        let series = read_series(bytes.as_slice(), SeriesCode::Usrec, "fred").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.points[2].1, 1.0);
    }

    #[test]
    fn invalid_dates_are_rejected() {
        let err = render_fred_csv(SeriesCode::Dgs2, &[obs("01/02/2024", "4.1")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn failed_write_keeps_earlier_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("DGS10.csv"), "previous").unwrap();
        fs::create_dir(dir.path().join("DGS2.csv.tmp")).unwrap();
        let rendered = [("DGS10.csv", b"new".to_vec()), ("DGS2.csv", b"new".to_vec())];

        let err = write_fetched(dir.path(), &rendered).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(fs::read_to_string(dir.path().join("DGS10.csv")).unwrap(), "previous");
        assert!(!dir.path().join("DGS10.csv.tmp").exists());
    }

    #[test]
    fn fetched_files_land_in_the_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data");
        let rendered = [("USREC.csv", b"observation_date,USREC\n".to_vec())];

        let paths = write_fetched(&target, &rendered).unwrap();
        assert_eq!(paths, vec![target.join("USREC.csv")]);
        assert!(!target.join("USREC.csv.tmp").exists());
    }
}
