//! CSV file price data adapter.
//!
//! Reads `<base>/<asset_id>.csv`. The date and close columns are located by
//! header name, so both plain `date,close` exports and full OHLCV downloads
//! (including vendor headers such as `Adj Close` or `日期`/`收盘`) load.

use crate::domain::error::RotatraderError;
use crate::domain::price::AssetSeries;
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_HEADERS: &[&str] = &["date", "日期", "datetime", "timestamp"];
const CLOSE_HEADERS: &[&str] = &["close", "收盘", "adj close", "adj_close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", asset_id))
    }
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(candidate))
    })
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .ok()
        .or_else(|| {
            value
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

impl PriceDataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        asset_id: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<AssetSeries, RotatraderError> {
        let path = self.csv_path(asset_id);
        let content = fs::read_to_string(&path).map_err(|e| RotatraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| RotatraderError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let date_col = find_column(&headers, DATE_HEADERS).ok_or_else(|| RotatraderError::Data {
            reason: format!("missing date column in {}", path.display()),
        })?;
        let close_col =
            find_column(&headers, CLOSE_HEADERS).ok_or_else(|| RotatraderError::Data {
                reason: format!("missing close column in {}", path.display()),
            })?;

        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| RotatraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default();
            let date = parse_date(date_str).ok_or_else(|| RotatraderError::Data {
                reason: format!("invalid date '{}' in {}", date_str, path.display()),
            })?;

            if date < start_date || end_date.is_some_and(|end| date > end) {
                continue;
            }

            match record
                .get(close_col)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|c| c.is_finite() && *c > 0.0)
            {
                Some(close) => rows.push((date, close)),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(asset = asset_id, "skipped {skipped} rows without a usable close");
        }

        if rows.is_empty() {
            return Err(RotatraderError::NoData {
                asset_id: asset_id.to_string(),
            });
        }

        tracing::debug!(asset = asset_id, rows = rows.len(), "loaded closes");
        Ok(AssetSeries::from_closes(asset_id, rows)?)
    }
}
