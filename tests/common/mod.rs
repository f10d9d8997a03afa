#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use rotatrader::domain::aligned::{AlignedFrame, AlignedRow};
use rotatrader::domain::backtest::RotationConfig;
use rotatrader::domain::error::RotatraderError;
use rotatrader::domain::momentum::TieBreak;
use rotatrader::domain::price::AssetSeries;
use rotatrader::domain::schedule::RebalanceFrequency;
use rotatrader::ports::data_port::PriceDataPort;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct MockPriceDataPort {
    pub data: HashMap<String, Vec<(NaiveDate, f64)>>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl MockPriceDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_closes(mut self, asset_id: &str, closes: Vec<(NaiveDate, f64)>) -> Self {
        self.data.insert(asset_id.to_string(), closes);
        self
    }

    pub fn with_error(mut self, asset_id: &str, reason: &str) -> Self {
        self.errors.insert(asset_id.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn fetch_closes(
        &self,
        asset_id: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<AssetSeries, RotatraderError> {
        self.requests.borrow_mut().push(asset_id.to_string());
        if let Some(reason) = self.errors.get(asset_id) {
            return Err(RotatraderError::Data {
                reason: reason.clone(),
            });
        }
        let rows: Vec<(NaiveDate, f64)> = self
            .data
            .get(asset_id)
            .map(|rows| {
                rows.iter()
                    .copied()
                    .filter(|(d, _)| *d >= start_date && end_date.is_none_or(|end| *d <= end))
                    .collect()
            })
            .unwrap_or_default();
        if rows.is_empty() {
            return Err(RotatraderError::NoData {
                asset_id: asset_id.to_string(),
            });
        }
        Ok(AssetSeries::from_closes(asset_id, rows)?)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` consecutive weekdays starting at `start` (or the next weekday after it).
pub fn weekdays(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut current = start;
    while dates.len() < n {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current = current.succ_opt().unwrap();
    }
    dates
}

/// Prices compounding at `daily_rate` from `start_price`.
pub fn geometric(start_price: f64, daily_rate: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| start_price * (1.0 + daily_rate).powi(i as i32))
        .collect()
}

pub fn zip_dates(dates: &[NaiveDate], closes: &[f64]) -> Vec<(NaiveDate, f64)> {
    dates.iter().copied().zip(closes.iter().copied()).collect()
}

pub fn make_frame(dates: &[NaiveDate], gold: &[f64], equity: &[f64]) -> AlignedFrame {
    let rows = dates
        .iter()
        .zip(gold.iter().zip(equity.iter()))
        .map(|(&date, (&gold, &equity))| AlignedRow { date, gold, equity })
        .collect();
    AlignedFrame::from_rows("GOLD", "EQUITY", rows)
}

pub fn daily_config(window: usize, cost_bps: f64) -> RotationConfig {
    RotationConfig {
        window,
        frequency: RebalanceFrequency::Daily,
        cost_bps,
        tie_break: TieBreak::PreferHeld,
        gold_asset: "GOLD".to_string(),
        equity_asset: "EQUITY".to_string(),
        start_date: date(2000, 1, 1),
        ..RotationConfig::default()
    }
}

/// Gold rallies for `n / 2` days then sells off; equity does the opposite.
pub fn crossing_market(n: usize) -> (Vec<NaiveDate>, Vec<f64>, Vec<f64>) {
    let dates = weekdays(date(2024, 1, 1), n);
    let half = n / 2;
    let gold = (0..n)
        .map(|i| {
            if i < half {
                100.0 * 1.01f64.powi(i as i32)
            } else {
                100.0 * 1.01f64.powi(half as i32) * 0.99f64.powi((i - half) as i32)
            }
        })
        .collect();
    let equity = (0..n)
        .map(|i| {
            if i < half {
                50.0 * 0.995f64.powi(i as i32)
            } else {
                50.0 * 0.995f64.powi(half as i32) * 1.012f64.powi((i - half) as i32)
            }
        })
        .collect();
    (dates, gold, equity)
}
