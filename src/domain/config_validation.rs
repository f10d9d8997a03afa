//! Configuration validation.
//!
//! Checks every `[rotation]` and `[data]` field before a run starts. The
//! typed getters here are shared with the CLI when it builds the
//! [`RotationConfig`](crate::domain::backtest::RotationConfig).

use crate::domain::aligned::AlignmentPolicy;
use crate::domain::error::RotatraderError;
use crate::domain::momentum::TieBreak;
use crate::domain::schedule::{parse_weekday, RebalanceFrequency};
use crate::ports::config_port::ConfigPort;
use chrono::{NaiveDate, Weekday};
use std::str::FromStr;

pub const ROTATION: &str = "rotation";
pub const DATA: &str = "data";
pub const REPORT: &str = "report";

pub fn validate_rotation_config(config: &dyn ConfigPort) -> Result<(), RotatraderError> {
    validate_window(config)?;
    validate_cost(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_assets(config)?;
    frequency(config)?;
    parsed_or_default::<AlignmentPolicy>(config, "alignment")?;
    parsed_or_default::<TieBreak>(config, "tie_break")?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), RotatraderError> {
    match config.get_string(DATA, "path") {
        Some(_) => Ok(()),
        None => Err(RotatraderError::ConfigMissing {
            section: DATA.to_string(),
            key: "path".to_string(),
        }),
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> RotatraderError {
    RotatraderError::ConfigInvalid {
        section: ROTATION.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), RotatraderError> {
    let value: i64 = number_or(config, "window_length_days", 60)?;
    if value < 1 {
        return Err(invalid(
            "window_length_days",
            "window_length_days must be at least 1",
        ));
    }
    Ok(())
}

fn validate_cost(config: &dyn ConfigPort) -> Result<(), RotatraderError> {
    let value: f64 = number_or(config, "transaction_cost_bps", 5.0)?;
    if !(0.0..10_000.0).contains(&value) {
        return Err(invalid(
            "transaction_cost_bps",
            "transaction_cost_bps must be in [0, 10000)",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), RotatraderError> {
    let value: f64 = number_or(config, "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid("risk_free_rate", "risk_free_rate must be between 0 and 1"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RotatraderError> {
    let start = optional_date(config, "start_date")?;
    let end = optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid("start_date", "start_date must be before end_date"));
        }
    }
    Ok(())
}

fn validate_assets(config: &dyn ConfigPort) -> Result<(), RotatraderError> {
    let gold = config.get_string(ROTATION, "gold_asset");
    let equity = config.get_string(ROTATION, "equity_asset");
    if let (Some(g), Some(e)) = (gold, equity) {
        if g.eq_ignore_ascii_case(&e) {
            return Err(invalid("equity_asset", "gold and equity assets must differ"));
        }
    }
    Ok(())
}

/// `[rotation] key` as a number, or `default` when absent. Text that does
/// not parse is an error rather than the default.
pub fn number_or<T: FromStr>(config: &dyn ConfigPort, key: &str, default: T) -> Result<T, RotatraderError> {
    match config.get_string(ROTATION, key) {
        Some(s) => s
            .trim()
            .parse::<T>()
            .map_err(|_| invalid(key, format!("{key} must be a number, got '{s}'"))),
        None => Ok(default),
    }
}

/// `[rotation] key` as a date, if present.
pub fn optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, RotatraderError> {
    config
        .get_string(ROTATION, key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|_| invalid(key, format!("invalid {key} format, expected YYYY-MM-DD")))
        })
        .transpose()
}

/// `[rotation] key` parsed with `FromStr`, or the type's default when absent.
pub fn parsed_or_default<T>(config: &dyn ConfigPort, key: &str) -> Result<T, RotatraderError>
where
    T: FromStr<Err = String> + Default,
{
    match config.get_string(ROTATION, key) {
        Some(s) => s.parse::<T>().map_err(|reason| invalid(key, reason)),
        None => Ok(T::default()),
    }
}

/// Combines `rebalance_frequency` with the optional `rebalance_anchor` weekday.
pub fn frequency(config: &dyn ConfigPort) -> Result<RebalanceFrequency, RotatraderError> {
    let frequency = parsed_or_default::<RebalanceFrequency>(config, "rebalance_frequency")?;
    let anchor: Option<Weekday> = config
        .get_string(ROTATION, "rebalance_anchor")
        .map(|s| parse_weekday(&s).map_err(|reason| invalid("rebalance_anchor", reason)))
        .transpose()?;

    match (frequency, anchor) {
        (RebalanceFrequency::Weekly(_), Some(day)) => Ok(RebalanceFrequency::Weekly(day)),
        (other, Some(_)) => Err(invalid(
            "rebalance_anchor",
            format!("rebalance_anchor only applies to weekly rebalancing, not {}", other.name()),
        )),
        (other, None) => Ok(other),
    }
}
