//! Core domain types and logic.

pub mod price;
pub mod aligned;
pub mod position;
pub mod momentum;
pub mod schedule;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
