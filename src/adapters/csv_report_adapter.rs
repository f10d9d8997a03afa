//! CSV report adapter implementing ReportPort.
//!
//! Writes `equity_curve.csv`, `trades.csv` and `summary.csv` into the output
//! directory, plus `sweep.csv` for parameter sweeps.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RotatraderError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::sweep::SweepOutcome;
use crate::ports::report_port::ReportPort;

pub const EQUITY_CURVE_FILE: &str = "equity_curve.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const SUMMARY_FILE: &str = "summary.csv";
pub const SWEEP_FILE: &str = "sweep.csv";

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

fn report_err(e: impl std::fmt::Display) -> RotatraderError {
    RotatraderError::Report {
        reason: e.to_string(),
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_else(|| "NaN".to_string())
}

/// Metric name/value rows shared by the CSV and console summaries.
pub fn summary_rows(summary: &PerformanceSummary) -> Vec<(&'static str, String)> {
    vec![
        ("total_return", format!("{:.6}", summary.total_return)),
        ("annualized_return", format!("{:.6}", summary.annualized_return)),
        ("annualized_volatility", format!("{:.6}", summary.annualized_volatility)),
        ("sharpe_ratio", format_optional(summary.sharpe_ratio)),
        ("max_drawdown", format!("{:.6}", summary.max_drawdown)),
        ("turnover", format!("{:.6}", summary.turnover)),
        ("final_nav", format!("{:.6}", summary.final_nav)),
        ("trade_count", summary.trade_count.to_string()),
        ("trading_days", summary.trading_days.to_string()),
        ("total_costs", format!("{:.6}", summary.total_costs)),
    ]
}

impl CsvReportAdapter {
    fn write_equity_curve(result: &BacktestResult, path: &Path) -> Result<(), RotatraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(report_err)?;
        wtr.write_record(["date", "nav", "holding"]).map_err(report_err)?;
        for point in &result.equity_curve {
            wtr.write_record([
                point.date.to_string(),
                format!("{:.8}", point.nav),
                point.holding.to_string(),
            ])
            .map_err(report_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), RotatraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(report_err)?;
        wtr.write_record(["decision_date", "execution_date", "from", "to", "cost"])
            .map_err(report_err)?;
        for trade in &result.trades {
            wtr.write_record([
                trade.decision_date.to_string(),
                trade.execution_date.to_string(),
                trade.from.to_string(),
                trade.to.to_string(),
                format!("{:.8}", trade.cost),
            ])
            .map_err(report_err)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_summary(summary: &PerformanceSummary, path: &Path) -> Result<(), RotatraderError> {
        let mut wtr = csv::Writer::from_path(path).map_err(report_err)?;
        wtr.write_record(["metric", "value"]).map_err(report_err)?;
        for (name, value) in summary_rows(summary) {
            wtr.write_record([name, value.as_str()]).map_err(report_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &PerformanceSummary,
        output_dir: &Path,
    ) -> Result<(), RotatraderError> {
        fs::create_dir_all(output_dir)?;
        Self::write_equity_curve(result, &output_dir.join(EQUITY_CURVE_FILE))?;
        Self::write_trades(result, &output_dir.join(TRADES_FILE))?;
        Self::write_summary(summary, &output_dir.join(SUMMARY_FILE))?;
        tracing::info!(dir = %output_dir.display(), "report written");
        Ok(())
    }

    fn write_sweep(
        &self,
        outcomes: &[SweepOutcome],
        output_dir: &Path,
    ) -> Result<(), RotatraderError> {
        fs::create_dir_all(output_dir)?;
        let mut wtr = csv::Writer::from_path(output_dir.join(SWEEP_FILE)).map_err(report_err)?;
        wtr.write_record([
            "window",
            "frequency",
            "cost_bps",
            "total_return",
            "annualized_return",
            "annualized_volatility",
            "sharpe_ratio",
            "max_drawdown",
            "turnover",
        ])
        .map_err(report_err)?;
        for outcome in outcomes {
            let s = &outcome.summary;
            wtr.write_record([
                outcome.config.window.to_string(),
                outcome.config.frequency.to_string(),
                format!("{}", outcome.config.cost_bps),
                format!("{:.6}", s.total_return),
                format!("{:.6}", s.annualized_return),
                format!("{:.6}", s.annualized_volatility),
                format_optional(s.sharpe_ratio),
                format!("{:.6}", s.max_drawdown),
                format!("{:.6}", s.turnover),
            ])
            .map_err(report_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
