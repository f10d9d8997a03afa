//! Performance metrics over an equity curve and its trade log.

use super::backtest::{BacktestResult, EquityCurvePoint, ScheduledTrade};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Daily log-return dispersion below this counts as none.
const FLAT_STDEV: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    /// `None` when volatility is zero.
    pub sharpe_ratio: Option<f64>,
    /// Largest peak-to-trough decline, as a non-positive fraction.
    pub max_drawdown: f64,
    pub turnover: f64,
    pub final_nav: f64,
    pub trade_count: usize,
    pub trading_days: usize,
    pub total_costs: f64,
}

impl PerformanceSummary {
    pub fn compute(
        equity_curve: &[EquityCurvePoint],
        trades: &[ScheduledTrade],
        rebalance_periods: usize,
        risk_free_rate: f64,
    ) -> Self {
        let navs: Vec<f64> = equity_curve.iter().map(|p| p.nav).collect();

        let start_nav = navs.first().copied().unwrap_or(1.0);
        let final_nav = navs.last().copied().unwrap_or(start_nav);
        let growth = if start_nav > 0.0 { final_nav / start_nav } else { 1.0 };
        let total_return = growth - 1.0;

        let periods = navs.len().saturating_sub(1);
        let annualized_return = if periods > 0 && growth > 0.0 {
            growth.powf(TRADING_DAYS_PER_YEAR / periods as f64) - 1.0
        } else {
            0.0
        };

        let annualized_volatility = compute_volatility(&navs);
        let sharpe_ratio = (annualized_volatility > 0.0)
            .then(|| (annualized_return - risk_free_rate) / annualized_volatility);

        let turnover = if rebalance_periods > 0 {
            trades.len() as f64 / rebalance_periods as f64
        } else {
            0.0
        };

        PerformanceSummary {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown: compute_max_drawdown(&navs),
            turnover,
            final_nav,
            trade_count: trades.len(),
            trading_days: navs.len(),
            total_costs: trades.iter().map(|t| t.cost).sum(),
        }
    }

    pub fn from_result(result: &BacktestResult, risk_free_rate: f64) -> Self {
        Self::compute(
            &result.equity_curve,
            &result.trades,
            result.decision_count,
            risk_free_rate,
        )
    }
}

/// min over t of nav[t] / max(nav[..=t]) - 1
fn compute_max_drawdown(navs: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &nav in navs {
        if nav > peak {
            peak = nav;
        }
        if peak > 0.0 {
            let dd = nav / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Sample standard deviation of daily log returns, annualized.
fn compute_volatility(navs: &[f64]) -> f64 {
    let log_returns: Vec<f64> = navs
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect();

    if log_returns.len() < 2 {
        return 0.0;
    }

    let n = log_returns.len() as f64;
    let mean = log_returns.iter().sum::<f64>() / n;
    let variance = log_returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

    let stdev = variance.sqrt();
    // Rounding noise on a constant-rate curve, not dispersion.
    if stdev <= FLAT_STDEV {
        return 0.0;
    }
    stdev * TRADING_DAYS_PER_YEAR.sqrt()
}
