//! Parameter sweeps over window, cost and rebalance frequency.
//!
//! Every run owns its own engine state and only reads the shared frame, so
//! runs are executed in parallel with rayon.

use rayon::prelude::*;

use super::aligned::AlignedFrame;
use super::backtest::{run_backtest, RotationConfig};
use super::metrics::PerformanceSummary;
use super::schedule::RebalanceFrequency;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub windows: Vec<usize>,
    pub cost_bps: Vec<f64>,
    pub frequencies: Vec<RebalanceFrequency>,
}

impl SweepGrid {
    /// Varies only the window around the base configuration.
    pub fn windows_only(windows: Vec<usize>, base: &RotationConfig) -> Self {
        SweepGrid {
            windows,
            cost_bps: vec![base.cost_bps],
            frequencies: vec![base.frequency],
        }
    }

    pub fn size(&self) -> usize {
        self.windows.len() * self.cost_bps.len() * self.frequencies.len()
    }

    /// All grid points in window-major order. Zero windows are skipped.
    pub fn generate_configs(&self, base: &RotationConfig) -> Vec<RotationConfig> {
        let mut configs = Vec::with_capacity(self.size());

        for &window in &self.windows {
            if window == 0 {
                continue;
            }
            for &cost_bps in &self.cost_bps {
                for &frequency in &self.frequencies {
                    configs.push(RotationConfig {
                        window,
                        cost_bps,
                        frequency,
                        ..base.clone()
                    });
                }
            }
        }

        configs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub config: RotationConfig,
    pub summary: PerformanceSummary,
}

/// Runs every grid point against `frame`. Outcomes keep grid order.
pub fn run_sweep(
    frame: &AlignedFrame,
    base: &RotationConfig,
    grid: &SweepGrid,
    parallel: bool,
) -> Vec<SweepOutcome> {
    let configs = grid.generate_configs(base);
    tracing::info!(runs = configs.len(), parallel, "starting parameter sweep");

    let evaluate = |config: &RotationConfig| {
        let result = run_backtest(frame, config);
        SweepOutcome {
            summary: PerformanceSummary::from_result(&result, config.risk_free_rate),
            config: config.clone(),
        }
    };

    if parallel {
        configs.par_iter().map(evaluate).collect()
    } else {
        configs.iter().map(evaluate).collect()
    }
}

/// Outcome with the highest Sharpe ratio; runs with an undefined ratio rank last.
pub fn best_by_sharpe(outcomes: &[SweepOutcome]) -> Option<&SweepOutcome> {
    outcomes
        .iter()
        .filter(|o| o.summary.sharpe_ratio.is_some())
        .max_by(|a, b| {
            let sa = a.summary.sharpe_ratio.unwrap_or(f64::NEG_INFINITY);
            let sb = b.summary.sharpe_ratio.unwrap_or(f64::NEG_INFINITY);
            sa.total_cmp(&sb)
        })
}
