//! Report persistence port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RotatraderError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::sweep::SweepOutcome;

/// Port for writing backtest artifacts.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &PerformanceSummary,
        output_dir: &Path,
    ) -> Result<(), RotatraderError>;

    /// One row per swept configuration, in grid order.
    fn write_sweep(
        &self,
        outcomes: &[SweepOutcome],
        output_dir: &Path,
    ) -> Result<(), RotatraderError>;
}
