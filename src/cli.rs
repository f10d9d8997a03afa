//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_execution::PaperExecutionAdapter;
use crate::domain::aligned::AlignedFrame;
use crate::domain::backtest::{self as backtest_engine, BacktestResult, RotationConfig};
use crate::domain::config_validation::{
    frequency, optional_date, parsed_or_default, validate_data_config,
    validate_rotation_config, DATA, REPORT, ROTATION,
};
use crate::domain::error::RotatraderError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::momentum::{self, MomentumSignal};
use crate::domain::position::Holding;
use crate::domain::schedule::{self, RebalanceFrequency};
use crate::domain::sweep::{self, SweepGrid, SweepOutcome};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::execution_port::ExecutionPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Parser, Debug)]
#[command(name = "rotatrader", about = "Gold/equity momentum rotation backtester")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest and write the report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override window_length_days
        #[arg(long)]
        window: Option<usize>,
        /// Override transaction_cost_bps
        #[arg(long)]
        cost_bps: Option<f64>,
        /// Override rebalance_frequency (daily, weekly, weekly:<day>, monthly)
        #[arg(long)]
        frequency: Option<String>,
    },
    /// Run a parameter sweep over windows, costs and frequencies
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_delimiter = ',')]
        windows: Vec<usize>,
        #[arg(long, value_delimiter = ',')]
        costs: Vec<f64>,
        #[arg(long, value_delimiter = ',')]
        frequencies: Vec<String>,
        /// Run grid points one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },
    /// Validate a rotation configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Compute the latest target and submit it to the paper execution adapter
    Signal {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            output,
            window,
            cost_bps,
            frequency,
        } => run_backtest(
            &config,
            output.as_deref(),
            Overrides {
                window,
                cost_bps,
                frequency,
            },
        ),
        Command::Sweep {
            config,
            output,
            windows,
            costs,
            frequencies,
            sequential,
        } => run_sweep(
            &config,
            output.as_deref(),
            &windows,
            &costs,
            &frequencies,
            !sequential,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Signal { config } => run_signal(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Command-line values that take precedence over the `[rotation]` section.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub window: Option<usize>,
    pub cost_bps: Option<f64>,
    pub frequency: Option<String>,
}

fn cli_invalid(key: &str, reason: impl Into<String>) -> RotatraderError {
    RotatraderError::ConfigInvalid {
        section: "cli".into(),
        key: key.into(),
        reason: reason.into(),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RotatraderError> {
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

pub fn build_rotation_config(adapter: &dyn ConfigPort) -> Result<RotationConfig, RotatraderError> {
    validate_rotation_config(adapter)?;
    let defaults = RotationConfig::default();

    Ok(RotationConfig {
        window: adapter.get_int(ROTATION, "window_length_days", defaults.window as i64) as usize,
        frequency: frequency(adapter)?,
        cost_bps: adapter.get_double(ROTATION, "transaction_cost_bps", defaults.cost_bps),
        tie_break: parsed_or_default(adapter, "tie_break")?,
        alignment: parsed_or_default(adapter, "alignment")?,
        start_date: optional_date(adapter, "start_date")?.unwrap_or(defaults.start_date),
        end_date: optional_date(adapter, "end_date")?,
        gold_asset: adapter
            .get_string(ROTATION, "gold_asset")
            .unwrap_or(defaults.gold_asset),
        equity_asset: adapter
            .get_string(ROTATION, "equity_asset")
            .unwrap_or(defaults.equity_asset),
        risk_free_rate: adapter.get_double(ROTATION, "risk_free_rate", defaults.risk_free_rate),
    })
}

pub fn apply_overrides(
    mut config: RotationConfig,
    overrides: &Overrides,
) -> Result<RotationConfig, RotatraderError> {
    if let Some(window) = overrides.window {
        if window == 0 {
            return Err(cli_invalid("window", "window must be at least 1"));
        }
        config.window = window;
    }
    if let Some(cost) = overrides.cost_bps {
        if !(0.0..10_000.0).contains(&cost) {
            return Err(cli_invalid("cost_bps", "cost_bps must be in [0, 10000)"));
        }
        config.cost_bps = cost;
    }
    if let Some(freq) = &overrides.frequency {
        config.frequency = freq
            .parse::<RebalanceFrequency>()
            .map_err(|reason| cli_invalid("frequency", reason))?;
    }
    Ok(config)
}

pub fn build_sweep_grid(
    base: &RotationConfig,
    windows: &[usize],
    costs: &[f64],
    frequencies: &[String],
) -> Result<SweepGrid, RotatraderError> {
    let frequencies = frequencies
        .iter()
        .map(|f| {
            f.parse::<RebalanceFrequency>()
                .map_err(|reason| cli_invalid("frequencies", reason))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(cost) = costs.iter().find(|c| !(0.0..10_000.0).contains(*c)) {
        return Err(cli_invalid("costs", format!("cost {cost} outside [0, 10000)")));
    }

    let mut grid = SweepGrid::windows_only(windows.to_vec(), base);
    if grid.windows.is_empty() {
        grid.windows = vec![base.window];
    }
    if !costs.is_empty() {
        grid.cost_bps = costs.to_vec();
    }
    if !frequencies.is_empty() {
        grid.frequencies = frequencies;
    }
    Ok(grid)
}

pub fn data_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, RotatraderError> {
    validate_data_config(adapter)?;
    let path = adapter
        .get_string(DATA, "path")
        .ok_or_else(|| RotatraderError::ConfigMissing {
            section: DATA.into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path)))
}

pub fn resolve_output_dir(output: Option<&Path>, adapter: &dyn ConfigPort) -> PathBuf {
    match output {
        Some(p) => p.to_path_buf(),
        None => adapter
            .get_string(REPORT, "output_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
    }
}

/// Fetches both legs and aligns them onto one calendar.
pub fn load_frame(
    data_port: &dyn PriceDataPort,
    config: &RotationConfig,
) -> Result<AlignedFrame, RotatraderError> {
    let gold = data_port.fetch_closes(&config.gold_asset, config.start_date, config.end_date)?;
    let equity =
        data_port.fetch_closes(&config.equity_asset, config.start_date, config.end_date)?;

    tracing::info!(
        gold = %config.gold_asset,
        gold_rows = gold.len(),
        equity = %config.equity_asset,
        equity_rows = equity.len(),
        "loaded price series"
    );

    let frame = AlignedFrame::align(&gold, &equity, config.alignment);
    if frame.is_empty() {
        tracing::warn!(policy = %config.alignment, "series share no dates");
    }
    Ok(frame)
}

pub fn run_backtest_pipeline(
    data_port: &dyn PriceDataPort,
    report_port: &dyn ReportPort,
    config: &RotationConfig,
    output_dir: &Path,
) -> Result<(BacktestResult, PerformanceSummary), RotatraderError> {
    let frame = load_frame(data_port, config)?;

    tracing::info!(
        rows = frame.len(),
        window = config.window,
        frequency = %config.frequency,
        cost_bps = config.cost_bps,
        "running backtest"
    );
    let result = backtest_engine::run_backtest(&frame, config);
    let summary = PerformanceSummary::from_result(&result, config.risk_free_rate);

    print_summary(config, &result, &summary);

    report_port.write(&result, &summary, output_dir)?;
    eprintln!("\nReport written to: {}", output_dir.display());
    Ok((result, summary))
}

pub fn run_sweep_pipeline(
    data_port: &dyn PriceDataPort,
    report_port: &dyn ReportPort,
    base: &RotationConfig,
    grid: &SweepGrid,
    parallel: bool,
    output_dir: &Path,
) -> Result<Vec<SweepOutcome>, RotatraderError> {
    let frame = load_frame(data_port, base)?;
    let outcomes = sweep::run_sweep(&frame, base, grid, parallel);

    eprintln!("\n=== Sweep Results ({} runs) ===", outcomes.len());
    eprintln!(
        "  {:>6}  {:<14} {:>8}  {:>9}  {:>7}  {:>8}",
        "window", "frequency", "cost", "return", "sharpe", "max dd"
    );
    for outcome in &outcomes {
        let s = &outcome.summary;
        eprintln!(
            "  {:>6}  {:<14} {:>8.1}  {:>8.2}%  {:>7}  {:>7.2}%",
            outcome.config.window,
            outcome.config.frequency.to_string(),
            outcome.config.cost_bps,
            s.total_return * 100.0,
            format_sharpe(s.sharpe_ratio),
            s.max_drawdown * 100.0,
        );
    }

    if let Some(best) = sweep::best_by_sharpe(&outcomes) {
        eprintln!(
            "\nBest Sharpe: window={} frequency={} cost={} ({})",
            best.config.window,
            best.config.frequency,
            best.config.cost_bps,
            format_sharpe(best.summary.sharpe_ratio),
        );
    }

    report_port.write_sweep(&outcomes, output_dir)?;
    eprintln!("\nSweep written to: {}", output_dir.display());
    Ok(outcomes)
}

/// Signal at the last decision whose rebalance period has closed.
pub fn latest_signal(frame: &AlignedFrame, config: &RotationConfig) -> Option<MomentumSignal> {
    let result = backtest_engine::run_backtest(frame, config);
    signal_for(frame, config, &result)
}

/// Same as [`latest_signal`] against an already computed backtest; ties break
/// toward what `result` held on the decision row.
pub fn signal_for(
    frame: &AlignedFrame,
    config: &RotationConfig,
    result: &BacktestResult,
) -> Option<MomentumSignal> {
    let decision = schedule::last_closed_decision(&frame.dates(), config.frequency)?;
    let held = result.equity_curve.get(decision)?.holding;
    momentum::signal_at(frame, decision, config.window, held, config.tie_break)
}

/// Submits a full-weight target, or a flat book for cash.
pub fn submit_target(
    execution: &mut dyn ExecutionPort,
    target: Holding,
) -> Result<(), RotatraderError> {
    let weight = if target.is_risky() { 1.0 } else { 0.0 };
    execution.submit_target_position(target, weight)
}

fn format_sharpe(sharpe: Option<f64>) -> String {
    sharpe
        .map(|s| format!("{s:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_summary(config: &RotationConfig, result: &BacktestResult, summary: &PerformanceSummary) {
    eprintln!("\n=== Rotation Results ===");
    eprintln!("Assets:           {} / {}", config.gold_asset, config.equity_asset);
    eprintln!("Window:           {} days", config.window);
    eprintln!("Rebalance:        {}", config.frequency);
    eprintln!("Cost:             {:.1} bps", config.cost_bps);
    eprintln!("Trading Days:     {}", summary.trading_days);
    eprintln!("Total Return:     {:.2}%", summary.total_return * 100.0);
    eprintln!(
        "Annualized:       {:.2}%",
        summary.annualized_return * 100.0
    );
    eprintln!(
        "Volatility:       {:.2}%",
        summary.annualized_volatility * 100.0
    );
    eprintln!("Sharpe Ratio:     {}", format_sharpe(summary.sharpe_ratio));
    eprintln!("Max Drawdown:     {:.1}%", summary.max_drawdown * 100.0);
    eprintln!("Turnover:         {:.2}", summary.turnover);
    eprintln!("Total Trades:     {}", summary.trade_count);
    eprintln!("Total Costs:      {:.4}", summary.total_costs);
    eprintln!("Final Holding:    {}", result.position.holding);
}

fn run_backtest(
    config_path: &Path,
    output: Option<&Path>,
    overrides: Overrides,
) -> Result<(), RotatraderError> {
    let adapter = load_config(config_path)?;
    let config = apply_overrides(build_rotation_config(&adapter)?, &overrides)?;
    let data_port = data_adapter(&adapter)?;
    let output_dir = resolve_output_dir(output, &adapter);

    run_backtest_pipeline(&data_port, &CsvReportAdapter, &config, &output_dir)?;
    Ok(())
}

fn run_sweep(
    config_path: &Path,
    output: Option<&Path>,
    windows: &[usize],
    costs: &[f64],
    frequencies: &[String],
    parallel: bool,
) -> Result<(), RotatraderError> {
    let adapter = load_config(config_path)?;
    let base = build_rotation_config(&adapter)?;
    let grid = build_sweep_grid(&base, windows, costs, frequencies)?;
    let data_port = data_adapter(&adapter)?;
    let output_dir = resolve_output_dir(output, &adapter);

    run_sweep_pipeline(&data_port, &CsvReportAdapter, &base, &grid, parallel, &output_dir)?;
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RotatraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_data_config(&adapter)?;
    let config = build_rotation_config(&adapter)?;

    eprintln!("\nRotation:");
    eprintln!("  Gold asset:     {}", config.gold_asset);
    eprintln!("  Equity asset:   {}", config.equity_asset);
    eprintln!("  Window:         {} days", config.window);
    eprintln!("  Rebalance:      {}", config.frequency);
    eprintln!("  Cost:           {} bps", config.cost_bps);
    eprintln!("  Alignment:      {}", config.alignment);
    eprintln!("  Tie break:      {}", config.tie_break);
    match config.end_date {
        Some(end) => eprintln!("  Period:         {} to {}", config.start_date, end),
        None => eprintln!("  Period:         {} onward", config.start_date),
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_signal(config_path: &Path) -> Result<(), RotatraderError> {
    let adapter = load_config(config_path)?;
    let config = build_rotation_config(&adapter)?;
    let data_port = data_adapter(&adapter)?;
    let frame = load_frame(&data_port, &config)?;

    let last_row = frame.rows().last().ok_or_else(|| RotatraderError::NoData {
        asset_id: format!("{}/{}", config.gold_asset, config.equity_asset),
    })?;

    let result = backtest_engine::run_backtest(&frame, &config);
    let signal = signal_for(&frame, &config, &result);
    let target = signal.as_ref().map(|s| s.target).unwrap_or(Holding::Cash);

    match &signal {
        Some(s) => {
            eprintln!("\n=== Latest Signal ({}) ===", s.date);
            eprintln!("{} return:  {:.2}%", config.gold_asset, s.gold_return * 100.0);
            eprintln!("{} return:  {:.2}%", config.equity_asset, s.equity_return * 100.0);
        }
        None => {
            eprintln!("\n=== Latest Signal ({}) ===", last_row.date);
            eprintln!("Not enough history for a {}-day signal", config.window);
        }
    }
    eprintln!("Target:           {target}");
    if let Some(close) = last_row.close(result.position.holding) {
        eprintln!(
            "Open {} since {}: {:.2}%",
            result.position.holding,
            result
                .position
                .entry_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            result.position.unrealized_return(close) * 100.0
        );
    }

    let mut execution = PaperExecutionAdapter::new(last_row.date);
    execution.set_market(last_row.date, last_row.close(target));
    submit_target(&mut execution, target)?;

    let position = execution.get_current_position()?;
    println!("{}", position.holding);
    Ok(())
}
