//! Rotation backtest engine.
//!
//! The engine is a three-state machine (CASH, GOLD, EQUITY) starting in cash.
//! On each decision date it samples the momentum signal from data through that
//! date and schedules the switch for the next trading day. Between switches the
//! NAV compounds by the held asset's close-to-close return.

use chrono::NaiveDate;

use super::aligned::{AlignedFrame, AlignmentPolicy};
use super::momentum::{self, TieBreak, DEFAULT_WINDOW};
use super::position::{Holding, Position};
use super::schedule::{self, RebalanceFrequency};

pub const DEFAULT_COST_BPS: f64 = 5.0;

/// Immutable parameters of one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationConfig {
    pub window: usize,
    pub frequency: RebalanceFrequency,
    pub cost_bps: f64,
    pub tie_break: TieBreak,
    pub alignment: AlignmentPolicy,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub gold_asset: String,
    pub equity_asset: String,
    pub risk_free_rate: f64,
}

impl RotationConfig {
    /// Fraction of notional charged per switch.
    pub fn fee_rate(&self) -> f64 {
        self.cost_bps / 10_000.0
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        RotationConfig {
            window: DEFAULT_WINDOW,
            frequency: RebalanceFrequency::default(),
            cost_bps: DEFAULT_COST_BPS,
            tie_break: TieBreak::default(),
            alignment: AlignmentPolicy::default(),
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: None,
            gold_asset: "GC=F".to_string(),
            equity_asset: "510300".to_string(),
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityCurvePoint {
    pub date: NaiveDate,
    pub nav: f64,
    pub holding: Holding,
}

/// A switch decided at the close of `decision_date` and carried out on
/// `execution_date`, the next trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTrade {
    pub decision_date: NaiveDate,
    pub execution_date: NaiveDate,
    pub from: Holding,
    pub to: Holding,
    /// NAV deducted on execution. Zero until executed.
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityCurvePoint>,
    pub trades: Vec<ScheduledTrade>,
    /// Number of rebalance dates the scheduler produced.
    pub decision_count: usize,
    pub position: Position,
}

impl BacktestResult {
    pub fn final_nav(&self) -> f64 {
        self.equity_curve.last().map(|p| p.nav).unwrap_or(1.0)
    }

    pub fn total_costs(&self) -> f64 {
        self.trades.iter().map(|t| t.cost).sum()
    }
}

struct RotationEngine {
    fee_rate: f64,
    nav: f64,
    position: Position,
    pending: Option<(usize, ScheduledTrade)>,
    equity_curve: Vec<EquityCurvePoint>,
    trades: Vec<ScheduledTrade>,
}

impl RotationEngine {
    fn new(fee_rate: f64, capacity: usize) -> Self {
        RotationEngine {
            fee_rate,
            nav: 1.0,
            position: Position::cash(),
            pending: None,
            equity_curve: Vec::with_capacity(capacity),
            trades: Vec::new(),
        }
    }

    fn holding(&self) -> Holding {
        self.position.holding
    }

    /// Advances the NAV to row `index`, executing a switch due on that row first.
    fn mark(&mut self, frame: &AlignedFrame, index: usize) {
        let Some(row) = frame.row(index) else {
            return;
        };

        if index > 0 {
            let prev_nav = self.nav;
            let mut cost = 0.0;

            if let Some((_, mut trade)) = self.pending.take_if(|(due, _)| *due == index) {
                cost = prev_nav * self.fee_rate;
                trade.cost = cost;

                let entry_price = frame
                    .row(index - 1)
                    .and_then(|prev| prev.close(trade.to))
                    .unwrap_or(0.0);
                self.position = Position::enter(trade.to, row.date, entry_price);

                tracing::debug!(
                    decision = %trade.decision_date,
                    execution = %trade.execution_date,
                    "switch {} -> {} cost {:.6}",
                    trade.from,
                    trade.to,
                    cost
                );
                self.trades.push(trade);
            }

            let daily = frame.daily_return(index, self.holding());
            self.nav = prev_nav * (1.0 + daily) - cost;
        }

        self.equity_curve.push(EquityCurvePoint {
            date: row.date,
            nav: self.nav,
            holding: self.holding(),
        });
    }

    fn schedule(&mut self, execution_index: usize, trade: ScheduledTrade) {
        self.pending = Some((execution_index, trade));
    }

    fn finish(self, decision_count: usize) -> BacktestResult {
        BacktestResult {
            equity_curve: self.equity_curve,
            trades: self.trades,
            decision_count,
            position: self.position,
        }
    }
}

/// Runs the rotation over `frame`.
///
/// An empty frame yields an empty curve; a frame without enough history for a
/// single signal yields a flat cash curve. Neither is an error.
pub fn run_backtest(frame: &AlignedFrame, config: &RotationConfig) -> BacktestResult {
    let dates = frame.dates();
    let mut is_decision = vec![false; dates.len()];
    let decisions = schedule::decision_indices(&dates, config.frequency);
    for &i in &decisions {
        is_decision[i] = true;
    }

    if frame.len() <= config.window {
        tracing::info!(
            rows = frame.len(),
            window = config.window,
            "not enough history for a momentum signal, holding cash"
        );
    }

    let mut engine = RotationEngine::new(config.fee_rate(), frame.len());

    for index in 0..frame.len() {
        engine.mark(frame, index);

        if !is_decision[index] {
            continue;
        }

        let held = engine.holding();
        let target = momentum::signal_at(frame, index, config.window, held, config.tie_break)
            .map(|s| s.target)
            .unwrap_or(Holding::Cash);

        if target == held {
            continue;
        }

        match schedule::execution_index(&dates, index) {
            Some(execution) => engine.schedule(
                execution,
                ScheduledTrade {
                    decision_date: dates[index],
                    execution_date: dates[execution],
                    from: held,
                    to: target,
                    cost: 0.0,
                },
            ),
            None => tracing::warn!(
                decision = %dates[index],
                "no trading day after final decision, {held} -> {target} not executed"
            ),
        }
    }

    engine.finish(decisions.len())
}
