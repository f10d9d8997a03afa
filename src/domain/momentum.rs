//! Trailing-window momentum signal for the gold/equity rotation.
//!
//! R(W)[t] = C[t] / C[t-W] - 1
//! Warmup: the first W rows have no signal.
//! Target: CASH when both returns <= 0, otherwise the asset with the larger return.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::aligned::AlignedFrame;
use super::position::Holding;

pub const DEFAULT_WINDOW: usize = 60;

/// Resolution of equal trailing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Keep the asset currently held; GOLD when holding cash.
    #[default]
    PreferHeld,
    /// Always GOLD.
    PreferGold,
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TieBreak::PreferHeld => write!(f, "prefer_held"),
            TieBreak::PreferGold => write!(f, "prefer_gold"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefer_held" | "held" => Ok(TieBreak::PreferHeld),
            "prefer_gold" | "gold" => Ok(TieBreak::PreferGold),
            other => Err(format!("unknown tie break '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumSignal {
    pub date: NaiveDate,
    pub gold_return: f64,
    pub equity_return: f64,
    pub target: Holding,
}

/// Simple return over the `window` rows ending at `index`.
pub fn trailing_return(closes: &[f64], index: usize, window: usize) -> Option<f64> {
    if window == 0 || index < window || index >= closes.len() {
        return None;
    }
    let base = closes[index - window];
    if base == 0.0 {
        return None;
    }
    Some(closes[index] / base - 1.0)
}

pub fn decide(gold_return: f64, equity_return: f64, held: Holding, tie_break: TieBreak) -> Holding {
    if gold_return <= 0.0 && equity_return <= 0.0 {
        return Holding::Cash;
    }
    if gold_return > equity_return {
        Holding::Gold
    } else if equity_return > gold_return {
        Holding::Equity
    } else {
        match tie_break {
            TieBreak::PreferHeld if held.is_risky() => held,
            _ => Holding::Gold,
        }
    }
}

/// Signal for row `index`, reading only rows `index - window ..= index`.
pub fn signal_at(
    frame: &AlignedFrame,
    index: usize,
    window: usize,
    held: Holding,
    tie_break: TieBreak,
) -> Option<MomentumSignal> {
    let span = frame.rows().get(index.checked_sub(window)?..=index)?;
    let row = span.last()?;
    let gold: Vec<f64> = span.iter().map(|r| r.gold).collect();
    let equity: Vec<f64> = span.iter().map(|r| r.equity).collect();

    let gold_return = trailing_return(&gold, window, window)?;
    let equity_return = trailing_return(&equity, window, window)?;

    Some(MomentumSignal {
        date: row.date,
        gold_return,
        equity_return,
        target: decide(gold_return, equity_return, held, tie_break),
    })
}

/// One entry per frame row. Ties on a given day resolve against the previous
/// day's target, starting from no holding.
pub fn generate_signals(
    frame: &AlignedFrame,
    window: usize,
    tie_break: TieBreak,
) -> Vec<Option<MomentumSignal>> {
    let mut prior = Holding::Cash;
    (0..frame.len())
        .map(|i| {
            let signal = signal_at(frame, i, window, prior, tie_break);
            if let Some(s) = &signal {
                prior = s.target;
            }
            signal
        })
        .collect()
}
