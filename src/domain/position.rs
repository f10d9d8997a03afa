//! Holdings and the live position of the rotation.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// The three states of the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Holding {
    #[default]
    Cash,
    Gold,
    Equity,
}

impl Holding {
    pub fn is_risky(self) -> bool {
        !matches!(self, Holding::Cash)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Holding::Cash => "CASH",
            Holding::Gold => "GOLD",
            Holding::Equity => "EQUITY",
        }
    }
}

impl fmt::Display for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Holding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CASH" => Ok(Holding::Cash),
            "GOLD" => Ok(Holding::Gold),
            "EQUITY" => Ok(Holding::Equity),
            other => Err(format!("unknown holding '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub holding: Holding,
    pub entry_date: Option<NaiveDate>,
    /// Reference close the holding is marked from. `None` for cash.
    pub entry_price: Option<f64>,
}

impl Position {
    pub fn cash() -> Self {
        Position {
            holding: Holding::Cash,
            entry_date: None,
            entry_price: None,
        }
    }

    /// Position entered on `date`; the entry price is ignored for cash.
    pub fn enter(holding: Holding, date: NaiveDate, price: f64) -> Self {
        Position {
            holding,
            entry_date: Some(date),
            entry_price: holding.is_risky().then_some(price),
        }
    }

    pub fn unrealized_return(&self, price: f64) -> f64 {
        match self.entry_price {
            Some(entry) if entry > 0.0 => price / entry - 1.0,
            _ => 0.0,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::cash()
    }
}
