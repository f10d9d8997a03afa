//! Date-aligned two-asset price frame and shared trading calendar.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use super::position::Holding;
use super::price::AssetSeries;

/// How dates present in only one of the two series are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentPolicy {
    /// Keep only dates both series trade on.
    #[default]
    Drop,
    /// Keep the union of dates and carry the last known close forward.
    /// Dates before both series have started are still dropped.
    ForwardFill,
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentPolicy::Drop => write!(f, "drop"),
            AlignmentPolicy::ForwardFill => write!(f, "forward_fill"),
        }
    }
}

impl FromStr for AlignmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" | "inner" => Ok(AlignmentPolicy::Drop),
            "forward_fill" | "ffill" => Ok(AlignmentPolicy::ForwardFill),
            other => Err(format!("unknown alignment policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub gold: f64,
    pub equity: f64,
}

impl AlignedRow {
    pub fn close(&self, holding: Holding) -> Option<f64> {
        match holding {
            Holding::Gold => Some(self.gold),
            Holding::Equity => Some(self.equity),
            Holding::Cash => None,
        }
    }
}

/// Both legs joined on one calendar. Every row carries a close for each asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFrame {
    pub gold_id: String,
    pub equity_id: String,
    rows: Vec<AlignedRow>,
    date_index: HashMap<NaiveDate, usize>,
}

impl AlignedFrame {
    pub fn align(gold: &AssetSeries, equity: &AssetSeries, policy: AlignmentPolicy) -> Self {
        let rows: Vec<AlignedRow> = match policy {
            AlignmentPolicy::Drop => gold
                .points()
                .iter()
                .filter_map(|g| {
                    equity.close_on(g.date).map(|e| AlignedRow {
                        date: g.date,
                        gold: g.close,
                        equity: e,
                    })
                })
                .collect(),
            AlignmentPolicy::ForwardFill => {
                let calendar: BTreeSet<NaiveDate> = gold
                    .points()
                    .iter()
                    .chain(equity.points())
                    .map(|p| p.date)
                    .collect();
                calendar
                    .into_iter()
                    .filter_map(|date| {
                        let g = gold.close_on_or_before(date)?;
                        let e = equity.close_on_or_before(date)?;
                        Some(AlignedRow {
                            date,
                            gold: g,
                            equity: e,
                        })
                    })
                    .collect()
            }
        };

        if rows.len() != gold.len() || rows.len() != equity.len() {
            tracing::debug!(
                policy = %policy,
                gold_rows = gold.len(),
                equity_rows = equity.len(),
                aligned_rows = rows.len(),
                "series calendars differ"
            );
        }

        Self::from_rows(gold.asset_id(), equity.asset_id(), rows)
    }

    /// Builds a frame from rows already on a common calendar, in date order.
    pub fn from_rows(gold_id: &str, equity_id: &str, rows: Vec<AlignedRow>) -> Self {
        let date_index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.date, i))
            .collect();
        Self {
            gold_id: gold_id.to_string(),
            equity_id: equity_id.to_string(),
            rows,
            date_index,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[AlignedRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&AlignedRow> {
        self.rows.get(index)
    }

    pub fn row_on(&self, date: NaiveDate) -> Option<&AlignedRow> {
        self.date_index.get(&date).map(|&i| &self.rows[i])
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Close-to-close return of `holding` from row `index - 1` to `index`.
    /// Zero for cash and for the first row.
    pub fn daily_return(&self, index: usize, holding: Holding) -> f64 {
        if index == 0 || index >= self.rows.len() {
            return 0.0;
        }
        match (
            self.rows[index - 1].close(holding),
            self.rows[index].close(holding),
        ) {
            (Some(prev), Some(curr)) => curr / prev - 1.0,
            _ => 0.0,
        }
    }

    /// Rows dated on or before `date`.
    pub fn through(&self, date: NaiveDate) -> Self {
        let rows = self
            .rows
            .iter()
            .take_while(|r| r.date <= date)
            .copied()
            .collect();
        Self::from_rows(&self.gold_id, &self.equity_id, rows)
    }
}
