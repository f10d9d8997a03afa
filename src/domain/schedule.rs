//! Rebalance calendar: which trading days may carry a decision, and the
//! lagged day each decision executes on.

use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceFrequency {
    Daily,
    /// Last trading day on or before the anchor weekday of each ISO week.
    Weekly(Weekday),
    /// Last trading day of each calendar month.
    Monthly,
}

impl Default for RebalanceFrequency {
    fn default() -> Self {
        RebalanceFrequency::Weekly(Weekday::Fri)
    }
}

impl RebalanceFrequency {
    pub fn name(&self) -> &'static str {
        match self {
            RebalanceFrequency::Daily => "daily",
            RebalanceFrequency::Weekly(_) => "weekly",
            RebalanceFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceFrequency::Weekly(anchor) => write!(f, "weekly({anchor})"),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for RebalanceFrequency {
    type Err = String;

    /// Accepts `daily`, `weekly`, `weekly:<weekday>` and `monthly`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let (kind, anchor) = match lowered.split_once(':') {
            Some((kind, anchor)) => (kind.trim(), Some(anchor.trim())),
            None => (lowered.as_str(), None),
        };
        match (kind, anchor) {
            ("daily", None) => Ok(RebalanceFrequency::Daily),
            ("monthly", None) => Ok(RebalanceFrequency::Monthly),
            ("weekly", None) => Ok(RebalanceFrequency::default()),
            ("weekly", Some(day)) => parse_weekday(day).map(RebalanceFrequency::Weekly),
            _ => Err(format!("unknown rebalance frequency '{}'", s.trim())),
        }
    }
}

pub fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("unknown weekday '{}'", s.trim()))
}

/// Row indices of the decision dates for `frequency`, in calendar order.
///
/// `dates` must be strictly increasing.
pub fn decision_indices(dates: &[NaiveDate], frequency: RebalanceFrequency) -> Vec<usize> {
    match frequency {
        RebalanceFrequency::Daily => (0..dates.len()).collect(),
        RebalanceFrequency::Weekly(anchor) => {
            let cutoff = anchor.num_days_from_monday();
            last_per_period(
                dates,
                |d| {
                    let week = d.iso_week();
                    (week.year(), week.week())
                },
                |d| d.weekday().num_days_from_monday() <= cutoff,
            )
        }
        RebalanceFrequency::Monthly => {
            last_per_period(dates, |d| (d.year(), d.month()), |_| true)
        }
    }
}

pub fn decision_dates(dates: &[NaiveDate], frequency: RebalanceFrequency) -> Vec<NaiveDate> {
    decision_indices(dates, frequency)
        .into_iter()
        .map(|i| dates[i])
        .collect()
}

/// The trading day a decision taken at `decision` executes on: the next row
/// strictly after it. `None` when the decision falls on the last row.
pub fn execution_index(dates: &[NaiveDate], decision: usize) -> Option<usize> {
    let next = decision + 1;
    (next < dates.len()).then_some(next)
}

/// True when no weekday of `date`'s rebalance period remains after `date`,
/// so a decision dated `date` stands even without later rows.
pub fn period_closed(date: NaiveDate, frequency: RebalanceFrequency) -> bool {
    match frequency {
        RebalanceFrequency::Daily => true,
        RebalanceFrequency::Weekly(anchor) => {
            date.weekday().num_days_from_monday() >= anchor.num_days_from_monday()
        }
        RebalanceFrequency::Monthly => {
            let mut next = date.succ_opt();
            while let Some(day) = next {
                if day.month() != date.month() {
                    break;
                }
                if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
                    return false;
                }
                next = day.succ_opt();
            }
            true
        }
    }
}

/// Last decision whose period has ended. A final partial period only counts
/// once its calendar is over.
pub fn last_closed_decision(dates: &[NaiveDate], frequency: RebalanceFrequency) -> Option<usize> {
    let decisions = decision_indices(dates, frequency);
    let (&last, earlier) = decisions.split_last()?;
    if last + 1 == dates.len() && !period_closed(dates[last], frequency) {
        earlier.last().copied()
    } else {
        Some(last)
    }
}

fn last_per_period<K, F, E>(dates: &[NaiveDate], key: F, eligible: E) -> Vec<usize>
where
    K: PartialEq,
    F: Fn(NaiveDate) -> K,
    E: Fn(NaiveDate) -> bool,
{
    let mut selected = Vec::new();
    let mut start = 0;

    while start < dates.len() {
        let period = key(dates[start]);
        let mut end = start;
        let mut chosen = None;

        while end < dates.len() && key(dates[end]) == period {
            if eligible(dates[end]) {
                chosen = Some(end);
            }
            end += 1;
        }

        if let Some(index) = chosen {
            selected.push(index);
        }
        start = end;
    }

    selected
}
