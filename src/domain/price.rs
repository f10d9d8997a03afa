//! Close-price points and validated per-asset series.

use chrono::NaiveDate;

use super::error::SeriesError;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub asset_id: String,
    pub close: f64,
}

/// Ordered close series for one asset.
///
/// Dates are strictly increasing and every close is finite and positive.
/// The only way to build one is through [`AssetSeries::new`], which enforces
/// both rules, so downstream code can index it without re-checking.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSeries {
    asset_id: String,
    points: Vec<PricePoint>,
}

impl AssetSeries {
    /// Builds a series, sorting by date and rejecting duplicates or bad closes.
    pub fn new(asset_id: &str, mut points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        points.sort_by_key(|p| p.date);

        for point in &points {
            if !point.close.is_finite() || point.close <= 0.0 {
                return Err(SeriesError::InvalidClose {
                    asset_id: asset_id.to_string(),
                    date: point.date,
                    close: point.close,
                });
            }
        }

        if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(SeriesError::DuplicateDate {
                asset_id: asset_id.to_string(),
                date: pair[1].date,
            });
        }

        Ok(Self {
            asset_id: asset_id.to_string(),
            points,
        })
    }

    pub fn from_closes<I>(asset_id: &str, rows: I) -> Result<Self, SeriesError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let points = rows
            .into_iter()
            .map(|(date, close)| PricePoint {
                date,
                asset_id: asset_id.to_string(),
                close,
            })
            .collect();
        Self::new(asset_id, points)
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }

    /// Close on `date`, or the most recent close before it.
    pub fn close_on_or_before(&self, date: NaiveDate) -> Option<f64> {
        match self.points.binary_search_by_key(&date, |p| p.date) {
            Ok(i) => Some(self.points[i].close),
            Err(0) => None,
            Err(i) => Some(self.points[i - 1].close),
        }
    }
}
