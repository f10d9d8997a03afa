//! Market data retrieval port trait.

use crate::domain::error::RotatraderError;
use crate::domain::price::AssetSeries;
use chrono::NaiveDate;

/// Source of cleaned daily close series.
///
/// Implementations return one validated series per asset, already restricted
/// to `[start_date, end_date]`. An asset with no rows in range is reported as
/// [`RotatraderError::NoData`].
pub trait PriceDataPort {
    fn fetch_closes(
        &self,
        asset_id: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<AssetSeries, RotatraderError>;
}
