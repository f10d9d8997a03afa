//! Domain error types.

use chrono::NaiveDate;

/// Violations of the [`AssetSeries`](crate::domain::price::AssetSeries) invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("duplicate date {date} in series {asset_id}")]
    DuplicateDate { asset_id: String, date: NaiveDate },

    #[error("invalid close {close} on {date} in series {asset_id}")]
    InvalidClose {
        asset_id: String,
        date: NaiveDate,
        close: f64,
    },
}

/// Top-level error type for rotatrader.
#[derive(Debug, thiserror::Error)]
pub enum RotatraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {asset_id}")]
    NoData { asset_id: String },

    #[error(transparent)]
    InvalidSeries(#[from] SeriesError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("execution error: {reason}")]
    Execution { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RotatraderError> for std::process::ExitCode {
    fn from(err: &RotatraderError) -> Self {
        let code: u8 = match err {
            RotatraderError::Io(_) | RotatraderError::Report { .. } => 1,
            RotatraderError::ConfigParse { .. }
            | RotatraderError::ConfigMissing { .. }
            | RotatraderError::ConfigInvalid { .. } => 2,
            RotatraderError::Data { .. } | RotatraderError::InvalidSeries(_) => 3,
            RotatraderError::NoData { .. } => 5,
            RotatraderError::Execution { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
