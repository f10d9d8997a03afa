//! Execution capability port trait.
//!
//! The backtest engine never calls this; it is the seam a paper or live
//! execution target plugs into.

use crate::domain::error::RotatraderError;
use crate::domain::position::{Holding, Position};

pub trait ExecutionPort {
    /// Requests that `weight` of the account be held in `asset`.
    /// Submitting [`Holding::Cash`] flattens the account.
    fn submit_target_position(&mut self, asset: Holding, weight: f64)
        -> Result<(), RotatraderError>;

    fn get_current_position(&self) -> Result<Position, RotatraderError>;
}
