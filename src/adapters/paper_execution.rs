//! In-memory paper execution adapter.
//!
//! Accepts target positions without contacting any venue and remembers them,
//! so the execution seam can be driven end to end without a broker.

use chrono::NaiveDate;

use crate::domain::error::RotatraderError;
use crate::domain::position::{Holding, Position};
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, PartialEq)]
pub struct PaperOrder {
    pub asset: Holding,
    pub weight: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct PaperExecutionAdapter {
    as_of: NaiveDate,
    mark_price: Option<f64>,
    position: Position,
    orders: Vec<PaperOrder>,
}

impl PaperExecutionAdapter {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            mark_price: None,
            position: Position::cash(),
            orders: Vec::new(),
        }
    }

    /// Sets the date and reference price the next submission fills at.
    pub fn set_market(&mut self, as_of: NaiveDate, mark_price: Option<f64>) {
        self.as_of = as_of;
        self.mark_price = mark_price;
    }

    pub fn orders(&self) -> &[PaperOrder] {
        &self.orders
    }
}

impl ExecutionPort for PaperExecutionAdapter {
    fn submit_target_position(
        &mut self,
        asset: Holding,
        weight: f64,
    ) -> Result<(), RotatraderError> {
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(RotatraderError::Execution {
                reason: format!("target weight {weight} outside [0, 1]"),
            });
        }

        let effective = if weight == 0.0 { Holding::Cash } else { asset };
        if effective.is_risky() && self.mark_price.is_none() {
            return Err(RotatraderError::Execution {
                reason: format!("no mark price for {effective} on {}", self.as_of),
            });
        }

        self.orders.push(PaperOrder {
            asset,
            weight,
            date: self.as_of,
        });

        if effective != self.position.holding {
            self.position =
                Position::enter(effective, self.as_of, self.mark_price.unwrap_or_default());
        }

        tracing::info!(date = %self.as_of, "paper target {effective} at weight {weight}");
        Ok(())
    }

    fn get_current_position(&self) -> Result<Position, RotatraderError> {
        Ok(self.position.clone())
    }
}
