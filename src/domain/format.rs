//! Explicit renderings for values that end up inside a signed concatenation.

use crate::error::{GatewayError, Result};
use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

pub const TRANSACTION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TRANSACTION_DATE_MINUTES_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A strictly positive amount in major currency units (e.g. rands).
///
/// Bounded so that its minor-unit rendering always fits in a [`Decimal`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MajorAmount(Decimal);

impl MajorAmount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(GatewayError::Validation(
                "Amount must be positive".to_string(),
            ));
        }
        if value.checked_mul(Decimal::ONE_HUNDRED).is_none() {
            return Err(GatewayError::Validation(format!(
                "Amount {value} is too large"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Two decimal places, half away from zero: `10` -> `"10.00"`, `32.995` -> `"33.00"`.
    pub fn to_two_decimals(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2}")
    }

    /// Integer minor units (cents) as a string: `32.99` -> `"3299"`.
    pub fn to_minor_units(&self) -> String {
        // `new` rejects any value whose product with 100 overflows.
        let cents = (self.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        cents.to_string()
    }
}

impl TryFrom<Decimal> for MajorAmount {
    type Error = GatewayError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl FromStr for MajorAmount {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| GatewayError::Validation(format!("invalid amount '{s}': {e}")))?;
        Self::new(value)
    }
}

pub fn format_transaction_date(at: NaiveDateTime) -> String {
    at.format(TRANSACTION_DATE_FORMAT).to_string()
}
