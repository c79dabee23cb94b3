//! Fixed-point price encoding.
//!
//! Prices are stored as integer hundredths, which gives the catalog 18
//! significant digits with 2 of them fractional.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

pub const SCALE: u32 = 2;
pub const MAX_CENTS: i64 = 999_999_999_999_999_999;

#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    #[error("price must not be negative, got {0}")]
    Negative(Decimal),
    #[error("price {0} exceeds 18 digits of precision")]
    OutOfRange(Decimal),
    #[error("price {0} has more than 2 decimal places")]
    TooPrecise(Decimal),
}

/// Round to the stored precision, half away from zero.
pub fn normalize(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SCALE);
    rounded
}

pub fn to_cents(price: Decimal) -> Result<i64, PriceError> {
    let normalized = normalize(price);
    let cents = i64::try_from(normalized.mantissa())
        .map_err(|_| PriceError::OutOfRange(price))?;
    if cents > MAX_CENTS {
        return Err(PriceError::OutOfRange(price));
    }
    Ok(cents)
}

/// Like [`to_cents`] but refuses prices that rounding would change.
pub fn exact_cents(price: Decimal) -> Result<i64, PriceError> {
    if normalize(price) != price {
        return Err(PriceError::TooPrecise(price));
    }
    to_cents(price)
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, SCALE)
}

/// Checks a price for storage without converting it.
pub fn check(price: Decimal) -> Result<(), PriceError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(PriceError::Negative(price));
    }
    to_cents(price).map(|_| ())
}
