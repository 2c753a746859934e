//! Decimal amount parsing and validation.
//!
//! Amounts travel as strings on the wire and are stored as exact decimals,
//! never floats. A transaction amount must be strictly positive; direction
//! is carried by the flow field, not the sign.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while parsing amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    /// Input is not a decimal number.
    #[error("'{0}' is not a decimal amount")]
    NotANumber(String),

    /// Amount must be strictly positive.
    #[error("amount must be greater than zero")]
    NotPositive,
}

/// Parses a wire amount into a strictly positive decimal.
///
/// # Errors
///
/// Returns `AmountError::NotANumber` for unparsable input and
/// `AmountError::NotPositive` for zero or negative amounts.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let amount =
        Decimal::from_str(input.trim()).map_err(|_| AmountError::NotANumber(input.to_string()))?;

    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }

    Ok(amount)
}
