//! Field validation for user-supplied values
//!
//! The ledger trusts whatever payload it is handed; these checks run
//! before a payload is built.

use thiserror::Error;

use crate::constants::{ID_CAPACITY, MAX_AMOUNT};

/// Input validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("ID must be between 1-{} characters", ID_CAPACITY - 1)]
    IdLength,
    #[error("ID can only contain letters, numbers, underscores, and hyphens")]
    IdCharset,
    #[error("Please enter a valid numeric amount")]
    NotANumber,
    #[error("Amount cannot be negative")]
    NegativeAmount,
    #[error("Amount cannot exceed $1,000,000.00")]
    AmountTooLarge,
    #[error("{field} is too long (at most {max} characters)")]
    TooLong { field: &'static str, max: usize },
}

/// Identifier rule: 1..=31 ASCII alphanumerics, `_` or `-`
pub fn validate_id(id: &str) -> Result<(), InputError> {
    if id.is_empty() || id.len() >= ID_CAPACITY {
        return Err(InputError::IdLength);
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(InputError::IdCharset);
    }
    Ok(())
}

/// Amount rule: 0 <= amount <= 1,000,000.00
pub fn validate_amount(amount: f64) -> Result<(), InputError> {
    if amount.is_nan() {
        return Err(InputError::NotANumber);
    }
    if amount < 0.0 {
        return Err(InputError::NegativeAmount);
    }
    if amount > MAX_AMOUNT {
        return Err(InputError::AmountTooLarge);
    }
    Ok(())
}

/// Parse a whole token as an amount. Trailing garbage is rejected.
pub fn parse_amount(token: &str) -> Result<f64, InputError> {
    let amount: f64 = token.trim().parse().map_err(|_| InputError::NotANumber)?;
    if !amount.is_finite() {
        return Err(InputError::NotANumber);
    }
    Ok(amount)
}

/// Parse and range-check in one step
pub fn read_amount(token: &str) -> Result<f64, InputError> {
    let amount = parse_amount(token)?;
    validate_amount(amount)?;
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("POL-001_a").is_ok());
        assert_eq!(validate_id(""), Err(InputError::IdLength));
        assert_eq!(validate_id(&"x".repeat(32)), Err(InputError::IdLength));
        assert!(validate_id(&"x".repeat(31)).is_ok());
        assert_eq!(validate_id("bad id"), Err(InputError::IdCharset));
        assert_eq!(validate_id("semi;colon"), Err(InputError::IdCharset));
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.0).is_ok());
        assert!(validate_amount(1_000_000.0).is_ok());
        assert_eq!(validate_amount(-0.01), Err(InputError::NegativeAmount));
        assert_eq!(validate_amount(1_000_000.01), Err(InputError::AmountTooLarge));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150.00"), Ok(150.0));
        assert_eq!(parse_amount("12abc"), Err(InputError::NotANumber));
        assert_eq!(parse_amount(""), Err(InputError::NotANumber));
        assert_eq!(parse_amount("inf"), Err(InputError::NotANumber));
        assert_eq!(read_amount("-5"), Err(InputError::NegativeAmount));
    }
}
