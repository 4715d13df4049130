//! Client-side form checks. A failed check blocks the request.

use crate::models::format_money;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    Missing(&'static str),

    #[error("{0}")]
    Invalid(&'static str),

    #[error("Minimum amount is {}", money(.0))]
    BelowMinimum(f64),

    #[error("Maximum amount is {}", money(.0))]
    AboveMaximum(f64),
}

fn money(amount: &f64) -> String {
    format_money(*amount)
}

/// Every field must be non-blank.
pub fn require_all(fields: &[&str], message: &'static str) -> Result<(), ValidationError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ValidationError::Missing(message));
    }
    Ok(())
}

/// Parse a decimal amount. Any finite number is accepted.
pub fn parse_amount(raw: &str, message: &'static str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ValidationError::Invalid(message)),
    }
}

/// Parse an amount that must be strictly positive.
pub fn positive_amount(raw: &str, message: &'static str) -> Result<f64, ValidationError> {
    match parse_amount(raw, message)? {
        v if v > 0.0 => Ok(v),
        _ => Err(ValidationError::Invalid(message)),
    }
}

/// Check an amount against a biller's bounds. A zero maximum means no cap.
pub fn within_bounds(amount: f64, minimum: f64, maximum: Option<f64>) -> Result<(), ValidationError> {
    if amount < minimum {
        return Err(ValidationError::BelowMinimum(minimum));
    }
    match maximum {
        Some(max) if max > 0.0 && amount > max => Err(ValidationError::AboveMaximum(max)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_all() {
        assert!(require_all(&["a", "b"], "Please fill in all fields").is_ok());
        let err = require_all(&["a", "  "], "Please fill in all fields").unwrap_err();
        assert_eq!(err.to_string(), "Please fill in all fields");
    }

    #[test]
    fn test_amounts() {
        assert_eq!(parse_amount(" 12.5 ", "bad"), Ok(12.5));
        assert_eq!(parse_amount("-3", "bad"), Ok(-3.0));
        assert!(parse_amount("abc", "bad").is_err());
        assert!(parse_amount("inf", "bad").is_err());

        assert_eq!(positive_amount("0.01", "bad"), Ok(0.01));
        assert_eq!(positive_amount("0", "bad"), Err(ValidationError::Invalid("bad")));
        assert_eq!(positive_amount("", "bad"), Err(ValidationError::Invalid("bad")));
    }

    #[test]
    fn test_bounds_messages() {
        assert!(within_bounds(50.0, 10.0, None).is_ok());
        assert_eq!(
            within_bounds(5.0, 10.0, Some(100.0)).unwrap_err().to_string(),
            "Minimum amount is $10.00"
        );
        assert_eq!(
            within_bounds(500.0, 10.0, Some(100.0)).unwrap_err().to_string(),
            "Maximum amount is $100.00"
        );
    }

    #[test]
    fn test_zero_maximum_is_uncapped() {
        assert!(within_bounds(25.0, 10.0, Some(0.0)).is_ok());
        assert!(within_bounds(5.0, 10.0, Some(0.0)).is_err());
    }
}
