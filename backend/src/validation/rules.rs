//! Common validation rules shared across input payloads.

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates password strength.
///
/// Requirements:
/// - At least 8 characters
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        let mut err = ValidationError::new("password_too_short");
        err.message = Some("Password must be at least 8 characters long".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a price is a non-negative decimal.
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("price_negative");
        err.message = Some("Price must not be negative".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rejects_short() {
        let result = validate_password_strength("hunter2");
        assert!(result.is_err());
    }

    #[test]
    fn password_accepts_eight_chars() {
        let result = validate_password_strength("hunter22");
        assert!(result.is_ok());
    }

    #[test]
    fn price_rejects_negative() {
        let result = validate_price(&"-0.01".parse().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn price_accepts_zero() {
        let result = validate_price(&Decimal::ZERO);
        assert!(result.is_ok());
    }

    #[test]
    fn price_accepts_positive() {
        let result = validate_price(&"19.99".parse().unwrap());
        assert!(result.is_ok());
    }
}
