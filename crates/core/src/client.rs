//! Client record validation.

use crate::error::CoreError;
use crate::types::Money;

/// Client rating range, inclusive.
pub const RATING_RANGE: (i16, i16) = (1, 5);

/// Validate that the company name is present.
pub fn validate_company_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Company name is required".to_string()));
    }
    Ok(())
}

/// Minimal shape check: one `@` with non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(CoreError::Validation(format!(
            "Invalid email address '{email}'"
        )));
    }
    Ok(())
}

pub fn validate_rating(rating: i16) -> Result<(), CoreError> {
    let (min, max) = RATING_RANGE;
    if rating < min || rating > max {
        return Err(CoreError::Validation(format!(
            "Rating must be between {min} and {max}, got {rating}"
        )));
    }
    Ok(())
}

pub fn validate_estimated_value(value: Money) -> Result<(), CoreError> {
    if value < Money::ZERO {
        return Err(CoreError::Validation(
            "Estimated value must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("pm@acme-builders.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@acme.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("a@localhost").is_err());
    }

    #[test]
    fn rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn company_name_required() {
        assert!(validate_company_name("").is_err());
        assert!(validate_company_name("Northgate Developments").is_ok());
    }

    #[test]
    fn estimated_value_non_negative() {
        assert!(validate_estimated_value(Money::ZERO).is_ok());
        assert!(validate_estimated_value(Money::from(-5)).is_err());
    }
}
