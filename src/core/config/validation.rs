//! Validation helper functions for configuration types.

use crate::core::errors::{FixmineError, Result};

/// Validate that a usize value is greater than zero.
pub fn validate_positive_usize(value: usize, field: &str) -> Result<()> {
    if value == 0 {
        return Err(FixmineError::validation_mismatch(
            format!("{} must be greater than 0", field),
            field,
            "> 0",
            value.to_string(),
        ));
    }
    Ok(())
}

/// Validate that a u64 value is greater than zero.
pub fn validate_positive_u64(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        return Err(FixmineError::validation_mismatch(
            format!("{} must be greater than 0", field),
            field,
            "> 0",
            value.to_string(),
        ));
    }
    Ok(())
}

/// Validate that an f64 value is in the unit range [0.0, 1.0].
pub fn validate_unit_range(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(FixmineError::validation_mismatch(
            format!("{} must be between 0.0 and 1.0", field),
            field,
            "[0.0, 1.0]",
            value.to_string(),
        ));
    }
    Ok(())
}

/// Validate that a string value is not blank.
pub fn validate_non_blank(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FixmineError::validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}
