//! # Validation Module
//!
//! Input checks run before a mutation touches the order.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order screen       → disables +/- at the limits                       │
//! │  OrderSession       → THIS MODULE: quantity / line-count ceilings      │
//! │  SQLite             → NOT NULL / CHECK / foreign keys                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product id reference.
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    Ok(())
}

/// Validates a line quantity against the configured ceiling.
///
/// ## Rules
/// - Must be positive (> 0); a line that reaches zero is removed instead
/// - Must not exceed `max`
pub fn validate_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates that one more distinct product fits in the order.
pub fn validate_line_count(current_lines: usize, max: usize) -> ValidationResult<()> {
    if current_lines >= max {
        return Err(ValidationError::OutOfRange {
            field: "order lines".to_string(),
            min: 0,
            max: max as i64,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("SKU-1").is_ok());
        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1, 999).is_ok());
        assert!(validate_quantity(999, 999).is_ok());

        assert!(validate_quantity(0, 999).is_err());
        assert!(validate_quantity(-1, 999).is_err());
        assert!(validate_quantity(1000, 999).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(0, 2).is_ok());
        assert!(validate_line_count(1, 2).is_ok());
        assert!(validate_line_count(2, 2).is_err());
    }
}
