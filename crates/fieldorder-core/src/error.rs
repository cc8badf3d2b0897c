//! # Error Types
//!
//! Domain-specific error types for fieldorder-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fieldorder-core errors (this file)                                    │
//! │  ├── CoreError        - Order mutation failures                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fieldorder-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → order screen            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scheme evaluation itself never fails: a missing scheme, an unmet
//! threshold or a dangling offer product are all silent no-ops so the order
//! is always renderable. Errors here come only from user mutations that
//! break a limit.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Order mutation errors.
///
/// A failed mutation leaves the session exactly as it was before the call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id is not in the current catalog snapshot.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Decrement or removal of a product that has no regular line.
    #[error("Product {0} is not in the order")]
    LineNotFound(String),

    /// The order already holds the maximum number of distinct products.
    #[error("Order cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Incrementing would push a line past the quantity ceiling.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 1000,
            max: 999,
        };
        assert_eq!(err.to_string(), "Quantity 1000 exceeds maximum allowed (999)");

        let err = CoreError::LineNotFound("P-7".to_string());
        assert_eq!(err.to_string(), "Product P-7 is not in the order");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        assert_eq!(err.to_string(), "product_id is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
