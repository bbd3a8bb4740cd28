//! # Error Types
//!
//! Domain-specific error types for crown-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  crown-core errors (this file)                                         │
//! │  ├── CoreError        - Costing / receipt rule violations              │
//! │  └── ValidationError  - Input rejected at the caller boundary          │
//! │                                                                         │
//! │  crown-receiving errors (separate crate)                               │
//! │  └── ReceivingError   - Session, config and save failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ReceivingError → Operator         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Not everything odd is an error. Negative quantities are normalized to
//! zero and `total_qty = 0` yields a zero cost price; neither surfaces here.

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Costing and receipt errors.
///
/// Every variant is raised before any state is touched, so the line or
/// receipt that produced it is still in its prior state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A retail price was typed before the line had a trade price.
    ///
    /// ## When This Occurs
    /// - Operator enters a retail price on a freshly scanned product with
    ///   no trade price yet
    /// - Trade price is set but a 100% discount zeroes the discounted trade
    ///
    /// ## User Workflow
    /// ```text
    /// Retail cell edited: 120.00
    ///      │
    ///      ▼
    /// discounted_trade == 0 → back-solve would divide by zero
    ///      │
    ///      ▼
    /// UI shows: "Set trade price first"
    /// ```
    #[error("Set trade price first")]
    TradePriceNotSet,

    /// The receipt has no lines to post.
    #[error("Goods receipt {receipt_number} has no lines")]
    EmptyReceipt { receipt_number: String },

    /// A line landed zero units (received + FOC) and cannot be posted.
    #[error("Line {line} for product {product_id} has no received or FOC quantity")]
    NothingReceived { line: usize, product_id: String },

    /// Line id is not part of this receipt.
    #[error("Receipt line not found: {0}")]
    LineNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the caller boundary (line setters, receipt header) so the pure
/// costing functions can trust their input contract.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: Decimal,
        max: Decimal,
    },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., receipt number with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
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
    fn test_trade_price_not_set_message() {
        assert_eq!(CoreError::TradePriceNotSet.to_string(), "Set trade price first");
    }

    #[test]
    fn test_nothing_received_message() {
        let err = CoreError::NothingReceived {
            line: 2,
            product_id: "P-7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Line 2 for product P-7 has no received or FOC quantity"
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let err = ValidationError::OutOfRange {
            field: "discount_percent".to_string(),
            min: Decimal::ZERO,
            max: Decimal::ONE_HUNDRED,
        };
        assert_eq!(err.to_string(), "discount_percent must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustNotBeNegative {
            field: "retail_price".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
