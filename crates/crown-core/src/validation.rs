//! # Validation Module
//!
//! Caller-boundary checks for receiving inputs.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Receiving grid (external)                                    │
//! │  └── Numeric cell formats                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: ReceiptLine setters / GoodsReceipt header                    │
//! │  └── THIS MODULE: ranges, signs, normalization                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: costing.rs                                                   │
//! │  └── Trusts its contract; no checks, no errors                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use crown_core::validation::{normalize_quantity, validate_discount_percent};
//! use rust_decimal_macros::dec;
//!
//! assert!(validate_discount_percent(dec!(10)).is_ok());
//! assert!(validate_discount_percent(dec!(120)).is_err());
//! assert_eq!(normalize_quantity(dec!(-4)), dec!(0));
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::{
    MAX_GST_RATE, MAX_PERCENT, MAX_PRICE, MAX_QUANTITY, MAX_RECEIPT_NUMBER_LEN, MAX_UOM_FACTOR,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_range(field: &str, value: Decimal, max: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: Decimal::ZERO,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Percentages
// =============================================================================

/// Validates a supplier discount percentage (0 to 100 inclusive).
pub fn validate_discount_percent(percent: Decimal) -> ValidationResult<()> {
    check_range("discount_percent", percent, MAX_PERCENT)
}

/// Validates a GST rate in percent.
///
/// Any non-negative rate up to [`MAX_GST_RATE`] is accepted, the same range
/// a retail override can derive.
pub fn validate_gst_rate(rate: Decimal) -> ValidationResult<()> {
    check_range("gst_rate", rate, MAX_GST_RATE)
}

/// Validates a withholding tax rate in percent (0 to 100 inclusive).
///
/// ## Example
/// ```rust
/// use crown_core::validation::validate_withholding_rate;
/// use rust_decimal_macros::dec;
///
/// assert!(validate_withholding_rate(dec!(4.5)).is_ok());
/// assert!(validate_withholding_rate(dec!(-1)).is_err());
/// ```
pub fn validate_withholding_rate(rate: Decimal) -> ValidationResult<()> {
    check_range("withholding_tax_rate", rate, MAX_PERCENT)
}

// =============================================================================
// Prices and quantities
// =============================================================================

fn check_price(field: &str, price: Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    check_range(field, price, MAX_PRICE)
}

/// Validates a trade price typed by the operator (0 to [`MAX_PRICE`]).
pub fn validate_trade_price(price: Decimal) -> ValidationResult<()> {
    check_price("trade_price", price)
}

/// Validates a manually entered retail price (0 to [`MAX_PRICE`]).
pub fn validate_retail_price(price: Decimal) -> ValidationResult<()> {
    check_price("retail_price", price)
}

/// Validates a unit-of-measure conversion factor.
///
/// ## Rules
/// - Must be strictly positive (a box holds at least some pieces)
/// - At most [`MAX_UOM_FACTOR`]
pub fn validate_uom_factor(factor: Decimal) -> ValidationResult<()> {
    if factor <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "uom_factor".to_string(),
        });
    }
    check_range("uom_factor", factor, MAX_UOM_FACTOR)
}

/// Normalizes a received or FOC quantity.
///
/// Negative quantities are a data-entry slip, not an error: they become 0.
#[inline]
pub fn normalize_quantity(qty: Decimal) -> Decimal {
    qty.max(Decimal::ZERO)
}

/// Normalizes a received or FOC quantity and rejects one above
/// [`MAX_QUANTITY`].
pub fn validate_quantity(field: &str, qty: Decimal) -> ValidationResult<Decimal> {
    let qty = normalize_quantity(qty);
    check_range(field, qty, MAX_QUANTITY)?;
    Ok(qty)
}

// =============================================================================
// Identifiers
// =============================================================================

/// Validates a goods receipt number such as `GRN-20250114-0A1B2C`.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, underscores only
pub fn validate_receipt_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "receipt_number".to_string(),
        });
    }

    if number.len() > MAX_RECEIPT_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "receipt_number".to_string(),
            max: MAX_RECEIPT_NUMBER_LEN,
        });
    }

    if !number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "receipt_number".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
