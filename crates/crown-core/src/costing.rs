//! # Costing Module
//!
//! The goods-receipt costing engine: pure functions from a line's inputs to
//! its discounted trade, retail price, tax amount and amortized cost price.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Per-Line Recompute                                   │
//! │                                                                         │
//! │  trade_price, discount_percent                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  apply_discount ──► discounted_trade                                   │
//! │       │                                                                 │
//! │       ├──────────────────────────────┐                                  │
//! │       ▼                              ▼                                  │
//! │  forward_retail                   amortized_cost                        │
//! │  (gst_rate, convention)           (received_qty, foc_qty)               │
//! │       │                              │                                  │
//! │       ▼                              ▼                                  │
//! │  retail_price, tax_amount         cost_price, total_qty                 │
//! │                                                                         │
//! │  Both branches depend only on discounted_trade; order between them     │
//! │  is irrelevant.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tax Conventions
//! ```text
//! EXCLUSIVE (GST on trade):  retail = dt × (1 + g/100)    tax = dt × g/100
//! INCLUSIVE (GST in retail): retail = dt                  tax = retail × g/(100+g)
//! ```
//!
//! Every function here trusts its input contract. Range checks live in
//! [`crate::validation`] and are applied by [`crate::line::ReceiptLine`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::percent_of;
use crate::types::TaxConvention;
use crate::validation::{validate_gst_rate, validate_retail_price};
use crate::MAX_GST_RATE;

// =============================================================================
// Outputs
// =============================================================================

/// Derived values for one receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineCosting {
    /// Net unit cost before tax.
    #[ts(as = "String")]
    pub discounted_trade: Decimal,

    /// Unit selling price, tax included under either convention.
    #[ts(as = "String")]
    pub retail_price: Decimal,

    /// Tax portion of the retail price.
    #[ts(as = "String")]
    pub tax_amount: Decimal,

    /// Amortized unit cost, FOC units included.
    #[ts(as = "String")]
    pub cost_price: Decimal,

    /// Units added to stock (received + FOC), in purchase units.
    #[ts(as = "String")]
    pub total_qty: Decimal,
}

/// Margin figures shown beside a line while receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitMetrics {
    /// retail_price − cost_price.
    #[ts(as = "String")]
    pub profit_per_unit: Decimal,

    /// Markup over cost in percent; 0 when cost_price is 0 or the ratio is
    /// too large to represent.
    #[ts(as = "String")]
    pub margin_percent: Decimal,

    /// Amount owed to the supplier for the paid units.
    #[ts(as = "String")]
    pub total_paid: Decimal,

    /// Profit if every received and FOC unit sells at retail.
    #[ts(as = "String")]
    pub total_potential_profit: Decimal,
}

/// Result of back-solving a manually typed retail price.
///
/// `retail_price` and `tax_amount` are what the forward formula yields for
/// the solved rate and convention, i.e. what the line shows afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetailOverride {
    pub tax_convention: TaxConvention,
    pub gst_rate: Decimal,
    pub retail_price: Decimal,
    pub tax_amount: Decimal,
}

// =============================================================================
// Discount
// =============================================================================

/// Applies a percentage discount to the trade price.
///
/// ## Example
/// ```rust
/// use crown_core::costing::apply_discount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(apply_discount(dec!(50), dec!(15)), dec!(42.50));
/// ```
#[inline]
pub fn apply_discount(trade_price: Decimal, discount_percent: Decimal) -> Decimal {
    trade_price * (Decimal::ONE - discount_percent / Decimal::ONE_HUNDRED)
}

// =============================================================================
// Retail (forward)
// =============================================================================

/// Computes retail price and tax amount from the discounted trade.
///
/// Returns `(retail_price, tax_amount)`.
///
/// ## Example
/// ```rust
/// use crown_core::costing::forward_retail;
/// use crown_core::TaxConvention;
/// use rust_decimal_macros::dec;
///
/// let (retail, tax) = forward_retail(dec!(90), dec!(17), TaxConvention::Exclusive);
/// assert_eq!(retail, dec!(105.30));
/// assert_eq!(tax, dec!(15.30));
///
/// let (retail, tax) = forward_retail(dec!(117), dec!(17), TaxConvention::Inclusive);
/// assert_eq!(retail, dec!(117));
/// assert_eq!(tax, dec!(17));
/// ```
pub fn forward_retail(
    discounted_trade: Decimal,
    gst_rate: Decimal,
    convention: TaxConvention,
) -> (Decimal, Decimal) {
    match convention {
        TaxConvention::Exclusive => {
            let tax = percent_of(discounted_trade, gst_rate);
            (discounted_trade + tax, tax)
        }
        TaxConvention::Inclusive => {
            let retail = discounted_trade;
            (retail, embedded_tax(retail, gst_rate))
        }
    }
}

/// Tax embedded in a tax-inclusive price: `price × g / (100 + g)`.
#[inline]
pub fn embedded_tax(price: Decimal, gst_rate: Decimal) -> Decimal {
    price * gst_rate / (Decimal::ONE_HUNDRED + gst_rate)
}

// =============================================================================
// Retail (reverse)
// =============================================================================

/// Back-solves convention and GST rate from a manually typed retail price.
///
/// ## Rules
/// ```text
/// new_retail ≥ discounted_trade → EXCLUSIVE, g = (new_retail / dt − 1) × 100
/// new_retail <  discounted_trade → INCLUSIVE, g = default_gst_rate
/// discounted_trade = 0           → TradePriceNotSet
/// g > MAX_GST_RATE               → Validation (OutOfRange gst_rate)
/// ```
///
/// Under the inclusive forward formula retail equals discounted trade for
/// every rate, so no rate reproduces a retail below trade. The rate falls
/// back to the store default and the line's retail becomes the discounted
/// trade; the typed price is not kept.
///
/// ## Example
/// ```rust
/// use crown_core::costing::back_solve_retail;
/// use crown_core::TaxConvention;
/// use rust_decimal_macros::dec;
///
/// let solved = back_solve_retail(dec!(120), dec!(100), dec!(17)).unwrap();
/// assert_eq!(solved.tax_convention, TaxConvention::Exclusive);
/// assert_eq!(solved.gst_rate, dec!(20));
///
/// let solved = back_solve_retail(dec!(80), dec!(100), dec!(17)).unwrap();
/// assert_eq!(solved.tax_convention, TaxConvention::Inclusive);
/// assert_eq!(solved.retail_price, dec!(100));
///
/// assert!(back_solve_retail(dec!(120), dec!(0), dec!(17)).is_err());
/// ```
pub fn back_solve_retail(
    new_retail: Decimal,
    discounted_trade: Decimal,
    default_gst_rate: Decimal,
) -> CoreResult<RetailOverride> {
    validate_retail_price(new_retail)?;

    if discounted_trade.is_zero() {
        return Err(CoreError::TradePriceNotSet);
    }

    let (tax_convention, gst_rate) = if new_retail >= discounted_trade {
        let rate = new_retail
            .checked_div(discounted_trade)
            .and_then(|ratio| (ratio - Decimal::ONE).checked_mul(Decimal::ONE_HUNDRED))
            .filter(|rate| *rate <= MAX_GST_RATE)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "gst_rate".to_string(),
                min: Decimal::ZERO,
                max: MAX_GST_RATE,
            })?;
        (TaxConvention::Exclusive, rate)
    } else {
        validate_gst_rate(default_gst_rate)?;
        (TaxConvention::Inclusive, default_gst_rate)
    };

    let (retail_price, tax_amount) = forward_retail(discounted_trade, gst_rate, tax_convention);
    Ok(RetailOverride {
        tax_convention,
        gst_rate,
        retail_price,
        tax_amount,
    })
}

// =============================================================================
// Cost (FOC amortization)
// =============================================================================

/// Spreads the paid value over paid and free units.
///
/// Returns `(cost_price, total_qty)`. Nothing received yields a zero cost.
///
/// ## Example
/// ```rust
/// use crown_core::costing::amortized_cost;
/// use rust_decimal_macros::dec;
///
/// // Buy 10 @ 90, get 2 free
/// assert_eq!(amortized_cost(dec!(10), dec!(2), dec!(90)), (dec!(75), dec!(12)));
/// assert_eq!(amortized_cost(dec!(0), dec!(0), dec!(90)), (dec!(0), dec!(0)));
/// ```
pub fn amortized_cost(
    received_qty: Decimal,
    foc_qty: Decimal,
    discounted_trade: Decimal,
) -> (Decimal, Decimal) {
    let total_qty = received_qty + foc_qty;
    if total_qty <= Decimal::ZERO {
        return (Decimal::ZERO, total_qty);
    }
    (received_qty * discounted_trade / total_qty, total_qty)
}

// =============================================================================
// Full line
// =============================================================================

/// Computes every derived value for a receipt line.
///
/// Pure and deterministic: identical inputs give identical outputs.
pub fn compute_line(
    trade_price: Decimal,
    discount_percent: Decimal,
    gst_rate: Decimal,
    tax_convention: TaxConvention,
    received_qty: Decimal,
    foc_qty: Decimal,
) -> LineCosting {
    let discounted_trade = apply_discount(trade_price, discount_percent);
    let (retail_price, tax_amount) = forward_retail(discounted_trade, gst_rate, tax_convention);
    let (cost_price, total_qty) = amortized_cost(received_qty, foc_qty, discounted_trade);

    LineCosting {
        discounted_trade,
        retail_price,
        tax_amount,
        cost_price,
        total_qty,
    }
}

/// Profit figures for a computed line.
pub fn profit_metrics(costing: &LineCosting, received_qty: Decimal) -> ProfitMetrics {
    let profit_per_unit = costing.retail_price - costing.cost_price;
    let margin_percent = if costing.cost_price > Decimal::ZERO {
        profit_per_unit
            .checked_div(costing.cost_price)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    ProfitMetrics {
        profit_per_unit,
        margin_percent,
        total_paid: received_qty * costing.discounted_trade,
        total_potential_profit: profit_per_unit * costing.total_qty,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
