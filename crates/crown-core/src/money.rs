//! # Money Module
//!
//! Decimal helpers shared by the costing engine and the receipt records.
//!
//! ## Why Decimal, Not Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RECEIVING NEEDS SUB-CENT PRECISION                                     │
//! │                                                                         │
//! │  Buy 50 @ 42.50, get 10 free:                                           │
//! │    cost_price = 50 × 42.50 / 60 = 35.41666…                            │
//! │                                                                         │
//! │  Rounding to cents mid-calculation compounds across margin and stock   │
//! │  valuation. We keep full precision through the engine and round ONCE,  │
//! │  when a record is handed to the persistence layer.                     │
//! │                                                                         │
//! │  Floats are out: 0.1 + 0.2 != 0.3                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary value to `dp` decimal places, half away from zero.
///
/// ## Example
/// ```rust
/// use crown_core::money::round_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_money(dec!(49.725), 2), dec!(49.73));
/// assert_eq!(round_money(dec!(35.416666), 2), dec!(35.42));
/// ```
pub fn round_money(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `rate` percent of `amount`.
///
/// ## Example
/// ```rust
/// use crown_core::money::percent_of;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(percent_of(dec!(10000), dec!(5)), dec!(500));
/// ```
#[inline]
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    amount * rate / Decimal::ONE_HUNDRED
}

/// Clamps a value to zero from below.
#[inline]
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Formats an amount with a currency symbol for logs and receipts.
///
/// Display formatting for the grid belongs to the UI; this is for
/// operator-facing messages.
///
/// ## Example
/// ```rust
/// use crown_core::money::format_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_money(dec!(105.3), "Rs.", 2), "Rs. 105.30");
/// assert_eq!(format_money(dec!(-5.5), "Rs.", 2), "-Rs. 5.50");
/// ```
pub fn format_money(amount: Decimal, symbol: &str, dp: u32) -> String {
    let rounded = round_money(amount, dp);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!(
        "{}{} {:.prec$}",
        sign,
        symbol,
        rounded.abs(),
        prec = dp as usize
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
