//! # Order Suggestion
//!
//! Proposes purchase quantities from historical consumption. Plain
//! averaging: no seasonality, no safety-stock statistics.
//!
//! ```text
//! avg_daily  = Σ daily consumption / days of history
//! demand     = avg_daily × (lead_time_days + cover_days)
//! suggestion = ceil(max(0, demand − current_stock))
//! ```

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::non_negative;

/// Suggested purchase quantity for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSuggestion {
    #[ts(as = "String")]
    pub average_daily_consumption: Decimal,

    /// Expected consumption until the next delivery covers the window.
    #[ts(as = "String")]
    pub projected_demand: Decimal,

    /// Whole units to order; 0 when stock already covers demand.
    #[ts(as = "String")]
    pub suggested_qty: Decimal,
}

/// Suggests an order quantity from daily consumption history.
///
/// ## Example
/// ```rust
/// use crown_core::ordering::suggest_order;
/// use rust_decimal_macros::dec;
///
/// // ~4 a day, 3 days lead time, cover a week, 10 on the shelf
/// let s = suggest_order(&[dec!(3), dec!(5), dec!(4)], dec!(10), 3, 7);
/// assert_eq!(s.average_daily_consumption, dec!(4));
/// assert_eq!(s.suggested_qty, dec!(30));
/// ```
pub fn suggest_order(
    daily_consumption: &[Decimal],
    current_stock: Decimal,
    lead_time_days: u32,
    cover_days: u32,
) -> OrderSuggestion {
    if daily_consumption.is_empty() {
        return OrderSuggestion {
            average_daily_consumption: Decimal::ZERO,
            projected_demand: Decimal::ZERO,
            suggested_qty: Decimal::ZERO,
        };
    }

    let total: Decimal = daily_consumption.iter().copied().sum();
    let average = non_negative(total / Decimal::from(daily_consumption.len()));
    let window = Decimal::from(lead_time_days) + Decimal::from(cover_days);
    let projected_demand = average * window;

    OrderSuggestion {
        average_daily_consumption: average,
        projected_demand,
        suggested_qty: non_negative(projected_demand - current_stock).ceil(),
    }
}

/// Returns the next supplier ordering day on or after `today`.
///
/// `None` when the supplier has no ordering days configured.
pub fn next_order_day(order_days: &[Weekday], today: NaiveDate) -> Option<NaiveDate> {
    (0..7)
        .map(|offset| today + Duration::days(offset))
        .find(|date| order_days.contains(&date.weekday()))
}

// =============================================================================
// Unit Tests
// =============================================================================
