//! Order suggestions under the configured cover window.

use crown_core::ordering::{suggest_order, OrderSuggestion};
use crown_core::ProductMaster;
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::OrderingSettings;

/// Suggests how much of `product` to order.
///
/// `daily_consumption` is the product's sold quantity per day, any length.
pub fn suggest_for_product(
    settings: &OrderingSettings,
    product: &ProductMaster,
    daily_consumption: &[Decimal],
    lead_time_days: u32,
) -> OrderSuggestion {
    let suggestion = suggest_order(
        daily_consumption,
        product.stock,
        lead_time_days,
        settings.cover_days,
    );
    debug!(
        product_id = %product.id,
        stock = %product.stock,
        average = %suggestion.average_daily_consumption,
        suggested_qty = %suggestion.suggested_qty,
        "Order suggestion computed"
    );
    suggestion
}
