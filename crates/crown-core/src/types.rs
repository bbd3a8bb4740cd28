//! # Domain Types
//!
//! Types that cross the engine boundary: what collaborators hand in (product
//! master, purchase order lines) and what they take away (receipt records,
//! product price updates).
//!
//! ## Type Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Receiving Data Flow                             │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐                           │
//! │  │  ProductMaster   │   │ PurchaseOrderLine│   INPUTS                  │
//! │  │  trade, GST,     │   │ ordered, already │                           │
//! │  │  TaxConvention   │   │ received, trade  │                           │
//! │  └────────┬─────────┘   └────────┬─────────┘                           │
//! │           └──────────┬───────────┘                                      │
//! │                      ▼                                                  │
//! │              ReceiptLine (line.rs) ── edited, recomputed               │
//! │                      │                                                  │
//! │                      ▼  finalize (receipt.rs)                           │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ GoodsReceiptItem │   │ProductPriceUpdate│   │WithholdingTax    │    │
//! │  │ per line         │   │ per product      │   │Record (optional) │    │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘    │
//! │                                                          OUTPUTS        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Tax Convention
// =============================================================================

/// How GST is quoted by the supplier for a line.
///
/// The convention is a property of the supplier's quote, chosen explicitly
/// per line. It is never inferred from a displayed retail price, except by
/// the manual retail override (see [`crate::costing::back_solve_retail`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxConvention {
    /// GST applicable on trade price: added on top of the discounted trade.
    #[default]
    Exclusive,
    /// GST included in retail price: the discounted trade already carries it.
    Inclusive,
}

impl std::fmt::Display for TaxConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxConvention::Exclusive => write!(f, "exclusive"),
            TaxConvention::Inclusive => write!(f, "inclusive"),
        }
    }
}

impl std::str::FromStr for TaxConvention {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exclusive" | "on_trade" | "on-trade" => Ok(TaxConvention::Exclusive),
            "inclusive" | "in_retail" | "in-retail" => Ok(TaxConvention::Inclusive),
            other => Err(ValidationError::InvalidFormat {
                field: "tax_convention".to_string(),
                reason: format!("unknown convention '{}', expected exclusive or inclusive", other),
            }),
        }
    }
}

// =============================================================================
// Inputs from collaborators
// =============================================================================

/// Product master snapshot used to seed a manually scanned line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductMaster {
    pub id: String,
    pub name: String,
    pub barcode: Option<String>,

    /// Last known supplier trade price per purchase unit.
    #[ts(as = "String")]
    pub trade_price: Decimal,

    /// GST rate in percent (17 = 17%).
    #[ts(as = "String")]
    pub gst_rate: Decimal,

    pub tax_convention: TaxConvention,

    /// Base units per purchase unit (1 box = 12 pieces → 12).
    #[ts(as = "String")]
    pub uom_factor: Decimal,

    /// Current stock in base units.
    #[ts(as = "String")]
    pub stock: Decimal,
}

/// A purchase order item awaiting receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrderLine {
    pub product_id: String,

    #[ts(as = "String")]
    pub quantity_ordered: Decimal,

    /// Quantity already landed by earlier partial receipts.
    #[ts(as = "String")]
    pub quantity_received: Decimal,

    /// Supplier trade price agreed on the PO.
    #[ts(as = "String")]
    pub trade_price: Decimal,
}

impl PurchaseOrderLine {
    /// Quantity still outstanding on this PO line, never negative.
    pub fn outstanding(&self) -> Decimal {
        (self.quantity_ordered - self.quantity_received).max(Decimal::ZERO)
    }
}

/// A purchase order being received against.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub po_number: String,
    pub supplier_id: String,
    pub lines: Vec<PurchaseOrderLine>,
}

// =============================================================================
// Outputs for the persistence layer
// =============================================================================

/// Persisted goods-receipt header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GoodsReceiptRecord {
    pub id: String,
    pub receipt_number: String,
    pub po_id: Option<String>,
    pub supplier_id: String,

    /// Amount owed before withholding: Σ received_qty × discounted_trade.
    #[ts(as = "String")]
    pub total_amount: Decimal,

    #[ts(as = "String")]
    pub net_payable: Decimal,

    #[ts(as = "String")]
    pub withholding_tax_rate: Decimal,

    #[ts(as = "String")]
    pub withholding_tax_amount: Decimal,

    pub received_by: String,

    #[ts(as = "String")]
    pub received_at: DateTime<Utc>,

    /// True when received without a purchase order.
    pub is_direct_receipt: bool,
}

/// Persisted goods-receipt line.
///
/// Snapshot of the finalized `ReceiptLine`, rounded to currency precision.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GoodsReceiptItem {
    pub id: String,
    pub receipt_id: String,
    pub product_id: String,

    #[ts(as = "String")]
    pub quantity_received: Decimal,

    #[ts(as = "String")]
    pub foc_quantity: Decimal,

    /// (received + FOC) × uom_factor.
    #[ts(as = "String")]
    pub quantity_in_base_uom: Decimal,

    #[ts(as = "String")]
    pub trade_price: Decimal,

    #[ts(as = "String")]
    pub discount_percent: Decimal,

    #[ts(as = "String")]
    pub gst_rate: Decimal,

    pub tax_convention: TaxConvention,

    #[ts(as = "String")]
    pub retail_price: Decimal,

    #[ts(as = "String")]
    pub cost_price: Decimal,

    #[ts(as = "String")]
    pub tax_amount: Decimal,
}

/// Product record update applied atomically with the receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPriceUpdate {
    pub product_id: String,

    /// Stock increment in base units.
    #[ts(as = "String")]
    pub stock_increment: Decimal,

    /// Latest cost price (replaces the product's cost price).
    #[ts(as = "String")]
    pub cost_price: Decimal,

    /// Latest retail price (replaces the product's selling price).
    #[ts(as = "String")]
    pub selling_price: Decimal,

    #[ts(as = "String")]
    pub gst_rate: Decimal,

    pub tax_convention: TaxConvention,
}

/// Status of a withholding tax liability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WithholdingStatus {
    #[default]
    Pending,
    Paid,
}

/// Withholding tax retained from a supplier payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WithholdingTaxRecord {
    pub receipt_id: String,

    #[ts(as = "String")]
    pub tax_amount: Decimal,

    #[ts(as = "String")]
    pub tax_date: DateTime<Utc>,

    pub status: WithholdingStatus,
}

// =============================================================================
// Unit Tests
// =============================================================================
