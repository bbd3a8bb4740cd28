//! # Goods Receipt
//!
//! A draft goods receipt: header values plus the lines being received, and
//! the all-or-nothing conversion into persisted records.
//!
//! ## Finalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    GoodsReceipt::finalize                               │
//! │                                                                         │
//! │  1. Validate EVERY line first                                          │
//! │     ├── no lines?            → EmptyReceipt                            │
//! │     └── received + FOC = 0?  → NothingReceived { line }                │
//! │           (first failure aborts; no record is produced)                │
//! │                                                                         │
//! │  2. Convert lines (consumed)                                           │
//! │     ├── one GoodsReceiptItem per line                                  │
//! │     └── ProductPriceUpdate merged per product                          │
//! │           stock increments summed, latest line's prices win            │
//! │                                                                         │
//! │  3. Header                                                             │
//! │     total_amount − withholding = net_payable                           │
//! │     withholding > 0 → pending WithholdingTaxRecord                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::line::ReceiptLine;
use crate::money::{percent_of, round_money};
use crate::types::{
    GoodsReceiptItem, GoodsReceiptRecord, ProductPriceUpdate, WithholdingStatus,
    WithholdingTaxRecord,
};
use crate::validation::{validate_receipt_number, validate_withholding_rate};

// =============================================================================
// Totals
// =============================================================================

/// Running totals shown under the receiving grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptTotals {
    pub line_count: usize,

    /// Σ received_qty × discounted_trade (FOC units cost nothing).
    #[ts(as = "String")]
    pub total_amount: Decimal,

    /// Σ retail_price × total_qty.
    #[ts(as = "String")]
    pub total_retail_value: Decimal,

    /// Σ units landing in stock, in base units.
    #[ts(as = "String")]
    pub total_base_units: Decimal,

    #[ts(as = "String")]
    pub withholding_tax_rate: Decimal,

    #[ts(as = "String")]
    pub withholding_tax_amount: Decimal,

    /// total_amount − withholding_tax_amount.
    #[ts(as = "String")]
    pub net_payable: Decimal,
}

// =============================================================================
// Finalized output
// =============================================================================

/// Everything the persistence layer writes for one receipt, in one
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinalizedReceipt {
    pub record: GoodsReceiptRecord,
    pub items: Vec<GoodsReceiptItem>,
    pub product_updates: Vec<ProductPriceUpdate>,
    pub withholding: Option<WithholdingTaxRecord>,
}

// =============================================================================
// Goods Receipt
// =============================================================================

/// A goods receipt under construction.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct GoodsReceipt {
    id: String,
    receipt_number: String,
    supplier_id: String,
    po_id: Option<String>,
    #[ts(as = "String")]
    withholding_tax_rate: Decimal,
    lines: Vec<ReceiptLine>,
}

impl GoodsReceipt {
    /// Starts a receipt. `po_id = None` marks a direct receipt.
    pub fn new(
        receipt_number: impl Into<String>,
        supplier_id: impl Into<String>,
        po_id: Option<String>,
    ) -> CoreResult<Self> {
        let receipt_number = receipt_number.into();
        validate_receipt_number(&receipt_number)?;

        Ok(GoodsReceipt {
            id: Uuid::new_v4().to_string(),
            receipt_number,
            supplier_id: supplier_id.into(),
            po_id,
            withholding_tax_rate: Decimal::ZERO,
            lines: Vec::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn receipt_number(&self) -> &str {
        &self.receipt_number
    }

    pub fn supplier_id(&self) -> &str {
        &self.supplier_id
    }

    pub fn po_id(&self) -> Option<&str> {
        self.po_id.as_deref()
    }

    pub fn is_direct(&self) -> bool {
        self.po_id.is_none()
    }

    pub fn withholding_tax_rate(&self) -> Decimal {
        self.withholding_tax_rate
    }

    pub fn set_withholding_tax_rate(&mut self, rate: Decimal) -> CoreResult<()> {
        validate_withholding_rate(rate)?;
        self.withholding_tax_rate = rate;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Lines
    // -------------------------------------------------------------------------

    /// Appends a line and returns its id.
    pub fn add_line(&mut self, line: ReceiptLine) -> String {
        let id = line.id().to_string();
        self.lines.push(line);
        id
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&ReceiptLine> {
        self.lines.iter().find(|l| l.id() == line_id)
    }

    pub fn line_mut(&mut self, line_id: &str) -> CoreResult<&mut ReceiptLine> {
        self.lines
            .iter_mut()
            .find(|l| l.id() == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))
    }

    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<ReceiptLine> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.id() == line_id)
            .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;
        Ok(self.lines.remove(idx))
    }

    // -------------------------------------------------------------------------
    // Totals & finalization
    // -------------------------------------------------------------------------

    /// Computes the receipt totals at full precision.
    pub fn totals(&self) -> ReceiptTotals {
        let mut totals = ReceiptTotals {
            line_count: self.lines.len(),
            withholding_tax_rate: self.withholding_tax_rate,
            ..ReceiptTotals::default()
        };

        for line in &self.lines {
            let costing = line.costing();
            totals.total_amount += line.inputs().received_qty * costing.discounted_trade;
            totals.total_retail_value += costing.retail_price * costing.total_qty;
            totals.total_base_units += line.base_quantity();
        }

        totals.withholding_tax_amount = percent_of(totals.total_amount, self.withholding_tax_rate);
        totals.net_payable = totals.total_amount - totals.withholding_tax_amount;
        totals
    }

    /// Checks that every line can be posted.
    pub fn validate(&self) -> CoreResult<()> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyReceipt {
                receipt_number: self.receipt_number.clone(),
            });
        }

        for (idx, line) in self.lines.iter().enumerate() {
            if line.costing().total_qty <= Decimal::ZERO {
                return Err(CoreError::NothingReceived {
                    line: idx + 1,
                    product_id: line.product_id().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Converts the receipt into persisted records. All-or-nothing: any
    /// invalid line aborts before a single record is produced.
    pub fn finalize(
        self,
        received_by: &str,
        received_at: DateTime<Utc>,
        price_decimals: u32,
    ) -> CoreResult<FinalizedReceipt> {
        if received_by.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "received_by".to_string(),
            }
            .into());
        }
        self.validate()?;

        let totals = self.totals();
        let total_amount = round_money(totals.total_amount, price_decimals);
        let withholding_tax_amount = round_money(totals.withholding_tax_amount, price_decimals);

        let mut items = Vec::with_capacity(self.lines.len());
        let mut product_updates: Vec<ProductPriceUpdate> = Vec::new();
        let mut by_product: HashMap<String, usize> = HashMap::new();

        for line in self.lines {
            let (item, update) = line.finalize(&self.id, price_decimals);
            items.push(item);

            match by_product.get(&update.product_id) {
                Some(&idx) => {
                    let merged = &mut product_updates[idx];
                    merged.stock_increment += update.stock_increment;
                    merged.cost_price = update.cost_price;
                    merged.selling_price = update.selling_price;
                    merged.gst_rate = update.gst_rate;
                    merged.tax_convention = update.tax_convention;
                }
                None => {
                    by_product.insert(update.product_id.clone(), product_updates.len());
                    product_updates.push(update);
                }
            }
        }

        let withholding = (withholding_tax_amount > Decimal::ZERO).then(|| WithholdingTaxRecord {
            receipt_id: self.id.clone(),
            tax_amount: withholding_tax_amount,
            tax_date: received_at,
            status: WithholdingStatus::Pending,
        });

        let record = GoodsReceiptRecord {
            is_direct_receipt: self.po_id.is_none(),
            id: self.id,
            receipt_number: self.receipt_number,
            po_id: self.po_id,
            supplier_id: self.supplier_id,
            total_amount,
            net_payable: total_amount - withholding_tax_amount,
            withholding_tax_rate: self.withholding_tax_rate,
            withholding_tax_amount,
            received_by: received_by.to_string(),
            received_at,
        };

        Ok(FinalizedReceipt {
            record,
            items,
            product_updates,
            withholding,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
