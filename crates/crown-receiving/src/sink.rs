//! # Receipt Sink
//!
//! The seam between a finalized receipt and whatever stores it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Commit Contract                                   │
//! │                                                                         │
//! │  FinalizedReceipt ──► ReceiptSink::commit                               │
//! │                          │                                              │
//! │                          ├─ Ok(())  every record and product update     │
//! │                          │          applied                             │
//! │                          │                                              │
//! │                          └─ Err(_)  NOTHING applied; the session keeps  │
//! │                                     its draft and may try again         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A database-backed sink runs the receipt header, items, product updates
//! and withholding record in one transaction. [`MemoryLedger`] does the same
//! in memory: validate everything, then apply everything.

use std::collections::{HashMap, HashSet};

use crown_core::{FinalizedReceipt, ProductMaster, TaxConvention};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// Receives finalized goods receipts.
pub trait ReceiptSink {
    /// Applies the whole receipt or nothing.
    fn commit(&mut self, receipt: &FinalizedReceipt) -> Result<(), SinkError>;
}

/// Product fields touched by receiving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub product_id: String,
    /// Stock in base units.
    pub stock: Decimal,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub gst_rate: Decimal,
    pub tax_convention: TaxConvention,
}

impl From<&ProductMaster> for StockRecord {
    fn from(product: &ProductMaster) -> Self {
        StockRecord {
            product_id: product.id.clone(),
            stock: product.stock,
            cost_price: product.trade_price,
            selling_price: Decimal::ZERO,
            gst_rate: product.gst_rate,
            tax_convention: product.tax_convention,
        }
    }
}

/// In-memory product ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    products: HashMap<String, StockRecord>,
    receipt_numbers: HashSet<String>,
    receipts: Vec<FinalizedReceipt>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger holding the given products.
    pub fn with_products<'a>(products: impl IntoIterator<Item = &'a ProductMaster>) -> Self {
        let mut ledger = Self::new();
        for product in products {
            ledger.insert_product(StockRecord::from(product));
        }
        ledger
    }

    pub fn insert_product(&mut self, record: StockRecord) {
        self.products.insert(record.product_id.clone(), record);
    }

    pub fn product(&self, product_id: &str) -> Option<&StockRecord> {
        self.products.get(product_id)
    }

    /// Committed receipts, oldest first.
    pub fn receipts(&self) -> &[FinalizedReceipt] {
        &self.receipts
    }
}

impl ReceiptSink for MemoryLedger {
    fn commit(&mut self, receipt: &FinalizedReceipt) -> Result<(), SinkError> {
        // Validate everything before touching anything
        if self.receipt_numbers.contains(&receipt.record.receipt_number) {
            return Err(SinkError::Rejected(format!(
                "receipt number {} already posted",
                receipt.record.receipt_number
            )));
        }
        if let Some(missing) = receipt
            .product_updates
            .iter()
            .find(|u| !self.products.contains_key(&u.product_id))
        {
            return Err(SinkError::Rejected(format!(
                "unknown product {}",
                missing.product_id
            )));
        }

        for update in &receipt.product_updates {
            if let Some(record) = self.products.get_mut(&update.product_id) {
                record.stock += update.stock_increment;
                record.cost_price = update.cost_price;
                record.selling_price = update.selling_price;
                record.gst_rate = update.gst_rate;
                record.tax_convention = update.tax_convention;
            }
        }

        self.receipt_numbers
            .insert(receipt.record.receipt_number.clone());
        self.receipts.push(receipt.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crown_core::{GoodsReceipt, LineInputs, ReceiptLine};
    use rust_decimal_macros::dec;

    fn product(id: &str, stock: Decimal) -> ProductMaster {
        ProductMaster {
            id: id.to_string(),
            name: id.to_string(),
            barcode: None,
            trade_price: dec!(50),
            gst_rate: dec!(17),
            tax_convention: TaxConvention::Exclusive,
            uom_factor: dec!(1),
            stock,
        }
    }

    fn finalized(number: &str, product_ids: &[&str]) -> FinalizedReceipt {
        let mut receipt = GoodsReceipt::new(number, "SUP-1", None).unwrap();
        for id in product_ids {
            let inputs = LineInputs {
                trade_price: dec!(100),
                discount_percent: dec!(10),
                gst_rate: dec!(17),
                received_qty: dec!(10),
                foc_qty: dec!(2),
                ..LineInputs::default()
            };
            receipt.add_line(ReceiptLine::new(*id, *id, inputs).unwrap());
        }
        receipt.finalize("tester", Utc::now(), 2).unwrap()
    }

    #[test]
    fn test_commit_applies_updates() {
        let mut ledger = MemoryLedger::with_products(&[product("P-1", dec!(5))]);

        ledger.commit(&finalized("GRN-1", &["P-1"])).unwrap();

        let record = ledger.product("P-1").unwrap();
        assert_eq!(record.stock, dec!(17));
        assert_eq!(record.cost_price, dec!(75.00));
        assert_eq!(record.selling_price, dec!(105.30));
        assert_eq!(ledger.receipts().len(), 1);
    }

    #[test]
    fn test_unknown_product_applies_nothing() {
        let mut ledger = MemoryLedger::with_products(&[product("P-1", dec!(5))]);

        let err = ledger
            .commit(&finalized("GRN-1", &["P-1", "P-404"]))
            .unwrap_err();

        assert!(!err.is_retryable());
        assert_eq!(ledger.product("P-1").unwrap().stock, dec!(5));
        assert!(ledger.receipts().is_empty());
    }

    #[test]
    fn test_duplicate_receipt_number_rejected() {
        let mut ledger = MemoryLedger::with_products(&[product("P-1", dec!(0))]);
        ledger.commit(&finalized("GRN-1", &["P-1"])).unwrap();

        let err = ledger.commit(&finalized("GRN-1", &["P-1"])).unwrap_err();
        assert!(matches!(err, SinkError::Rejected(_)));
        assert_eq!(ledger.product("P-1").unwrap().stock, dec!(12));
    }
}
