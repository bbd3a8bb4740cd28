//! # Receiving Session
//!
//! Holds one draft goods receipt while the operator works the receiving
//! grid, and posts it when they press save.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Receiving Session                                 │
//! │                                                                         │
//! │  open_direct / open_from_purchase_order                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────┐  add_product / edit / remove_line                    │
//! │  │    DRAFT     │◄──────────────────────────────┐                      │
//! │  │  (editable)  │  every edit recomputes the    │                      │
//! │  └──────┬───────┘  touched line only            │                      │
//! │         │ save(sink)                            │                      │
//! │         ▼                                       │                      │
//! │  finalize ──► commit ──► retryable? ──yes──► commit again              │
//! │                  │            │                 │                      │
//! │                  │ ok         └──no / attempts used up──► SaveFailure  │
//! │                  ▼                                (draft handed back)  │
//! │           FinalizedReceipt                                             │
//! │           (session consumed)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use crown_core::money::format_money;
use crown_core::{
    CoreError, FinalizedReceipt, GoodsReceipt, LineCosting, LineInputs, ProductMaster,
    ProfitMetrics, PurchaseOrder, ReceiptLine, ReceiptTotals, TaxConvention,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ReceivingConfig;
use crate::error::{ReceivingError, ReceivingResult};
use crate::sink::ReceiptSink;

// =============================================================================
// Line Edits
// =============================================================================

/// One cell edit from the receiving grid.
///
/// ## JSON Shape
/// ```json
/// { "field": "discount_percent", "value": "10" }
/// { "field": "tax_convention", "value": "inclusive" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum LineEdit {
    TradePrice(Decimal),
    DiscountPercent(Decimal),
    GstRate(Decimal),
    ReceivedQty(Decimal),
    FocQty(Decimal),
    UomFactor(Decimal),
    TaxConvention(TaxConvention),
    /// Retail price typed by the operator; GST rate and convention are
    /// back-solved.
    RetailPrice(Decimal),
}

impl LineEdit {
    /// Grid column name, used in logs.
    pub fn field(&self) -> &'static str {
        match self {
            LineEdit::TradePrice(_) => "trade_price",
            LineEdit::DiscountPercent(_) => "discount_percent",
            LineEdit::GstRate(_) => "gst_rate",
            LineEdit::ReceivedQty(_) => "received_qty",
            LineEdit::FocQty(_) => "foc_qty",
            LineEdit::UomFactor(_) => "uom_factor",
            LineEdit::TaxConvention(_) => "tax_convention",
            LineEdit::RetailPrice(_) => "retail_price",
        }
    }
}

// =============================================================================
// Save Failure
// =============================================================================

/// A save that did not post. Carries the untouched session back so the
/// operator can fix the draft or retry.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SaveFailure {
    #[source]
    pub error: ReceivingError,
    pub session: ReceivingSession,
}

impl SaveFailure {
    pub fn into_session(self) -> ReceivingSession {
        self.session
    }
}

// =============================================================================
// Receiving Session
// =============================================================================

/// A draft goods receipt plus the configuration it is edited under.
#[derive(Debug, Clone)]
pub struct ReceivingSession {
    config: ReceivingConfig,
    receipt: GoodsReceipt,
}

impl ReceivingSession {
    /// Opens a receipt without a purchase order.
    pub fn open_direct(config: ReceivingConfig, supplier_id: &str) -> ReceivingResult<Self> {
        let session = Self::open(config, supplier_id, None)?;
        info!(
            receipt_number = %session.receipt.receipt_number(),
            supplier_id,
            "Opened direct goods receipt"
        );
        Ok(session)
    }

    /// Opens a receipt against a purchase order, one line per item still
    /// outstanding.
    ///
    /// `products` must contain the master record of every PO item.
    pub fn open_from_purchase_order(
        config: ReceivingConfig,
        po: &PurchaseOrder,
        products: &[ProductMaster],
    ) -> ReceivingResult<Self> {
        let mut session = Self::open(config, &po.supplier_id, Some(po.id.clone()))?;

        for po_line in &po.lines {
            let product = products
                .iter()
                .find(|p| p.id == po_line.product_id)
                .ok_or_else(|| ReceivingError::ProductNotFound(po_line.product_id.clone()))?;

            if po_line.outstanding().is_zero() {
                debug!(product_id = %po_line.product_id, "PO item fully received, skipping");
                continue;
            }

            let line = ReceiptLine::from_purchase_order(po_line, product)?;
            session.receipt.add_line(line);
        }

        info!(
            receipt_number = %session.receipt.receipt_number(),
            po_number = %po.po_number,
            lines = session.receipt.lines().len(),
            "Opened goods receipt from purchase order"
        );
        Ok(session)
    }

    fn open(
        config: ReceivingConfig,
        supplier_id: &str,
        po_id: Option<String>,
    ) -> ReceivingResult<Self> {
        let number = generate_receipt_number(&config.receipt.number_prefix, Utc::now());
        let mut receipt = GoodsReceipt::new(number, supplier_id, po_id)?;
        receipt.set_withholding_tax_rate(config.receipt.withholding_tax_rate)?;

        Ok(ReceivingSession { config, receipt })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &ReceivingConfig {
        &self.config
    }

    pub fn receipt(&self) -> &GoodsReceipt {
        &self.receipt
    }

    pub fn receipt_number(&self) -> &str {
        self.receipt.receipt_number()
    }

    pub fn line(&self, line_id: &str) -> Option<&ReceiptLine> {
        self.receipt.line(line_id)
    }

    pub fn totals(&self) -> ReceiptTotals {
        self.receipt.totals()
    }

    // -------------------------------------------------------------------------
    // Editing
    // -------------------------------------------------------------------------

    /// Adds a scanned product and returns the new line's id.
    pub fn add_product(
        &mut self,
        product: &ProductMaster,
        received_qty: Decimal,
    ) -> ReceivingResult<String> {
        let line = ReceiptLine::from_product(product, received_qty)?;
        let line_id = self.receipt.add_line(line);
        debug!(line_id = %line_id, product_id = %product.id, "Line added");
        Ok(line_id)
    }

    /// Adds an item with no tax setup on file, using the configured default
    /// GST rate and convention.
    pub fn add_manual_line(
        &mut self,
        product_id: &str,
        product_name: &str,
        trade_price: Decimal,
        received_qty: Decimal,
    ) -> ReceivingResult<String> {
        let inputs = LineInputs {
            trade_price,
            gst_rate: self.config.costing.default_gst_rate,
            tax_convention: self.config.costing.default_tax_convention,
            received_qty,
            ..LineInputs::default()
        };
        let line_id = self.receipt.add_line(ReceiptLine::new(product_id, product_name, inputs)?);
        debug!(line_id = %line_id, product_id, "Manual line added");
        Ok(line_id)
    }

    /// Applies one edit and returns the line's recomputed costing.
    ///
    /// A rejected edit leaves the line exactly as it was.
    pub fn edit(&mut self, line_id: &str, edit: LineEdit) -> ReceivingResult<LineCosting> {
        let default_gst_rate = self.config.costing.default_gst_rate;
        let field = edit.field();
        let line = self.receipt.line_mut(line_id).map_err(line_error)?;

        let result = match edit {
            LineEdit::TradePrice(v) => line.set_trade_price(v),
            LineEdit::DiscountPercent(v) => line.set_discount_percent(v),
            LineEdit::GstRate(v) => line.set_gst_rate(v),
            LineEdit::UomFactor(v) => line.set_uom_factor(v),
            LineEdit::RetailPrice(v) => line.set_retail_price_override(v, default_gst_rate),
            LineEdit::ReceivedQty(v) => line.set_received_qty(v),
            LineEdit::FocQty(v) => line.set_foc_qty(v),
            LineEdit::TaxConvention(c) => {
                line.switch_tax_convention(c);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(line_id, field, error = %e, "Line edit rejected");
            return Err(e.into());
        }

        let costing = *line.costing();
        debug!(
            line_id,
            field,
            discounted_trade = %costing.discounted_trade,
            retail_price = %costing.retail_price,
            cost_price = %costing.cost_price,
            margin_percent = %line.profit().margin_percent,
            "Line recomputed"
        );
        Ok(costing)
    }

    /// Profit per unit and margin of one line at its current inputs.
    pub fn line_profit(&self, line_id: &str) -> ReceivingResult<ProfitMetrics> {
        self.receipt
            .line(line_id)
            .map(ReceiptLine::profit)
            .ok_or_else(|| ReceivingError::LineNotFound(line_id.to_string()))
    }

    pub fn remove_line(&mut self, line_id: &str) -> ReceivingResult<()> {
        let removed = self.receipt.remove_line(line_id).map_err(line_error)?;
        debug!(line_id, product_id = %removed.product_id(), "Line removed");
        Ok(())
    }

    pub fn set_withholding_rate(&mut self, rate: Decimal) -> ReceivingResult<()> {
        self.receipt.set_withholding_tax_rate(rate)?;
        debug!(withholding_tax_rate = %rate, "Withholding rate changed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Saving
    // -------------------------------------------------------------------------

    /// Finalizes the draft and commits it through `sink`.
    ///
    /// Retryable sink failures are retried up to `receipt.save_attempts`
    /// times. On any failure the session comes back inside [`SaveFailure`]
    /// with the draft unchanged.
    pub fn save<S>(self, sink: &mut S, received_by: &str) -> Result<FinalizedReceipt, SaveFailure>
    where
        S: ReceiptSink + ?Sized,
    {
        self.save_at(sink, received_by, Utc::now())
    }

    /// [`save`](Self::save) with an explicit receipt timestamp.
    pub fn save_at<S>(
        self,
        sink: &mut S,
        received_by: &str,
        received_at: DateTime<Utc>,
    ) -> Result<FinalizedReceipt, SaveFailure>
    where
        S: ReceiptSink + ?Sized,
    {
        let finalized = match self.receipt.clone().finalize(
            received_by,
            received_at,
            self.config.costing.price_decimals,
        ) {
            Ok(f) => f,
            Err(e) => {
                warn!(receipt_number = %self.receipt.receipt_number(), error = %e, "Receipt not ready to save");
                return Err(SaveFailure {
                    error: e.into(),
                    session: self,
                });
            }
        };

        let max_attempts = self.config.receipt.save_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match sink.commit(&finalized) {
                Ok(()) => {
                    let symbol = &self.config.receipt.currency_symbol;
                    let dp = self.config.costing.price_decimals;
                    info!(
                        receipt_number = %finalized.record.receipt_number,
                        items = finalized.items.len(),
                        total_amount = %format_money(finalized.record.total_amount, symbol, dp),
                        net_payable = %format_money(finalized.record.net_payable, symbol, dp),
                        attempt,
                        "Goods receipt saved"
                    );
                    return Ok(finalized);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        receipt_number = %finalized.record.receipt_number,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Goods receipt commit failed, retrying"
                    );
                }
                Err(e) => {
                    error!(
                        receipt_number = %finalized.record.receipt_number,
                        attempt,
                        error = %e,
                        "Goods receipt save aborted"
                    );
                    return Err(SaveFailure {
                        error: ReceivingError::SaveAborted {
                            receipt_number: finalized.record.receipt_number.clone(),
                            attempts: attempt,
                            reason: e.to_string(),
                        },
                        session: self,
                    });
                }
            }
        }
    }
}

fn line_error(e: CoreError) -> ReceivingError {
    match e {
        CoreError::LineNotFound(id) => ReceivingError::LineNotFound(id),
        other => other.into(),
    }
}

/// Builds `<prefix>-<yyyymmdd>-<6 hex>`.
pub fn generate_receipt_number(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        now.format("%Y%m%d"),
        suffix[..6].to_uppercase()
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
