//! # Receipt Line
//!
//! `ReceiptLine` is the per-line reactive cell of the receiving grid. It owns
//! the operator-editable inputs and the derived [`LineCosting`], and keeps
//! them consistent: every setter validates, applies, and recomputes before
//! returning.
//!
//! ## Line Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ReceiptLine Lifecycle                                │
//! │                                                                         │
//! │  PO item / scanned product                                             │
//! │       │ from_purchase_order / from_product                             │
//! │       ▼                                                                 │
//! │  ┌──────────┐   any edit    ┌─────────┐                                │
//! │  │ Unedited │ ────────────► │  Dirty  │ ◄──┐ further edits             │
//! │  └──────────┘               └────┬────┘ ───┘                            │
//! │       │                          │                                      │
//! │       └──────────┬───────────────┘                                      │
//! │                  ▼ finalize(self)  (consumes the line)                  │
//! │       GoodsReceiptItem + ProductPriceUpdate                             │
//! │                                                                         │
//! │  A rejected edit returns Err and leaves inputs, costing and state      │
//! │  exactly as they were.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::costing::{self, LineCosting, ProfitMetrics};
use crate::error::CoreResult;
use crate::money::round_money;
use crate::types::{GoodsReceiptItem, ProductMaster, ProductPriceUpdate, PurchaseOrderLine, TaxConvention};
use crate::validation::{
    validate_discount_percent, validate_gst_rate, validate_quantity, validate_trade_price,
    validate_uom_factor,
};

// =============================================================================
// Inputs & State
// =============================================================================

/// Operator-editable fields of a receipt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineInputs {
    #[ts(as = "String")]
    pub trade_price: Decimal,
    #[ts(as = "String")]
    pub discount_percent: Decimal,
    #[ts(as = "String")]
    pub gst_rate: Decimal,
    pub tax_convention: TaxConvention,
    #[ts(as = "String")]
    pub received_qty: Decimal,
    #[ts(as = "String")]
    pub foc_qty: Decimal,
    /// Base units per purchase unit.
    #[ts(as = "String")]
    pub uom_factor: Decimal,
}

impl Default for LineInputs {
    fn default() -> Self {
        LineInputs {
            trade_price: Decimal::ZERO,
            discount_percent: Decimal::ZERO,
            gst_rate: Decimal::ZERO,
            tax_convention: TaxConvention::default(),
            received_qty: Decimal::ZERO,
            foc_qty: Decimal::ZERO,
            uom_factor: Decimal::ONE,
        }
    }
}

impl LineInputs {
    /// Runs the costing engine over these inputs.
    pub fn compute(&self) -> LineCosting {
        costing::compute_line(
            self.trade_price,
            self.discount_percent,
            self.gst_rate,
            self.tax_convention,
            self.received_qty,
            self.foc_qty,
        )
    }

    /// Checks the input contract and normalizes quantities.
    fn validated(mut self) -> CoreResult<Self> {
        validate_trade_price(self.trade_price)?;
        validate_discount_percent(self.discount_percent)?;
        validate_gst_rate(self.gst_rate)?;
        validate_uom_factor(self.uom_factor)?;
        self.received_qty = validate_quantity("received_qty", self.received_qty)?;
        self.foc_qty = validate_quantity("foc_qty", self.foc_qty)?;
        Ok(self)
    }
}

/// Editing state of a line in the receiving grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    /// Seeded from the PO or product master, not touched yet.
    #[default]
    Unedited,
    /// At least one field was edited since the line was created.
    Dirty,
}

// =============================================================================
// Receipt Line
// =============================================================================

/// One product being received.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    id: String,
    product_id: String,
    product_name: String,
    inputs: LineInputs,
    costing: LineCosting,
    state: LineState,
}

impl ReceiptLine {
    /// Creates a line from explicit inputs, validated at construction.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        inputs: LineInputs,
    ) -> CoreResult<Self> {
        let inputs = inputs.validated()?;
        Ok(ReceiptLine {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            product_name: product_name.into(),
            costing: inputs.compute(),
            inputs,
            state: LineState::Unedited,
        })
    }

    /// Creates a line for a manually scanned product.
    ///
    /// Trade price, GST rate, tax convention and UOM factor come from the
    /// product master.
    pub fn from_product(product: &ProductMaster, received_qty: Decimal) -> CoreResult<Self> {
        Self::new(
            product.id.clone(),
            product.name.clone(),
            LineInputs {
                trade_price: product.trade_price,
                gst_rate: product.gst_rate,
                tax_convention: product.tax_convention,
                received_qty,
                uom_factor: product.uom_factor,
                ..LineInputs::default()
            },
        )
    }

    /// Creates a line for a purchase order item.
    ///
    /// The PO's agreed trade price wins over the product master; received
    /// quantity starts at what is still outstanding on the PO.
    pub fn from_purchase_order(po_line: &PurchaseOrderLine, product: &ProductMaster) -> CoreResult<Self> {
        Self::new(
            po_line.product_id.clone(),
            product.name.clone(),
            LineInputs {
                trade_price: po_line.trade_price,
                gst_rate: product.gst_rate,
                tax_convention: product.tax_convention,
                received_qty: po_line.outstanding(),
                uom_factor: product.uom_factor,
                ..LineInputs::default()
            },
        )
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn inputs(&self) -> &LineInputs {
        &self.inputs
    }

    pub fn costing(&self) -> &LineCosting {
        &self.costing
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == LineState::Dirty
    }

    /// Margin figures for the current costing.
    pub fn profit(&self) -> ProfitMetrics {
        costing::profit_metrics(&self.costing, self.inputs.received_qty)
    }

    // -------------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------------

    /// Recomputes every derived value from the current inputs.
    pub fn recompute(&mut self) {
        self.costing = self.inputs.compute();
    }

    fn touch(&mut self) {
        self.state = LineState::Dirty;
        self.recompute();
    }

    pub fn set_trade_price(&mut self, trade_price: Decimal) -> CoreResult<()> {
        validate_trade_price(trade_price)?;
        self.inputs.trade_price = trade_price;
        self.touch();
        Ok(())
    }

    pub fn set_discount_percent(&mut self, discount_percent: Decimal) -> CoreResult<()> {
        validate_discount_percent(discount_percent)?;
        self.inputs.discount_percent = discount_percent;
        self.touch();
        Ok(())
    }

    pub fn set_gst_rate(&mut self, gst_rate: Decimal) -> CoreResult<()> {
        validate_gst_rate(gst_rate)?;
        self.inputs.gst_rate = gst_rate;
        self.touch();
        Ok(())
    }

    /// Sets the paid quantity; negative input becomes 0.
    pub fn set_received_qty(&mut self, qty: Decimal) -> CoreResult<()> {
        self.inputs.received_qty = validate_quantity("received_qty", qty)?;
        self.touch();
        Ok(())
    }

    /// Sets the free-of-charge quantity; negative input becomes 0.
    pub fn set_foc_qty(&mut self, qty: Decimal) -> CoreResult<()> {
        self.inputs.foc_qty = validate_quantity("foc_qty", qty)?;
        self.touch();
        Ok(())
    }

    pub fn set_uom_factor(&mut self, factor: Decimal) -> CoreResult<()> {
        validate_uom_factor(factor)?;
        self.inputs.uom_factor = factor;
        self.touch();
        Ok(())
    }

    /// Changes the tax convention and recomputes retail and tax from the
    /// existing discounted trade.
    ///
    /// The displayed retail price is never reinterpreted: switching an
    /// overridden line back runs the forward formula again.
    pub fn switch_tax_convention(&mut self, convention: TaxConvention) {
        self.inputs.tax_convention = convention;
        self.touch();
    }

    /// Applies a retail price typed directly by the operator.
    ///
    /// Back-solves GST rate and convention with the discounted trade held
    /// fixed (see [`costing::back_solve_retail`]), then recomputes like any
    /// other edit. The costing always equals what the inputs produce, so a
    /// later unrelated edit cannot move the retail price. On error nothing
    /// changes.
    pub fn set_retail_price_override(
        &mut self,
        new_retail: Decimal,
        default_gst_rate: Decimal,
    ) -> CoreResult<()> {
        let solved =
            costing::back_solve_retail(new_retail, self.costing.discounted_trade, default_gst_rate)?;

        self.inputs.gst_rate = solved.gst_rate;
        self.inputs.tax_convention = solved.tax_convention;
        self.touch();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Finalization
    // -------------------------------------------------------------------------

    /// Quantity landing in stock, in base units.
    pub fn base_quantity(&self) -> Decimal {
        self.costing.total_qty * self.inputs.uom_factor
    }

    /// Converts the line into its persisted records, rounding prices to
    /// `price_decimals`. Consumes the line: no edit can follow.
    pub fn finalize(self, receipt_id: &str, price_decimals: u32) -> (GoodsReceiptItem, ProductPriceUpdate) {
        let base_quantity = self.base_quantity();
        let inputs = self.inputs;
        let costing = self.costing;
        let cost_price = round_money(costing.cost_price, price_decimals);
        let retail_price = round_money(costing.retail_price, price_decimals);

        let item = GoodsReceiptItem {
            id: Uuid::new_v4().to_string(),
            receipt_id: receipt_id.to_string(),
            product_id: self.product_id.clone(),
            quantity_received: inputs.received_qty,
            foc_quantity: inputs.foc_qty,
            quantity_in_base_uom: base_quantity,
            trade_price: inputs.trade_price,
            discount_percent: inputs.discount_percent,
            gst_rate: inputs.gst_rate,
            tax_convention: inputs.tax_convention,
            retail_price,
            cost_price,
            tax_amount: round_money(costing.tax_amount, price_decimals),
        };

        let update = ProductPriceUpdate {
            product_id: self.product_id,
            stock_increment: base_quantity,
            cost_price,
            selling_price: retail_price,
            gst_rate: inputs.gst_rate,
            tax_convention: inputs.tax_convention,
        };

        (item, update)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
