//! End-to-end receiving flows: open, edit, save into a ledger.

use crown_core::{
    CoreError, FinalizedReceipt, ProductMaster, PurchaseOrder, PurchaseOrderLine, TaxConvention,
};
use crown_receiving::{
    LineEdit, MemoryLedger, ReceiptSink, ReceivingConfig, ReceivingError, ReceivingSession,
    SinkError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Fixtures
// =============================================================================

fn product(id: &str, trade: Decimal, stock: Decimal) -> ProductMaster {
    ProductMaster {
        id: id.to_string(),
        name: format!("Product {}", id),
        barcode: None,
        trade_price: trade,
        gst_rate: dec!(17),
        tax_convention: TaxConvention::Exclusive,
        uom_factor: dec!(1),
        stock,
    }
}

fn session() -> ReceivingSession {
    crown_receiving::init_tracing();
    ReceivingSession::open_direct(ReceivingConfig::default(), "SUP-1").unwrap()
}

/// Fails the first `failures` commits with `error`, then delegates.
struct FlakySink {
    failures: u32,
    error: fn() -> SinkError,
    calls: u32,
    inner: MemoryLedger,
}

impl FlakySink {
    fn new(failures: u32, error: fn() -> SinkError, inner: MemoryLedger) -> Self {
        FlakySink {
            failures,
            error,
            calls: 0,
            inner,
        }
    }
}

impl ReceiptSink for FlakySink {
    fn commit(&mut self, receipt: &FinalizedReceipt) -> Result<(), SinkError> {
        self.calls += 1;
        if self.calls <= self.failures {
            return Err((self.error)());
        }
        self.inner.commit(receipt)
    }
}

fn conflict() -> SinkError {
    SinkError::Conflict("stock row changed".into())
}

fn unavailable() -> SinkError {
    SinkError::Unavailable("database locked".into())
}

// =============================================================================
// Editing
// =============================================================================

#[test]
fn test_discount_and_foc_edits_recompute_line() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();

    let costing = session
        .edit(&line_id, LineEdit::DiscountPercent(dec!(10)))
        .unwrap();
    assert_eq!(costing.discounted_trade, dec!(90));
    assert_eq!(costing.retail_price, dec!(105.30));

    let costing = session.edit(&line_id, LineEdit::FocQty(dec!(2))).unwrap();
    assert_eq!(costing.cost_price, dec!(75));
    assert_eq!(costing.total_qty, dec!(12));
    assert!(session.line(&line_id).unwrap().is_dirty());
}

#[test]
fn test_scenario_d_keeps_full_precision_until_save() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(50), dec!(0)), dec!(50))
        .unwrap();
    session
        .edit(&line_id, LineEdit::DiscountPercent(dec!(15)))
        .unwrap();
    let costing = session.edit(&line_id, LineEdit::FocQty(dec!(10))).unwrap();

    assert_eq!(costing.discounted_trade, dec!(42.50));
    assert_eq!(costing.retail_price, dec!(49.725));
    assert_eq!(costing.cost_price.round_dp(4), dec!(35.4167));

    let mut ledger = MemoryLedger::with_products(&[product("P-1", dec!(50), dec!(0))]);
    let finalized = session.save(&mut ledger, "clerk").unwrap();
    assert_eq!(finalized.items[0].cost_price, dec!(35.42));
    assert_eq!(finalized.items[0].retail_price, dec!(49.73));
}

#[test]
fn test_switching_convention_keeps_discounted_trade() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(117), dec!(0)), dec!(10))
        .unwrap();

    let costing = session
        .edit(&line_id, LineEdit::TaxConvention(TaxConvention::Inclusive))
        .unwrap();
    assert_eq!(costing.retail_price, dec!(117));
    assert_eq!(costing.tax_amount, dec!(17));

    let costing = session
        .edit(&line_id, LineEdit::TaxConvention(TaxConvention::Exclusive))
        .unwrap();
    assert_eq!(costing.retail_price, dec!(136.89));
}

#[test]
fn test_retail_override_above_trade_derives_rate() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();

    let costing = session
        .edit(&line_id, LineEdit::RetailPrice(dec!(120)))
        .unwrap();
    assert_eq!(costing.retail_price, dec!(120));
    assert_eq!(costing.tax_amount, dec!(20));

    let inputs = *session.line(&line_id).unwrap().inputs();
    assert_eq!(inputs.gst_rate, dec!(20));
    assert_eq!(inputs.tax_convention, TaxConvention::Exclusive);
}

#[test]
fn test_retail_override_below_trade_resets_to_default_rate() {
    let mut config = ReceivingConfig::default();
    config.costing.default_gst_rate = dec!(18);
    let mut session = ReceivingSession::open_direct(config, "SUP-1").unwrap();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();

    let costing = session
        .edit(&line_id, LineEdit::RetailPrice(dec!(90)))
        .unwrap();
    assert_eq!(costing.retail_price, dec!(100));
    assert_eq!(costing.tax_amount.round_dp(2), dec!(15.25));

    let inputs = *session.line(&line_id).unwrap().inputs();
    assert_eq!(inputs.gst_rate, dec!(18));
    assert_eq!(inputs.tax_convention, TaxConvention::Inclusive);
}

#[test]
fn test_retail_override_survives_later_edits_and_save() {
    let mut session = session();
    let below = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();
    let above = session
        .add_product(&product("P-2", dec!(100), dec!(0)), dec!(10))
        .unwrap();

    let shown = session
        .edit(&below, LineEdit::RetailPrice(dec!(90)))
        .unwrap()
        .retail_price;
    let after = session.edit(&below, LineEdit::FocQty(dec!(2))).unwrap();
    assert_eq!(after.retail_price, shown);

    session
        .edit(&above, LineEdit::RetailPrice(dec!(125)))
        .unwrap();
    let after = session
        .edit(&above, LineEdit::ReceivedQty(dec!(20)))
        .unwrap();
    assert_eq!(after.retail_price, dec!(125));

    let mut ledger = MemoryLedger::with_products(&[
        product("P-1", dec!(100), dec!(0)),
        product("P-2", dec!(100), dec!(0)),
    ]);
    let done = session.save(&mut ledger, "clerk").unwrap();
    assert_eq!(ledger.product("P-1").unwrap().selling_price, dec!(100.00));
    assert_eq!(ledger.product("P-2").unwrap().selling_price, dec!(125.00));
    assert_eq!(done.items.len(), 2);
}

#[test]
fn test_oversized_values_are_rejected_without_panicking() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();
    let before = *session.line(&line_id).unwrap().inputs();

    for edit in [
        LineEdit::ReceivedQty(Decimal::MAX),
        LineEdit::FocQty(Decimal::MAX),
        LineEdit::TradePrice(Decimal::MAX),
        LineEdit::UomFactor(Decimal::MAX),
        LineEdit::RetailPrice(Decimal::MAX),
        LineEdit::GstRate(dec!(1000.01)),
    ] {
        assert!(session.edit(&line_id, edit).is_err());
    }
    assert_eq!(*session.line(&line_id).unwrap().inputs(), before);

    assert!(session
        .add_product(&product("P-2", Decimal::MAX, dec!(0)), dec!(1))
        .is_err());
    assert!(session
        .add_product(&product("P-3", dec!(100), dec!(0)), Decimal::MAX)
        .is_err());
}

#[test]
fn test_derived_rate_above_hundred_is_kept() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();

    session
        .edit(&line_id, LineEdit::RetailPrice(dec!(300)))
        .unwrap();
    assert_eq!(session.line(&line_id).unwrap().inputs().gst_rate, dec!(200));

    // The same rate is accepted when typed
    let costing = session
        .edit(&line_id, LineEdit::GstRate(dec!(200)))
        .unwrap();
    assert_eq!(costing.retail_price, dec!(300));
}

#[test]
fn test_retail_override_without_trade_price_is_rejected() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(0), dec!(0)), dec!(10))
        .unwrap();
    let before = *session.line(&line_id).unwrap().costing();

    let err = session
        .edit(&line_id, LineEdit::RetailPrice(dec!(50)))
        .unwrap_err();

    assert!(matches!(err, ReceivingError::Core(CoreError::TradePriceNotSet)));
    assert_eq!(*session.line(&line_id).unwrap().costing(), before);
}

#[test]
fn test_invalid_edit_leaves_line_unchanged() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();
    let before = *session.line(&line_id).unwrap().inputs();

    assert!(session
        .edit(&line_id, LineEdit::DiscountPercent(dec!(150)))
        .is_err());
    assert!(session.edit(&line_id, LineEdit::UomFactor(dec!(0))).is_err());
    assert!(session.edit(&line_id, LineEdit::GstRate(dec!(-1))).is_err());

    assert_eq!(*session.line(&line_id).unwrap().inputs(), before);
    assert!(!session.line(&line_id).unwrap().is_dirty());
}

#[test]
fn test_negative_quantity_is_normalized() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(10))
        .unwrap();

    let costing = session
        .edit(&line_id, LineEdit::ReceivedQty(dec!(-5)))
        .unwrap();
    assert_eq!(costing.total_qty, Decimal::ZERO);
    assert_eq!(costing.cost_price, Decimal::ZERO);
}

// =============================================================================
// Purchase orders
// =============================================================================

#[test]
fn test_purchase_order_seeds_outstanding_lines() {
    let po = PurchaseOrder {
        id: "PO-ID-1".to_string(),
        po_number: "PO-0001".to_string(),
        supplier_id: "SUP-1".to_string(),
        lines: vec![
            PurchaseOrderLine {
                product_id: "P-1".to_string(),
                quantity_ordered: dec!(24),
                quantity_received: dec!(6),
                trade_price: dec!(95),
            },
            PurchaseOrderLine {
                product_id: "P-2".to_string(),
                quantity_ordered: dec!(10),
                quantity_received: dec!(10),
                trade_price: dec!(40),
            },
        ],
    };
    let products = [
        product("P-1", dec!(100), dec!(0)),
        product("P-2", dec!(40), dec!(0)),
    ];

    let session =
        ReceivingSession::open_from_purchase_order(ReceivingConfig::default(), &po, &products)
            .unwrap();

    assert!(!session.receipt().is_direct());
    assert_eq!(session.receipt().po_id(), Some("PO-ID-1"));
    let lines = session.receipt().lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].inputs().received_qty, dec!(18));
    assert_eq!(lines[0].inputs().trade_price, dec!(95));
}

#[test]
fn test_purchase_order_with_unknown_product_fails() {
    let po = PurchaseOrder {
        id: "PO-ID-1".to_string(),
        po_number: "PO-0001".to_string(),
        supplier_id: "SUP-1".to_string(),
        lines: vec![PurchaseOrderLine {
            product_id: "P-404".to_string(),
            quantity_ordered: dec!(1),
            quantity_received: dec!(0),
            trade_price: dec!(1),
        }],
    };

    let err = ReceivingSession::open_from_purchase_order(ReceivingConfig::default(), &po, &[])
        .unwrap_err();
    assert!(matches!(err, ReceivingError::ProductNotFound(id) if id == "P-404"));
}

// =============================================================================
// Saving
// =============================================================================

#[test]
fn test_save_posts_stock_and_prices() {
    let mut session = session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(5)), dec!(10))
        .unwrap();
    session
        .edit(&line_id, LineEdit::DiscountPercent(dec!(10)))
        .unwrap();
    session.edit(&line_id, LineEdit::FocQty(dec!(2))).unwrap();
    session.edit(&line_id, LineEdit::UomFactor(dec!(12))).unwrap();
    session.set_withholding_rate(dec!(10)).unwrap();

    let totals = session.totals();
    assert_eq!(totals.total_amount, dec!(900));
    assert_eq!(totals.withholding_tax_amount, dec!(90));
    assert_eq!(totals.net_payable, dec!(810));

    let mut ledger = MemoryLedger::with_products(&[product("P-1", dec!(100), dec!(5))]);
    let finalized = session.save(&mut ledger, "clerk").unwrap();

    assert_eq!(finalized.record.net_payable, dec!(810));
    assert_eq!(finalized.items[0].quantity_in_base_uom, dec!(144));
    assert!(finalized.withholding.is_some());

    let record = ledger.product("P-1").unwrap();
    assert_eq!(record.stock, dec!(149));
    assert_eq!(record.cost_price, dec!(75));
    assert_eq!(record.selling_price, dec!(105.30));
}

#[test]
fn test_save_retries_transient_conflicts() {
    let mut session = session();
    session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(1))
        .unwrap();
    let ledger = MemoryLedger::with_products(&[product("P-1", dec!(100), dec!(0))]);
    let mut sink = FlakySink::new(2, conflict, ledger);

    let finalized = session.save(&mut sink, "clerk").unwrap();

    assert_eq!(sink.calls, 3);
    assert_eq!(sink.inner.receipts().len(), 1);
    assert_eq!(
        sink.inner.receipts()[0].record.receipt_number,
        finalized.record.receipt_number
    );
}

#[test]
fn test_save_aborts_after_attempts_and_returns_draft() {
    let mut session = session();
    session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(1))
        .unwrap();
    let number = session.receipt_number().to_string();
    let ledger = MemoryLedger::with_products(&[product("P-1", dec!(100), dec!(0))]);
    let mut sink = FlakySink::new(u32::MAX, unavailable, ledger);

    let failure = session.save(&mut sink, "clerk").unwrap_err();
    assert!(matches!(
        failure.error,
        ReceivingError::SaveAborted { attempts: 3, .. }
    ));
    assert_eq!(sink.calls, 3);
    assert!(sink.inner.receipts().is_empty());
    assert_eq!(sink.inner.product("P-1").unwrap().stock, Decimal::ZERO);

    // The same draft posts once the store is back
    let session = failure.into_session();
    assert_eq!(session.receipt_number(), number);
    let mut ledger = MemoryLedger::with_products(&[product("P-1", dec!(100), dec!(0))]);
    let finalized = session.save(&mut ledger, "clerk").unwrap();
    assert_eq!(finalized.record.receipt_number, number);
}

#[test]
fn test_rejected_commit_is_not_retried() {
    let mut session = session();
    session
        .add_product(&product("P-404", dec!(100), dec!(0)), dec!(1))
        .unwrap();
    let mut ledger = MemoryLedger::new();

    let failure = session.save(&mut ledger, "clerk").unwrap_err();
    assert!(matches!(
        failure.error,
        ReceivingError::SaveAborted { attempts: 1, .. }
    ));
}

#[test]
fn test_invalid_draft_never_reaches_sink() {
    let mut ledger = MemoryLedger::new();
    let mut sink = FlakySink::new(0, conflict, MemoryLedger::new());

    let failure = session().save(&mut sink, "clerk").unwrap_err();
    assert!(matches!(
        failure.error,
        ReceivingError::Core(CoreError::EmptyReceipt { .. })
    ));
    assert_eq!(sink.calls, 0);

    let mut session = failure.into_session();
    let line_id = session
        .add_product(&product("P-1", dec!(100), dec!(0)), dec!(0))
        .unwrap();
    let failure = session.save(&mut ledger, "clerk").unwrap_err();
    assert!(matches!(
        failure.error,
        ReceivingError::Core(CoreError::NothingReceived { line: 1, .. })
    ));

    let mut session = failure.into_session();
    session.remove_line(&line_id).unwrap();
    assert!(session.receipt().lines().is_empty());
}
