//! # crown-core: Goods-Receipt Costing Engine
//!
//! This crate is the pricing heart of Crown POS receiving. Everything that
//! turns a supplier's trade price into a cost price, a retail price and a
//! tax amount lives here, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Crown POS Receiving Architecture                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Receiving Grid (external UI)                      │   │
//! │  │   edit trade / discount / GST / qty / FOC / retail per line     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ LineEdit                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              crown-receiving (ReceivingSession)                 │   │
//! │  │     config, edit → recompute, save with retry / abort           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ crown-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ costing  │ │   line   │ │ receipt  │ │ ordering │          │   │
//! │  │   │ discount │ │ Receipt  │ │ totals   │ │ average  │          │   │
//! │  │   │ GST, FOC │ │  Line    │ │ finalize │ │ demand   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ GoodsReceiptItem, ProductPriceUpdate   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               Persistence layer (external)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`costing`] - Discount, forward/reverse retail, FOC cost amortization
//! - [`line`] - `ReceiptLine`, the per-line reactive cell
//! - [`receipt`] - Receipt totals, withholding tax, all-or-nothing finalize
//! - [`ordering`] - Purchase quantity suggestion from consumption history
//! - [`money`] - Decimal rounding and percentage helpers
//! - [`types`] - Tax convention, product master, persisted record shapes
//! - [`validation`] - Caller-boundary input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use crown_core::costing::compute_line;
//! use crown_core::TaxConvention;
//! use rust_decimal_macros::dec;
//!
//! // Buy 10, get 2 free, 10% supplier discount, 17% GST on top
//! let costing = compute_line(
//!     dec!(100),
//!     dec!(10),
//!     dec!(17),
//!     TaxConvention::Exclusive,
//!     dec!(10),
//!     dec!(2),
//! );
//!
//! assert_eq!(costing.discounted_trade, dec!(90));
//! assert_eq!(costing.retail_price, dec!(105.30));
//! assert_eq!(costing.cost_price, dec!(75));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod line;
pub mod money;
pub mod ordering;
pub mod receipt;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use costing::{compute_line, LineCosting, ProfitMetrics};
pub use error::{CoreError, CoreResult, ValidationError};
pub use line::{LineInputs, LineState, ReceiptLine};
pub use receipt::{FinalizedReceipt, GoodsReceipt, ReceiptTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

use rust_decimal::Decimal;

/// Default GST rate (percent) used when a product master carries none and
/// when a below-trade retail override resets the rate.
///
/// Matches the seeded "GST 17%" default tax of the store database.
pub const DEFAULT_GST_RATE: Decimal = Decimal::from_parts(17, 0, 0, false, 0);

/// Upper bound for discount and withholding percentages.
pub const MAX_PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// Upper bound for a GST rate, typed or derived from a retail override.
///
/// Rates above 100% are legitimate (retail typed at 3× trade derives 200%).
pub const MAX_GST_RATE: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// Largest trade or retail price per purchase unit.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest received or FOC quantity on one line.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest number of base units in one purchase unit.
pub const MAX_UOM_FACTOR: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Maximum length of a goods receipt number.
pub const MAX_RECEIPT_NUMBER_LEN: usize = 50;
