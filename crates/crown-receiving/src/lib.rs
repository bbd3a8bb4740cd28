//! # crown-receiving: Goods Receiving Workflow
//!
//! Drives `crown-core` from the receiving screen: loads configuration,
//! keeps the draft receipt, recomputes after each edit and posts the result.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Receiving Workflow                                 │
//! │                                                                         │
//! │  receiving.toml + CROWN_* env ──► ReceivingConfig                      │
//! │                                        │                                │
//! │  Receiving grid ── LineEdit ──► ReceivingSession ──► crown-core         │
//! │                                        │            (recompute line)   │
//! │                                        │ save                           │
//! │                                        ▼                                │
//! │                                  ReceiptSink (persistence)              │
//! │                                  all-or-nothing commit                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Receiving configuration (defaults, file, environment)
//! - [`session`] - `ReceivingSession`, line edits and save
//! - [`sink`] - `ReceiptSink` trait and in-memory ledger
//! - [`ordering`] - Order suggestions with configured cover days
//! - [`error`] - Receiving error types

pub mod config;
pub mod error;
pub mod ordering;
pub mod session;
pub mod sink;

pub use config::ReceivingConfig;
pub use error::{ReceivingError, ReceivingResult, SinkError};
pub use session::{LineEdit, ReceivingSession, SaveFailure};
pub use sink::{MemoryLedger, ReceiptSink, StockRecord};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber for hosts without their own.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show every line edit and recompute
/// - `RUST_LOG=crown_receiving=trace` - Trace for this crate only
/// - Default: INFO level
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,crown_receiving=debug"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
