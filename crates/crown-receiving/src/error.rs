//! # Receiving Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError / CoreError (crown-core)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReceivingError (this module) ← config, lookup and save context        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Receiving grid shows the message; the line or draft is unchanged      │
//! │                                                                         │
//! │  SinkError (persistence layer) ─► retried or ─► SaveAborted            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crown_core::CoreError;
use thiserror::Error;

/// Errors raised by the receiving workflow.
#[derive(Debug, Error)]
pub enum ReceivingError {
    /// Costing or validation failure from the engine.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// Edit addressed a line that is not on the draft.
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Product referenced by a PO line is missing from the product master.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or written.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for `ReceivingConfig`.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized.
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Persistence did not accept the receipt; nothing was applied.
    ///
    /// ## When This Occurs
    /// - Sink rejected the receipt (unknown product, duplicate number)
    /// - Sink kept reporting transient failures until attempts ran out
    #[error("Goods receipt {receipt_number} not saved after {attempts} attempt(s): {reason}")]
    SaveAborted {
        receipt_number: String,
        attempts: u32,
        reason: String,
    },
}

/// Result alias for the receiving workflow.
pub type ReceivingResult<T> = Result<T, ReceivingError>;

/// Failure reported by a [`crate::sink::ReceiptSink`].
///
/// A sink must report failure only when NOTHING from the receipt was
/// applied.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Another writer touched the same rows; retrying may succeed.
    #[error("Conflicting update: {0}")]
    Conflict(String),

    /// Store temporarily unavailable (locked database, lost connection).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The receipt can never be applied as is.
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Returns true if the same receipt may be committed again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SinkError::Conflict(_) | SinkError::Unavailable(_))
    }
}
