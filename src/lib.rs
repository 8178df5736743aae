//! Journal posting and ledger-balance reconciliation engine.
//!
//! For every business transaction (invoice, fulfillment, credit/debit
//! memo, vendor documents, payments, inventory adjustments) the engine
//! derives a balanced set of debit/credit lines from the transaction's
//! line items, tax rules, and per-item costing method, validates that
//! every referenced account is configured before any write, and folds
//! the net effect of line changes into per-account running balances.
//!
//! Invoked as a library from the enclosing transaction-save workflow;
//! persistence and master data live behind the [`stores`] traits.

pub mod config;
pub mod contracts;
pub mod services;
pub mod stores;
pub mod validation;

pub use contracts::{JournalLine, PostingDraft, PostingRequestV1, RecordType};
pub use services::posting_service::{EngineError, PostingOutcome, PostingService};
pub use validation::Rejection;
