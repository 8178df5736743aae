//! Contract types exchanged with the transaction-save workflow and the
//! Ledger Store.
//!
//! Field names must match the wire schema exactly (camelCase, case-sensitive).

pub mod journal;
pub mod posting_request_v1;

pub use journal::{JournalLine, PostingDraft};
pub use posting_request_v1::{CalculatedTotals, LineItem, PostingRequestV1, RecordType};
