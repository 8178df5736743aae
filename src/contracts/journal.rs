//! Journal line and posting draft types
//!
//! A `JournalLine` is one debit/credit row as persisted by the Ledger
//! Store; a `PostingDraft` is the unpersisted set generated for one
//! transaction. Both fields of a line are kept (rather than an
//! amount+side pair) so that old/new states diff uniformly during
//! reconciliation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contracts::posting_request_v1::RecordType;

/// A single row in a double-entry posting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    /// Present for persisted rows; absent for rows still to be created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    /// Chart-of-accounts identifier this row posts against
    pub account_id: String,

    /// Debit amount (must be >= 0)
    pub debit: Decimal,

    /// Credit amount (must be >= 0)
    pub credit: Decimal,

    /// Human-readable label for the row
    pub memo: String,

    /// Business transaction this row belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    /// Accounting date
    pub date: NaiveDate,
}

impl JournalLine {
    /// Net effect of the row, credit-positive
    pub fn net(&self) -> Decimal {
        self.credit - self.debit
    }
}

/// The in-memory posting generated for one transaction, prior to
/// validation and persistence
#[derive(Debug, Clone, PartialEq)]
pub struct PostingDraft {
    pub record_type: RecordType,
    pub record_id: Option<String>,
    pub date: NaiveDate,
    pub total_amount: Decimal,
    pub lines: Vec<JournalLine>,
}

impl PostingDraft {
    pub fn total_debits(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credits(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Double-entry invariant: total debits equal total credits, exact
    /// after rounding
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }
}
