//! Draft validation
//!
//! Pre-flight check run on every generated posting before any store
//! write. A single unresolvable line fails the whole draft (fail-closed,
//! not per-line) so the calling workflow can abort before creating the
//! parent business record.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::contracts::journal::PostingDraft;

/// Expected validation outcome, returned as a value rather than thrown so
/// the caller can abort before mutating the parent record
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Rejection {
    /// Single human-readable message surfaced to the user
    pub message: String,

    /// Labels of the lines whose account slot was unconfigured, when the
    /// rejection came from account validation
    pub missing_accounts: Vec<String>,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            missing_accounts: Vec::new(),
        }
    }

    pub fn missing_accounts(labels: Vec<String>) -> Self {
        Self {
            message: format!(
                "posting refers to unconfigured accounts: {}",
                labels.join(", ")
            ),
            missing_accounts: labels,
        }
    }
}

/// Validate a posting draft before persistence
///
/// # Validation Rules
///
/// - Every line must carry a non-empty account id
/// - Debit and credit amounts must be non-negative
/// - Total debits must equal total credits exactly
///
/// All lines with an empty account id are collected into one rejection so
/// a user fixing form configuration sees every gap at once.
pub fn validate_draft(draft: &PostingDraft) -> Result<(), Rejection> {
    let mut missing: Vec<String> = Vec::new();

    for line in &draft.lines {
        if line.account_id.trim().is_empty() {
            missing.push(line.memo.clone());
        }

        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(Rejection::new(format!(
                "line '{}' carries a negative amount",
                line.memo
            )));
        }
    }

    if !missing.is_empty() {
        return Err(Rejection::missing_accounts(missing));
    }

    if !draft.is_balanced() {
        return Err(Rejection::new(format!(
            "posting does not balance: debits {} != credits {}",
            draft.total_debits(),
            draft.total_credits()
        )));
    }

    Ok(())
}
