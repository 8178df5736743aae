//! Change computation for balance reconciliation
//!
//! A `Change` captures one journal line's old and new debit/credit state.
//! Changes come from diffing a transaction's previously persisted posting
//! against its newly generated one, or from zeroing-out on delete. Deltas
//! are accumulated per account and applied in a deterministic order.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::contracts::journal::JournalLine;

/// How the transaction-save workflow is mutating the posting's lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOperation {
    Create,
    Edit,
    Delete,
}

/// One line's transition between posting states
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub account_id: String,
    pub old_debit: Decimal,
    pub old_credit: Decimal,
    pub new_debit: Decimal,
    pub new_credit: Decimal,

    /// The row to persist for this change. None for balance-only entries
    /// (e.g. the removal half of a line that moved to another account).
    pub line: Option<JournalLine>,
}

impl Change {
    /// Net balance effect, credit-positive:
    /// `(newCredit - newDebit) - (oldCredit - oldDebit)`
    pub fn delta(&self) -> Decimal {
        (self.new_credit - self.new_debit) - (self.old_credit - self.old_debit)
    }

    /// A brand-new line: old state is zero
    pub fn for_create(line: JournalLine) -> Self {
        Self {
            account_id: line.account_id.clone(),
            old_debit: Decimal::ZERO,
            old_credit: Decimal::ZERO,
            new_debit: line.debit,
            new_credit: line.credit,
            line: Some(line),
        }
    }

    /// A deleted line: new state is zeroed against the stored old values
    pub fn for_delete(line: JournalLine) -> Self {
        Self {
            account_id: line.account_id.clone(),
            old_debit: line.debit,
            old_credit: line.credit,
            new_debit: Decimal::ZERO,
            new_credit: Decimal::ZERO,
            line: Some(line),
        }
    }

    /// Force the new state to zero, keeping old amounts. Applied to every
    /// change under a delete operation regardless of input.
    pub fn zeroed(mut self) -> Self {
        self.new_debit = Decimal::ZERO;
        self.new_credit = Decimal::ZERO;
        self
    }
}

/// Net delta to apply to one account's running balance
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDelta {
    pub account_id: String,
    pub delta: Decimal,
}

/// Accumulate per-account deltas across all changes, sorted by account id
/// for deterministic application order.
pub fn accumulate_deltas(changes: &[Change]) -> Vec<AccountDelta> {
    let mut totals: HashMap<String, Decimal> = HashMap::new();

    for change in changes {
        *totals
            .entry(change.account_id.clone())
            .or_insert(Decimal::ZERO) += change.delta();
    }

    let mut deltas: Vec<AccountDelta> = totals
        .into_iter()
        .map(|(account_id, delta)| AccountDelta { account_id, delta })
        .collect();
    deltas.sort_by(|a, b| a.account_id.cmp(&b.account_id));
    deltas
}

/// Diff a transaction's previously persisted lines against its newly
/// generated draft lines.
///
/// Lines are paired positionally: a surviving row keeps its persisted id
/// (routing it to bulk-update), surplus new rows carry no id (bulk-create)
/// and surplus old rows become delete changes. A pair whose account moved
/// splits into a balance-only removal on the old account plus the full
/// new state on the new account.
pub fn diff_postings(old_lines: &[JournalLine], new_lines: &[JournalLine]) -> Vec<Change> {
    let mut changes = Vec::new();
    let paired = old_lines.len().min(new_lines.len());

    for (old, new) in old_lines.iter().zip(new_lines.iter()) {
        let mut line = new.clone();
        line.id = old.id;

        if old.account_id == new.account_id {
            changes.push(Change {
                account_id: new.account_id.clone(),
                old_debit: old.debit,
                old_credit: old.credit,
                new_debit: new.debit,
                new_credit: new.credit,
                line: Some(line),
            });
        } else {
            // Account moved: remove from the old account, add to the new
            changes.push(Change {
                account_id: old.account_id.clone(),
                old_debit: old.debit,
                old_credit: old.credit,
                new_debit: Decimal::ZERO,
                new_credit: Decimal::ZERO,
                line: None,
            });
            changes.push(Change {
                account_id: new.account_id.clone(),
                old_debit: Decimal::ZERO,
                old_credit: Decimal::ZERO,
                new_debit: new.debit,
                new_credit: new.credit,
                line: Some(line),
            });
        }
    }

    for new in &new_lines[paired..] {
        changes.push(Change::for_create(new.clone()));
    }

    for old in &old_lines[paired..] {
        changes.push(Change::for_delete(old.clone()));
    }

    changes
}
