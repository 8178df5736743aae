//! Balance reconciliation
//!
//! Applies a set of line changes to the Ledger Store: routes the rows to
//! bulk create/update/delete, then folds the net per-account deltas into
//! the stored running balances with one bulk read and one bulk write.
//!
//! Balance writes are guarded by per-account versions. A concurrent
//! reconciler bumping the same account surfaces as a version conflict;
//! the whole fetch-compute-write step is retried from fresh state, so no
//! delta is ever applied on top of a stale read.

use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::contracts::journal::JournalLine;
use crate::services::balance_changes::{accumulate_deltas, AccountDelta, Change, LineOperation};
use crate::stores::{BalanceWrite, LedgerStore, StoreError};

/// What a reconciliation run persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub lines_created: usize,
    pub lines_updated: usize,
    pub lines_deleted: usize,
    pub accounts_touched: usize,
}

/// Errors raised during reconciliation
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Line persistence failed; balances were not touched
    #[error("ledger store error: {0}")]
    Store(#[from] StoreError),

    /// Lines were persisted but the balance write failed. The ledger is
    /// correct and the balances are stale; a repair pass is required.
    #[error("journal lines persisted but balances were not updated: {0}")]
    BalancesStale(StoreError),

    /// Lines were persisted but the balance write kept losing the version
    /// race. Same recovery as [`ReconcileError::BalancesStale`].
    #[error("balance version conflict not resolved after {attempts} attempts")]
    RetryExhausted { attempts: u32 },
}

/// Persist the line changes for one transaction and fold their net
/// deltas into the affected running balances.
///
/// Line routing by operation:
/// - `Create`: every row is bulk-created
/// - `Edit`: rows carrying an id are bulk-updated, rows without are
///   bulk-created
/// - `Delete`: new amounts are forced to zero and rows are bulk-deleted
///   by id
///
/// Persistence completes before any balance mutation; a balance failure
/// after that point is reported as a recoverable inconsistency, never
/// swallowed.
pub async fn reconcile(
    store: &dyn LedgerStore,
    op: LineOperation,
    changes: &[Change],
    max_attempts: u32,
) -> Result<ReconcileSummary, ReconcileError> {
    let changes: Vec<Change> = match op {
        LineOperation::Delete => changes.iter().cloned().map(Change::zeroed).collect(),
        _ => changes.to_vec(),
    };

    let mut summary = persist_lines(store, op, &changes).await?;

    let deltas = accumulate_deltas(&changes);
    summary.accounts_touched = deltas.len();

    apply_balance_deltas(store, &deltas, max_attempts).await?;

    tracing::info!(
        created = summary.lines_created,
        updated = summary.lines_updated,
        deleted = summary.lines_deleted,
        accounts = summary.accounts_touched,
        "Reconciled ledger lines and running balances"
    );

    Ok(summary)
}

async fn persist_lines(
    store: &dyn LedgerStore,
    op: LineOperation,
    changes: &[Change],
) -> Result<ReconcileSummary, ReconcileError> {
    let mut summary = ReconcileSummary::default();
    let rows: Vec<&JournalLine> = changes.iter().filter_map(|c| c.line.as_ref()).collect();

    match op {
        LineOperation::Create => {
            let lines: Vec<JournalLine> = rows.into_iter().cloned().collect();
            if !lines.is_empty() {
                store.create_lines(&lines).await?;
                summary.lines_created = lines.len();
            }
        }

        LineOperation::Edit => {
            let (updates, creates): (Vec<&JournalLine>, Vec<&JournalLine>) =
                rows.into_iter().partition(|l| l.id.is_some());

            let updates: Vec<JournalLine> = updates.into_iter().cloned().collect();
            let creates: Vec<JournalLine> = creates.into_iter().cloned().collect();

            if !updates.is_empty() {
                store.update_lines(&updates).await?;
                summary.lines_updated = updates.len();
            }
            if !creates.is_empty() {
                store.create_lines(&creates).await?;
                summary.lines_created = creates.len();
            }
        }

        LineOperation::Delete => {
            let ids: Vec<Uuid> = rows.into_iter().filter_map(|l| l.id).collect();
            if !ids.is_empty() {
                store.delete_lines(&ids).await?;
                summary.lines_deleted = ids.len();
            }
        }
    }

    Ok(summary)
}

async fn apply_balance_deltas(
    store: &dyn LedgerStore,
    deltas: &[AccountDelta],
    max_attempts: u32,
) -> Result<(), ReconcileError> {
    if deltas.is_empty() {
        return Ok(());
    }

    let account_ids: Vec<String> = deltas.iter().map(|d| d.account_id.clone()).collect();

    for attempt in 1..=max_attempts {
        let fetched = store
            .fetch_balances(&account_ids)
            .await
            .map_err(ReconcileError::BalancesStale)?;

        let current: HashMap<&str, (Decimal, i64)> = fetched
            .iter()
            .map(|b| (b.account_id.as_str(), (b.running_balance, b.version)))
            .collect();

        let updates: Vec<BalanceWrite> = deltas
            .iter()
            .map(|d| {
                let (balance, version) = current
                    .get(d.account_id.as_str())
                    .copied()
                    .unwrap_or_else(|| {
                        tracing::warn!(
                            account_id = %d.account_id,
                            "No stored balance for account; defaulting to zero"
                        );
                        (Decimal::ZERO, 0)
                    });
                BalanceWrite {
                    account_id: d.account_id.clone(),
                    running_balance: balance + d.delta,
                    expected_version: version,
                }
            })
            .collect();

        match store.write_balances(&updates).await {
            Ok(()) => return Ok(()),
            Err(StoreError::VersionConflict) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    "Balance write lost version race; refetching"
                );
            }
            Err(e) => return Err(ReconcileError::BalancesStale(e)),
        }
    }

    Err(ReconcileError::RetryExhausted {
        attempts: max_attempts,
    })
}
