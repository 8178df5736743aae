//! Posting pipeline orchestration
//!
//! One transaction save runs the stages strictly in order:
//! build draft -> validate -> persist lines -> reconcile balances.
//! A rejection from the first two stages returns before any store call,
//! so the calling workflow can abort before creating the parent business
//! record. Only master-data lookups may run concurrently within a stage.

use std::sync::Arc;
use thiserror::Error;

use crate::contracts::journal::{JournalLine, PostingDraft};
use crate::contracts::posting_request_v1::PostingRequestV1;
use crate::services::account_config::{resolve_form_config, ConfigError};
use crate::services::balance_changes::{diff_postings, Change, LineOperation};
use crate::services::balance_reconciler::{reconcile, ReconcileError, ReconcileSummary};
use crate::services::costing::resolve_costing;
use crate::services::posting_rules::build_posting;
use crate::stores::{LedgerStore, MasterDataStore, StoreError};
use crate::validation::{validate_draft, Rejection};

/// Infrastructure failures along the pipeline. Validation outcomes are
/// not errors; they come back as [`PostingOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("form configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("master data error: {0}")]
    MasterData(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Result of a posting attempt
#[derive(Debug)]
pub enum PostingOutcome {
    /// Draft was approved and persisted; balances are up to date
    Posted {
        draft: PostingDraft,
        summary: ReconcileSummary,
    },

    /// Draft failed validation; nothing was written
    Rejected(Rejection),
}

/// The journal posting engine, wired to its two collaborators
pub struct PostingService {
    ledger: Arc<dyn LedgerStore>,
    master_data: Arc<dyn MasterDataStore>,
    balance_write_attempts: u32,
}

impl PostingService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        master_data: Arc<dyn MasterDataStore>,
        balance_write_attempts: u32,
    ) -> Self {
        Self {
            ledger,
            master_data,
            balance_write_attempts,
        }
    }

    /// Build and validate the draft for a request without persisting
    /// anything. The calling workflow runs this before creating the
    /// parent record so a configuration gap never leaves an orphan
    /// header with no ledger entries.
    pub async fn prepare(
        &self,
        request: &PostingRequestV1,
    ) -> Result<Result<PostingDraft, Rejection>, EngineError> {
        let config = resolve_form_config(self.master_data.as_ref(), &request.form_id).await?;
        let costing = resolve_costing(self.master_data.as_ref(), &request.line_items).await?;

        let draft = match build_posting(request, &config, &costing) {
            Ok(draft) => draft,
            Err(rejection) => {
                tracing::info!(
                    record_type = %request.record_type,
                    reason = %rejection,
                    "Posting draft rejected during generation"
                );
                return Ok(Err(rejection));
            }
        };

        if let Err(rejection) = validate_draft(&draft) {
            tracing::info!(
                record_type = %request.record_type,
                reason = %rejection,
                "Posting draft rejected during validation"
            );
            return Ok(Err(rejection));
        }

        Ok(Ok(draft))
    }

    /// Post a freshly created transaction
    pub async fn post(&self, request: &PostingRequestV1) -> Result<PostingOutcome, EngineError> {
        let draft = match self.prepare(request).await? {
            Ok(draft) => draft,
            Err(rejection) => return Ok(PostingOutcome::Rejected(rejection)),
        };

        let changes: Vec<Change> = draft
            .lines
            .iter()
            .cloned()
            .map(Change::for_create)
            .collect();

        let summary = reconcile(
            self.ledger.as_ref(),
            LineOperation::Create,
            &changes,
            self.balance_write_attempts,
        )
        .await?;

        tracing::info!(
            record_type = %request.record_type,
            record_id = ?request.record_id,
            lines = draft.lines.len(),
            "Posted transaction"
        );

        Ok(PostingOutcome::Posted { draft, summary })
    }

    /// Re-post an edited transaction against its previously persisted
    /// lines
    pub async fn repost(
        &self,
        request: &PostingRequestV1,
        previous_lines: &[JournalLine],
    ) -> Result<PostingOutcome, EngineError> {
        let draft = match self.prepare(request).await? {
            Ok(draft) => draft,
            Err(rejection) => return Ok(PostingOutcome::Rejected(rejection)),
        };

        let changes = diff_postings(previous_lines, &draft.lines);

        let summary = reconcile(
            self.ledger.as_ref(),
            LineOperation::Edit,
            &changes,
            self.balance_write_attempts,
        )
        .await?;

        tracing::info!(
            record_type = %request.record_type,
            record_id = ?request.record_id,
            "Re-posted edited transaction"
        );

        Ok(PostingOutcome::Posted { draft, summary })
    }

    /// Remove a deleted transaction's posting and back its amounts out of
    /// the running balances
    pub async fn unpost(
        &self,
        previous_lines: &[JournalLine],
    ) -> Result<ReconcileSummary, EngineError> {
        let changes: Vec<Change> = previous_lines
            .iter()
            .cloned()
            .map(Change::for_delete)
            .collect();

        let summary = reconcile(
            self.ledger.as_ref(),
            LineOperation::Delete,
            &changes,
            self.balance_write_attempts,
        )
        .await?;

        tracing::info!(lines = previous_lines.len(), "Unposted deleted transaction");

        Ok(summary)
    }
}
