//! External collaborator seams
//!
//! The engine never persists anything itself: journal lines and running
//! balances live behind [`LedgerStore`], product/tax/form master data
//! behind [`MasterDataStore`]. Production talks HTTP; tests plug in
//! in-memory implementations of the same traits.

pub mod ledger_store;
pub mod master_data;

use thiserror::Error;

pub use ledger_store::{AccountBalance, BalanceWrite, HttpLedgerStore, LedgerStore};
pub use master_data::{
    FormConfigRecord, HttpMasterDataStore, MasterDataStore, ProductCostingRecord, TaxRecord,
};

/// Errors raised by store collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("balance version conflict")]
    VersionConflict,

    #[error("record not found: {0}")]
    NotFound(String),
}
