//! Ledger Store collaborator
//!
//! Bulk create/update/delete of journal lines plus bulk read/write of
//! per-account running balances. Balance rows carry a version number;
//! a write naming a stale version is refused with
//! [`StoreError::VersionConflict`] so concurrent reconcilers cannot
//! silently drop each other's deltas.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::contracts::journal::JournalLine;
use crate::stores::StoreError;

/// Per-account running balance as stored by the Ledger Store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    pub account_id: String,
    pub running_balance: Decimal,
    /// Optimistic-concurrency sequence; bumped by every write
    pub version: i64,
}

/// One balance update, guarded by the version it was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceWrite {
    pub account_id: String,
    pub running_balance: Decimal,
    pub expected_version: i64,
}

/// Durable storage for journal lines and running balances
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Bulk-create journal lines; returns the assigned row ids in input order
    async fn create_lines(&self, lines: &[JournalLine]) -> Result<Vec<Uuid>, StoreError>;

    /// Bulk-update existing journal lines (every line must carry an id)
    async fn update_lines(&self, lines: &[JournalLine]) -> Result<(), StoreError>;

    /// Bulk-delete journal lines by id
    async fn delete_lines(&self, ids: &[Uuid]) -> Result<(), StoreError>;

    /// Bulk-read running balances for exactly the given accounts.
    /// Accounts with no balance row yet are simply absent from the result.
    async fn fetch_balances(&self, account_ids: &[String]) -> Result<Vec<AccountBalance>, StoreError>;

    /// Bulk-write running balances in one request. Fails with
    /// [`StoreError::VersionConflict`] if any row's version moved since
    /// the corresponding fetch.
    async fn write_balances(&self, updates: &[BalanceWrite]) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct LinesBody<'a> {
    lines: &'a [JournalLine],
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    ids: &'a [Uuid],
}

#[derive(Serialize)]
struct BalanceReadBody<'a> {
    ids: &'a [String],
}

#[derive(Serialize)]
struct BalanceWriteBody<'a> {
    accounts: &'a [BalanceWrite],
}

#[derive(Deserialize)]
struct CreatedLines {
    ids: Vec<Uuid>,
}

/// Balance row as returned on the wire; older stores report
/// `openingBalance` instead of `runningBalance` and omit `version`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceRow {
    id: String,
    running_balance: Option<Decimal>,
    opening_balance: Option<Decimal>,
    #[serde(default)]
    version: i64,
}

#[derive(Deserialize)]
struct BalanceRows {
    accounts: Vec<BalanceRow>,
}

/// HTTP implementation of [`LedgerStore`]
pub struct HttpLedgerStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLedgerStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn check_status(endpoint: &str, status: reqwest::StatusCode) -> Result<(), StoreError> {
    if status == reqwest::StatusCode::CONFLICT {
        return Err(StoreError::VersionConflict);
    }
    if !status.is_success() {
        return Err(StoreError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

#[async_trait]
impl LedgerStore for HttpLedgerStore {
    async fn create_lines(&self, lines: &[JournalLine]) -> Result<Vec<Uuid>, StoreError> {
        let endpoint = self.url("journal-lines");
        let response = self
            .client
            .post(&endpoint)
            .json(&LinesBody { lines })
            .send()
            .await?;
        check_status(&endpoint, response.status())?;

        let created: CreatedLines = response.json().await?;
        Ok(created.ids)
    }

    async fn update_lines(&self, lines: &[JournalLine]) -> Result<(), StoreError> {
        let endpoint = self.url("journal-lines");
        let response = self
            .client
            .put(&endpoint)
            .json(&LinesBody { lines })
            .send()
            .await?;
        check_status(&endpoint, response.status())
    }

    async fn delete_lines(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let endpoint = self.url("journal-lines");
        let response = self
            .client
            .delete(&endpoint)
            .json(&DeleteBody { ids })
            .send()
            .await?;
        check_status(&endpoint, response.status())
    }

    async fn fetch_balances(&self, account_ids: &[String]) -> Result<Vec<AccountBalance>, StoreError> {
        let endpoint = self.url("account-balances/fetch");
        let response = self
            .client
            .post(&endpoint)
            .json(&BalanceReadBody { ids: account_ids })
            .send()
            .await?;
        check_status(&endpoint, response.status())?;

        let rows: BalanceRows = response.json().await?;
        Ok(rows
            .accounts
            .into_iter()
            .map(|row| AccountBalance {
                account_id: row.id,
                running_balance: row
                    .running_balance
                    .or(row.opening_balance)
                    .unwrap_or(Decimal::ZERO),
                version: row.version,
            })
            .collect())
    }

    async fn write_balances(&self, updates: &[BalanceWrite]) -> Result<(), StoreError> {
        let endpoint = self.url("account-balances");
        let response = self
            .client
            .put(&endpoint)
            .json(&BalanceWriteBody { accounts: updates })
            .send()
            .await?;
        check_status(&endpoint, response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_row_accepts_running_or_opening_balance() {
        let row: BalanceRow =
            serde_json::from_str(r#"{"id": "1100", "runningBalance": "12.50", "version": 3}"#)
                .unwrap();
        assert_eq!(
            row.running_balance.or(row.opening_balance),
            Some(dec!(12.50))
        );
        assert_eq!(row.version, 3);

        let legacy: BalanceRow =
            serde_json::from_str(r#"{"id": "1100", "openingBalance": "7.25"}"#).unwrap();
        assert_eq!(
            legacy.running_balance.or(legacy.opening_balance),
            Some(dec!(7.25))
        );
        assert_eq!(legacy.version, 0);
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let store =
            HttpLedgerStore::new("http://ledger.local/", Duration::from_secs(5)).unwrap();
        assert_eq!(store.url("journal-lines"), "http://ledger.local/journal-lines");
    }
}
