//! Shared fixtures: in-memory store implementations and master-data
//! records used across the integration suites.

// Not every suite uses every fixture
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use posting_rs::contracts::journal::JournalLine;
use posting_rs::contracts::posting_request_v1::{LineItem, PostingRequestV1, RecordType};
use posting_rs::services::account_config::AccountMapping;
use posting_rs::stores::{
    AccountBalance, BalanceWrite, FormConfigRecord, LedgerStore, MasterDataStore,
    ProductCostingRecord, StoreError, TaxRecord,
};

#[derive(Default)]
struct LedgerState {
    lines: HashMap<Uuid, JournalLine>,
    balances: HashMap<String, (Decimal, i64)>,
    calls: usize,
    conflicts_remaining: u32,
    fail_balance_writes: bool,
}

/// In-memory [`LedgerStore`] recording every call for assertions
#[derive(Default)]
pub struct InMemoryLedgerStore {
    state: Mutex<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_balance(&self, account_id: &str, balance: Decimal, version: i64) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert(account_id.to_string(), (balance, version));
    }

    /// Make the next `n` balance writes lose the version race
    pub fn conflict_next_writes(&self, n: u32) {
        self.state.lock().unwrap().conflicts_remaining = n;
    }

    /// Make every balance write fail with a non-conflict error
    pub fn fail_balance_writes(&self) {
        self.state.lock().unwrap().fail_balance_writes = true;
    }

    /// Insert a persisted row directly, bypassing call counting
    pub fn seed_line(&self, line: JournalLine) {
        let id = line.id.unwrap_or_else(Uuid::new_v4);
        let mut stored = line;
        stored.id = Some(id);
        self.state.lock().unwrap().lines.insert(id, stored);
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn lines(&self) -> Vec<JournalLine> {
        let mut lines: Vec<JournalLine> =
            self.state.lock().unwrap().lines.values().cloned().collect();
        lines.sort_by(|a, b| a.account_id.cmp(&b.account_id).then(a.memo.cmp(&b.memo)));
        lines
    }

    pub fn balance(&self, account_id: &str) -> Decimal {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(account_id)
            .map(|(b, _)| *b)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn version(&self, account_id: &str) -> i64 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(account_id)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_lines(&self, lines: &[JournalLine]) -> Result<Vec<Uuid>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        let mut ids = Vec::with_capacity(lines.len());
        for line in lines {
            let id = Uuid::new_v4();
            let mut stored = line.clone();
            stored.id = Some(id);
            state.lines.insert(id, stored);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn update_lines(&self, lines: &[JournalLine]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        for line in lines {
            let id = line
                .id
                .ok_or_else(|| StoreError::NotFound("line without id".to_string()))?;
            if !state.lines.contains_key(&id) {
                return Err(StoreError::NotFound(id.to_string()));
            }
            state.lines.insert(id, line.clone());
        }
        Ok(())
    }

    async fn delete_lines(&self, ids: &[Uuid]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        for id in ids {
            state
                .lines
                .remove(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        }
        Ok(())
    }

    async fn fetch_balances(
        &self,
        account_ids: &[String],
    ) -> Result<Vec<AccountBalance>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        Ok(account_ids
            .iter()
            .filter_map(|id| {
                state.balances.get(id).map(|(balance, version)| AccountBalance {
                    account_id: id.clone(),
                    running_balance: *balance,
                    version: *version,
                })
            })
            .collect())
    }

    async fn write_balances(&self, updates: &[BalanceWrite]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;

        if state.fail_balance_writes {
            return Err(StoreError::Status {
                endpoint: "account-balances".to_string(),
                status: 500,
            });
        }
        if state.conflicts_remaining > 0 {
            state.conflicts_remaining -= 1;
            return Err(StoreError::VersionConflict);
        }

        for update in updates {
            let current_version = state
                .balances
                .get(&update.account_id)
                .map(|(_, v)| *v)
                .unwrap_or(0);
            if current_version != update.expected_version {
                return Err(StoreError::VersionConflict);
            }
        }
        for update in updates {
            state.balances.insert(
                update.account_id.clone(),
                (update.running_balance, update.expected_version + 1),
            );
        }
        Ok(())
    }
}

/// In-memory [`MasterDataStore`] backed by fixture records
#[derive(Default)]
pub struct InMemoryMasterDataStore {
    products: HashMap<String, ProductCostingRecord>,
    taxes: HashMap<String, TaxRecord>,
    forms: HashMap<String, FormConfigRecord>,
}

impl InMemoryMasterDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, id: &str, record: ProductCostingRecord) -> Self {
        self.products.insert(id.to_string(), record);
        self
    }

    pub fn with_tax(mut self, id: &str, record: TaxRecord) -> Self {
        self.taxes.insert(id.to_string(), record);
        self
    }

    pub fn with_form(mut self, id: &str, record: FormConfigRecord) -> Self {
        self.forms.insert(id.to_string(), record);
        self
    }
}

#[async_trait]
impl MasterDataStore for InMemoryMasterDataStore {
    async fn product_costing(&self, product_id: &str) -> Result<ProductCostingRecord, StoreError> {
        self.products
            .get(product_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(product_id.to_string()))
    }

    async fn tax_info(&self, tax_id: &str) -> Result<TaxRecord, StoreError> {
        self.taxes
            .get(tax_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(tax_id.to_string()))
    }

    async fn form_config(&self, form_id: &str) -> Result<FormConfigRecord, StoreError> {
        self.forms
            .get(form_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(form_id.to_string()))
    }
}

pub fn standard_mapping() -> AccountMapping {
    AccountMapping {
        account_receivable: Some("1100".to_string()),
        account_payable: Some("2100".to_string()),
        accrued_ar: Some("1190".to_string()),
        accrued_tax: Some("2290".to_string()),
        clearing: Some("2800".to_string()),
        clearing_grni: Some("2150".to_string()),
        clearing_srni: Some("2160".to_string()),
        clearing_vat: Some("2170".to_string()),
        discount_on_tax: Some("6300".to_string()),
        undeposited_funds: Some("1050".to_string()),
    }
}

pub fn cash_basis_form() -> FormConfigRecord {
    FormConfigRecord {
        form_type: "CASH_BASIS".to_string(),
        mapping: standard_mapping(),
    }
}

pub fn widget_product() -> ProductCostingRecord {
    ProductCostingRecord {
        item_type_id: "inventory_item".to_string(),
        sales_account: Some("4000".to_string()),
        cogs_account: Some("5000".to_string()),
        inventory_account: Some("1300".to_string()),
        expense_account: None,
        average_cost: dec!(12.00),
        standard_cost: dec!(11.00),
    }
}

pub fn service_product() -> ProductCostingRecord {
    ProductCostingRecord {
        item_type_id: "service_item".to_string(),
        sales_account: Some("4100".to_string()),
        cogs_account: None,
        inventory_account: None,
        expense_account: Some("6000".to_string()),
        average_cost: Decimal::ZERO,
        standard_cost: Decimal::ZERO,
    }
}

pub fn vat10() -> TaxRecord {
    TaxRecord {
        tax_account: Some("2200".to_string()),
        tax_rate: dec!(10),
    }
}

pub fn master_data() -> InMemoryMasterDataStore {
    InMemoryMasterDataStore::new()
        .with_form("form_cash", cash_basis_form())
        .with_product("widget", widget_product())
        .with_product("service", service_product())
        .with_tax("vat10", vat10())
}

pub fn line_item(product: &str, qty: Decimal, rate: Decimal, tax: Option<&str>) -> LineItem {
    LineItem {
        product_id: product.to_string(),
        quantity: qty,
        rate,
        tax_id: tax.map(str::to_string),
        discount: None,
        reason: None,
    }
}

pub fn request(record_type: RecordType, form_id: &str, items: Vec<LineItem>) -> PostingRequestV1 {
    let total: Decimal = items.iter().map(|i| i.quantity * i.rate).sum();
    PostingRequestV1 {
        record_type,
        record_id: Some("rec_1".to_string()),
        form_id: form_id.to_string(),
        date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        total_amount: total,
        discount: None,
        calculated_totals: None,
        line_items: items,
    }
}

/// Initialize test logging once; later calls are no-ops
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_test_writer()
        .try_init();
}
