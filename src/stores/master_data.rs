//! Master Data Store collaborator
//!
//! Per-product accounting attributes, per-tax attributes, and per-form
//! posting configuration. Records come back in wire shape; decoding into
//! engine types happens in the resolver/lookup services.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::services::account_config::AccountMapping;
use crate::stores::StoreError;

/// Raw per-product accounting record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductCostingRecord {
    /// Item type discriminator id; a fixed id marks inventory items
    pub item_type_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cogs_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_account: Option<String>,

    #[serde(default)]
    pub average_cost: Decimal,

    #[serde(default)]
    pub standard_cost: Decimal,
}

/// Raw per-tax record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaxRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_account: Option<String>,

    /// Percent rate; a zero rate emits no tax line
    #[serde(default)]
    pub tax_rate: Decimal,
}

/// Raw per-form record: the form-type code plus its account mapping slots
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormConfigRecord {
    pub form_type: String,

    #[serde(default)]
    pub mapping: AccountMapping,
}

/// Read access to product, tax, and form master data
#[async_trait]
pub trait MasterDataStore: Send + Sync {
    async fn product_costing(&self, product_id: &str) -> Result<ProductCostingRecord, StoreError>;

    async fn tax_info(&self, tax_id: &str) -> Result<TaxRecord, StoreError>;

    async fn form_config(&self, form_id: &str) -> Result<FormConfigRecord, StoreError>;
}

/// HTTP implementation of [`MasterDataStore`]
pub struct HttpMasterDataStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMasterDataStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let endpoint = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let response = self.client.get(&endpoint).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(StoreError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MasterDataStore for HttpMasterDataStore {
    async fn product_costing(&self, product_id: &str) -> Result<ProductCostingRecord, StoreError> {
        self.get_json(&format!("products/{}/accounting", product_id), product_id)
            .await
    }

    async fn tax_info(&self, tax_id: &str) -> Result<TaxRecord, StoreError> {
        self.get_json(&format!("taxes/{}", tax_id), tax_id).await
    }

    async fn form_config(&self, form_id: &str) -> Result<FormConfigRecord, StoreError> {
        self.get_json(&format!("forms/{}", form_id), form_id).await
    }
}
