//! Product and tax attribute resolution
//!
//! Deduplicates the product/tax ids referenced by a transaction's line
//! items and fetches their accounting attributes concurrently. A failed
//! lookup fails the whole resolution — the engine never builds a draft
//! from a partially resolved item set.

use futures::future::try_join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::contracts::posting_request_v1::LineItem;
use crate::stores::{MasterDataStore, StoreError};

/// Master-data item type id that marks perpetual-inventory items
pub const INVENTORY_ITEM_TYPE_ID: &str = "inventory_item";

/// Inventory vs. non-inventory, selecting the authoritative costing method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Inventory,
    NonInventory,
}

/// Decoded per-product accounting attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCostingInfo {
    pub item_type: ItemType,
    pub sales_account: Option<String>,
    pub cogs_account: Option<String>,
    pub inventory_account: Option<String>,
    pub expense_account: Option<String>,
    pub average_cost: Decimal,
    pub standard_cost: Decimal,
}

impl ProductCostingInfo {
    /// Authoritative unit cost: average for inventory items, standard
    /// otherwise
    pub fn unit_cost(&self) -> Decimal {
        match self.item_type {
            ItemType::Inventory => self.average_cost,
            ItemType::NonInventory => self.standard_cost,
        }
    }
}

/// Decoded per-tax attributes
#[derive(Debug, Clone, PartialEq)]
pub struct TaxInfo {
    pub tax_account: Option<String>,
    pub tax_rate: Decimal,
}

/// Product and tax attributes resolved for one transaction
#[derive(Debug, Clone, Default)]
pub struct ResolvedCosting {
    products: HashMap<String, ProductCostingInfo>,
    taxes: HashMap<String, TaxInfo>,
}

impl ResolvedCosting {
    pub fn product(&self, product_id: &str) -> Option<&ProductCostingInfo> {
        self.products.get(product_id)
    }

    pub fn tax(&self, tax_id: &str) -> Option<&TaxInfo> {
        self.taxes.get(tax_id)
    }

    /// Effective tax rate for a line item; no tax code means zero rate
    pub fn tax_rate_for(&self, item: &LineItem) -> Decimal {
        item.tax_id
            .as_deref()
            .and_then(|id| self.taxes.get(id))
            .map(|tax| tax.tax_rate)
            .unwrap_or(Decimal::ZERO)
    }

    #[cfg(test)]
    pub fn with_entries(
        products: Vec<(String, ProductCostingInfo)>,
        taxes: Vec<(String, TaxInfo)>,
    ) -> Self {
        Self {
            products: products.into_iter().collect(),
            taxes: taxes.into_iter().collect(),
        }
    }
}

/// Resolve accounting attributes for every product and tax referenced by
/// the line items. Lookups for distinct ids are issued concurrently and
/// awaited jointly.
pub async fn resolve_costing(
    store: &dyn MasterDataStore,
    items: &[LineItem],
) -> Result<ResolvedCosting, StoreError> {
    let mut product_ids: Vec<String> = items.iter().map(|i| i.product_id.clone()).collect();
    product_ids.sort();
    product_ids.dedup();

    let mut tax_ids: Vec<String> = items.iter().filter_map(|i| i.tax_id.clone()).collect();
    tax_ids.sort();
    tax_ids.dedup();

    let product_records = try_join_all(
        product_ids
            .iter()
            .map(|id| store.product_costing(id)),
    )
    .await?;

    let tax_records = try_join_all(tax_ids.iter().map(|id| store.tax_info(id))).await?;

    let products = product_ids
        .into_iter()
        .zip(product_records)
        .map(|(id, record)| {
            let item_type = if record.item_type_id == INVENTORY_ITEM_TYPE_ID {
                ItemType::Inventory
            } else {
                ItemType::NonInventory
            };
            (
                id,
                ProductCostingInfo {
                    item_type,
                    sales_account: record.sales_account,
                    cogs_account: record.cogs_account,
                    inventory_account: record.inventory_account,
                    expense_account: record.expense_account,
                    average_cost: record.average_cost,
                    standard_cost: record.standard_cost,
                },
            )
        })
        .collect();

    let taxes = tax_ids
        .into_iter()
        .zip(tax_records)
        .map(|(id, record)| {
            (
                id,
                TaxInfo {
                    tax_account: record.tax_account,
                    tax_rate: record.tax_rate,
                },
            )
        })
        .collect();

    Ok(ResolvedCosting { products, taxes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn inventory_product() -> ProductCostingInfo {
        ProductCostingInfo {
            item_type: ItemType::Inventory,
            sales_account: Some("4000".to_string()),
            cogs_account: Some("5000".to_string()),
            inventory_account: Some("1300".to_string()),
            expense_account: None,
            average_cost: dec!(12.00),
            standard_cost: dec!(11.50),
        }
    }

    #[test]
    fn test_unit_cost_by_item_type() {
        let mut product = inventory_product();
        assert_eq!(product.unit_cost(), dec!(12.00));

        product.item_type = ItemType::NonInventory;
        assert_eq!(product.unit_cost(), dec!(11.50));
    }

    #[test]
    fn test_tax_rate_for_untaxed_item() {
        let resolved = ResolvedCosting::with_entries(
            vec![("p1".to_string(), inventory_product())],
            vec![(
                "t1".to_string(),
                TaxInfo {
                    tax_account: Some("2200".to_string()),
                    tax_rate: dec!(10),
                },
            )],
        );

        let taxed = LineItem {
            product_id: "p1".to_string(),
            quantity: dec!(1),
            rate: dec!(10),
            tax_id: Some("t1".to_string()),
            discount: None,
            reason: None,
        };
        let untaxed = LineItem {
            tax_id: None,
            ..taxed.clone()
        };
        let unknown_tax = LineItem {
            tax_id: Some("t_missing".to_string()),
            ..taxed.clone()
        };

        assert_eq!(resolved.tax_rate_for(&taxed), dec!(10));
        assert_eq!(resolved.tax_rate_for(&untaxed), Decimal::ZERO);
        assert_eq!(resolved.tax_rate_for(&unknown_tax), Decimal::ZERO);
    }
}
