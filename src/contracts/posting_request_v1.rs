//! Posting Request V1 Contract Types
//!
//! The input handed to the engine by the enclosing transaction-save
//! workflow: the business transaction's line items, form reference, and
//! precomputed totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Business transaction types that generate ledger postings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    Invoice,
    ItemFulfillment,
    CreditMemo,
    DebitMemo,
    InventoryAdjustment,
    ItemReceipt,
    VendorBill,
    VendorCredit,
    VendorPayment,
    CustomerPayment,
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invoice => write!(f, "INVOICE"),
            Self::ItemFulfillment => write!(f, "ITEM_FULFILLMENT"),
            Self::CreditMemo => write!(f, "CREDIT_MEMO"),
            Self::DebitMemo => write!(f, "DEBIT_MEMO"),
            Self::InventoryAdjustment => write!(f, "INVENTORY_ADJUSTMENT"),
            Self::ItemReceipt => write!(f, "ITEM_RECEIPT"),
            Self::VendorBill => write!(f, "VENDOR_BILL"),
            Self::VendorCredit => write!(f, "VENDOR_CREDIT"),
            Self::VendorPayment => write!(f, "VENDOR_PAYMENT"),
            Self::CustomerPayment => write!(f, "CUSTOMER_PAYMENT"),
        }
    }
}

/// One transaction line item as entered on the form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product/item identifier in master data
    pub product_id: String,

    /// Quantity; signed for inventory adjustments (negative = write-down)
    pub quantity: Decimal,

    /// Unit rate in transaction currency
    pub rate: Decimal,

    /// Tax code applied to this line, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    /// Line-level discount amount (currency units, not percent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,

    /// Adjustment reason in `"<label>$<accountId>"` form
    /// (inventory adjustments only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LineItem {
    /// Line-level discount, defaulting to zero
    pub fn discount_amount(&self) -> Decimal {
        self.discount.unwrap_or(Decimal::ZERO)
    }
}

/// Totals precomputed by the calling workflow (optional; the engine
/// recomputes per-line amounts either way)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedTotals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_total: Option<Decimal>,
}

/// Payload for one posting request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostingRequestV1 {
    /// Transaction type selecting the posting recipe
    pub record_type: RecordType,

    /// Identifier of the business record; None for drafts posted before
    /// header creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    /// Form whose configuration supplies the account mapping and form type
    pub form_id: String,

    /// Transaction date (accounting date for every generated line)
    pub date: NaiveDate,

    /// Transaction total as shown on the form
    pub total_amount: Decimal,

    /// Header-level discount amount, if the form applies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_totals: Option<CalculatedTotals>,

    pub line_items: Vec<LineItem>,
}
