//! Posting rule engine
//!
//! Builds the draft set of debit/credit lines for one business
//! transaction. Dispatch is a closed match over `RecordType` x
//! [`FormType`]; every recipe emits matched pairs/triples so the returned
//! draft balances by construction. A recipe branch that cannot be fully
//! resolved (missing cost, missing adjustment reason) returns a
//! [`Rejection`] and emits nothing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::contracts::journal::{JournalLine, PostingDraft};
use crate::contracts::posting_request_v1::{LineItem, PostingRequestV1, RecordType};
use crate::services::account_config::{slot, FormConfig, FormType};
use crate::services::costing::{ItemType, ProductCostingInfo, ResolvedCosting};
use crate::services::rounding::{line_amounts, round_money, LineAmounts};
use crate::validation::Rejection;

/// Build the posting draft for a transaction
pub fn build_posting(
    request: &PostingRequestV1,
    config: &FormConfig,
    costing: &ResolvedCosting,
) -> Result<PostingDraft, Rejection> {
    let draft = match request.record_type {
        RecordType::Invoice => build_invoice(request, config, costing)?,
        RecordType::ItemFulfillment => build_fulfillment(request, config, costing)?,
        RecordType::CreditMemo => build_memo(request, config, costing, MemoSide::Credit)?,
        RecordType::DebitMemo => build_memo(request, config, costing, MemoSide::Debit)?,
        RecordType::InventoryAdjustment => build_inventory_adjustment(request, costing)?,
        RecordType::ItemReceipt => build_item_receipt(request, config, costing)?,
        RecordType::VendorBill => build_vendor_bill(request, config, costing)?,
        RecordType::VendorCredit => build_vendor_credit(request, config, costing)?,
        RecordType::VendorPayment => build_vendor_payment(request, config)?,
        RecordType::CustomerPayment => build_customer_payment(request, config)?,
    };

    tracing::debug!(
        record_type = %request.record_type,
        lines = draft.lines.len(),
        total_debits = %draft.total_debits(),
        "Built posting draft"
    );

    Ok(draft)
}

/// Accumulates lines for one draft; zero-amount lines are never emitted
struct DraftBuilder {
    record_type: RecordType,
    record_id: Option<String>,
    date: NaiveDate,
    lines: Vec<JournalLine>,
}

impl DraftBuilder {
    fn new(request: &PostingRequestV1) -> Self {
        Self {
            record_type: request.record_type,
            record_id: request.record_id.clone(),
            date: request.date,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, account_id: String, debit: Decimal, credit: Decimal, memo: &str) {
        if debit.is_zero() && credit.is_zero() {
            return;
        }
        self.lines.push(JournalLine {
            id: None,
            account_id,
            debit,
            credit,
            memo: memo.to_string(),
            record_type: Some(self.record_type),
            record_id: self.record_id.clone(),
            date: self.date,
        });
    }

    fn debit(&mut self, account_id: String, amount: Decimal, memo: &str) {
        self.push(account_id, amount, Decimal::ZERO, memo);
    }

    fn credit(&mut self, account_id: String, amount: Decimal, memo: &str) {
        self.push(account_id, Decimal::ZERO, amount, memo);
    }

    fn finish(self, total_amount: Decimal) -> PostingDraft {
        PostingDraft {
            record_type: self.record_type,
            record_id: self.record_id,
            date: self.date,
            total_amount,
            lines: self.lines,
        }
    }
}

/// A line item joined with its product attributes and priced amounts
struct PricedItem<'a> {
    item: &'a LineItem,
    product: &'a ProductCostingInfo,
    amounts: LineAmounts,
}

fn price_items<'a>(
    request: &'a PostingRequestV1,
    costing: &'a ResolvedCosting,
) -> Result<Vec<PricedItem<'a>>, Rejection> {
    request
        .line_items
        .iter()
        .map(|item| {
            let product = costing.product(&item.product_id).ok_or_else(|| {
                Rejection::new(format!(
                    "item {} has no accounting configuration",
                    item.product_id
                ))
            })?;
            let amounts = line_amounts(
                item.quantity,
                item.rate,
                item.discount_amount(),
                costing.tax_rate_for(item),
            );
            Ok(PricedItem {
                item,
                product,
                amounts,
            })
        })
        .collect()
}

fn subtotal_total(priced: &[PricedItem<'_>]) -> Decimal {
    priced.iter().map(|p| p.amounts.subtotal).sum()
}

fn tax_total(priced: &[PricedItem<'_>]) -> Decimal {
    priced.iter().map(|p| p.amounts.tax).sum()
}

/// Group tax amounts by tax account, one line per distinct account.
/// BTreeMap keeps line order deterministic.
fn tax_by_account(
    priced: &[PricedItem<'_>],
    costing: &ResolvedCosting,
) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for p in priced {
        if p.amounts.tax.is_zero() {
            continue;
        }
        let account = p
            .item
            .tax_id
            .as_deref()
            .and_then(|id| costing.tax(id))
            .and_then(|tax| tax.tax_account.clone())
            .unwrap_or_default();
        *totals.entry(account).or_insert(Decimal::ZERO) += p.amounts.tax;
    }
    totals
}

/// Which account absorbs the credit side of a COGS posting
enum CogsOffset<'a> {
    /// Inventory account (expense account for non-inventory items)
    ItemAccount,
    /// A single form-level clearing slot
    Clearing(&'a Option<String>),
}

/// Emit the cost-of-goods pair for every costed item.
///
/// Inventory items cost at average, others at standard; a zero or missing
/// authoritative cost rejects the whole draft. Non-inventory items
/// without a COGS account do not participate.
fn push_cogs_lines(
    builder: &mut DraftBuilder,
    priced: &[PricedItem<'_>],
    offset: CogsOffset<'_>,
) -> Result<(), Rejection> {
    for p in priced {
        let costed =
            p.product.item_type == ItemType::Inventory || p.product.cogs_account.is_some();
        if !costed {
            continue;
        }

        let cost = p.product.unit_cost();
        if cost <= Decimal::ZERO {
            return Err(cost_invalid(p));
        }

        let amount = round_money(cost * p.item.quantity.abs());
        if amount.is_zero() {
            continue;
        }

        let (offset_account, offset_memo) = match &offset {
            CogsOffset::ItemAccount => match p.product.item_type {
                ItemType::Inventory => (slot(&p.product.inventory_account), "Inventory"),
                ItemType::NonInventory => (slot(&p.product.expense_account), "Expense"),
            },
            CogsOffset::Clearing(clearing) => (slot(clearing), "Expense clearing"),
        };

        builder.debit(
            slot(&p.product.cogs_account),
            amount,
            "Cost of goods sold",
        );
        builder.credit(offset_account, amount, offset_memo);
    }
    Ok(())
}

fn cost_invalid(p: &PricedItem<'_>) -> Rejection {
    let method = match p.product.item_type {
        ItemType::Inventory => "average",
        ItemType::NonInventory => "standard",
    };
    Rejection::new(format!(
        "item {}: {} cost is missing or zero",
        p.item.product_id, method
    ))
}

fn unsupported(form_type: FormType, record_type: RecordType) -> Rejection {
    Rejection::new(format!(
        "form type {:?} does not support {} posting",
        form_type, record_type
    ))
}

fn build_invoice(
    request: &PostingRequestV1,
    config: &FormConfig,
    costing: &ResolvedCosting,
) -> Result<PostingDraft, Rejection> {
    if request.line_items.is_empty() {
        return Err(Rejection::new("invoice has no line items to post"));
    }

    let priced = price_items(request, costing)?;
    let m = &config.mapping;
    let mut b = DraftBuilder::new(request);

    let subtotal = subtotal_total(&priced);
    let tax = tax_total(&priced);
    let net = round_money(subtotal + tax);

    match config.form_type {
        FormType::CashBasis => {
            b.debit(slot(&m.account_receivable), net, "Accounts receivable");
            for p in &priced {
                b.credit(slot(&p.product.sales_account), p.amounts.subtotal, "Sales");
            }
            for (account, amount) in tax_by_account(&priced, costing) {
                b.credit(account, amount, "Tax payable");
            }
            push_cogs_lines(&mut b, &priced, CogsOffset::ItemAccount)?;
        }

        FormType::Gaap => {
            // Revenue and COGS were recognized at fulfillment; the invoice
            // relieves the accruals and books the receivable.
            b.debit(slot(&m.account_receivable), net, "Accounts receivable");
            b.credit(slot(&m.accrued_ar), subtotal, "Accrued receivable");
            b.credit(slot(&m.accrued_tax), tax, "Accrued tax");
        }

        FormType::GaapOnDiscount => {
            if subtotal.is_zero() {
                return Err(Rejection::new("invoice has no billable amount"));
            }

            // Legacy behavior preserved: the discount's tax effect uses the
            // blended average rate across all lines, not each line's own
            // rate. Untaxed lines therefore absorb part of the tax relief.
            let discount = round_money(request.discount.unwrap_or(Decimal::ZERO));
            let avg_rate = tax / subtotal * Decimal::ONE_HUNDRED;
            let discounted_subtotal = round_money(subtotal - discount);
            let tax_after_discount =
                round_money(discounted_subtotal * avg_rate / Decimal::ONE_HUNDRED);
            let discount_tax = tax - tax_after_discount;
            let net_after_discount = round_money(discounted_subtotal + tax_after_discount);

            b.debit(
                slot(&m.account_receivable),
                net_after_discount,
                "Accounts receivable",
            );
            b.debit(slot(&m.discount_on_tax), discount, "Discount");
            b.debit(slot(&m.discount_on_tax), discount_tax, "Discount on tax");
            b.credit(slot(&m.accrued_ar), subtotal, "Accrued receivable");
            b.credit(slot(&m.accrued_tax), tax, "Accrued tax");
        }

        other => return Err(unsupported(other, request.record_type)),
    }

    Ok(b.finish(net))
}

fn build_fulfillment(
    request: &PostingRequestV1,
    config: &FormConfig,
    costing: &ResolvedCosting,
) -> Result<PostingDraft, Rejection> {
    let priced = price_items(request, costing)?;
    let m = &config.mapping;
    let mut b = DraftBuilder::new(request);

    match config.form_type {
        FormType::Gaap => {
            // Recognize revenue against the deferred receivable per line,
            // then move cost out of inventory.
            for p in &priced {
                b.debit(slot(&m.accrued_ar), p.amounts.subtotal, "Accrued receivable");
                b.credit(slot(&p.product.sales_account), p.amounts.subtotal, "Sales");
            }
            push_cogs_lines(&mut b, &priced, CogsOffset::ItemAccount)?;
        }

        FormType::ExpenseClearing => {
            for p in &priced {
                let cost = p.product.unit_cost();
                if cost <= Decimal::ZERO {
                    return Err(cost_invalid(p));
                }
                let amount = round_money(cost * p.item.quantity.abs());
                if amount.is_zero() {
                    continue;
                }
                let (account, memo) = match p.product.item_type {
                    ItemType::Inventory => (slot(&p.product.inventory_account), "Inventory"),
                    ItemType::NonInventory => (slot(&p.product.expense_account), "Expense"),
                };
                b.debit(slot(&m.clearing), amount, "Expense clearing");
                b.credit(account, amount, memo);
            }
        }

        FormType::CostOnly => {
            push_cogs_lines(&mut b, &priced, CogsOffset::ItemAccount)?;
        }

        other => return Err(unsupported(other, request.record_type)),
    }

    let total = b_total(&b);
    Ok(b.finish(total))
}

// Fulfillments carry no header amount of their own; the draft total is
// the debit side of whatever the recipe produced.
fn b_total(builder: &DraftBuilder) -> Decimal {
    builder.lines.iter().map(|l| l.debit).sum()
}

enum MemoSide {
    Credit,
    Debit,
}

fn build_memo(
    request: &PostingRequestV1,
    config: &FormConfig,
    costing: &ResolvedCosting,
    side: MemoSide,
) -> Result<PostingDraft, Rejection> {
    if request.line_items.is_empty() {
        return Err(Rejection::new("memo has no line items to post"));
    }

    let priced = price_items(request, costing)?;
    let m = &config.mapping;
    let mut b = DraftBuilder::new(request);

    let subtotal = subtotal_total(&priced);
    let tax = tax_total(&priced);
    let net = round_money(subtotal + tax);

    match side {
        MemoSide::Credit => {
            b.credit(slot(&m.account_receivable), net, "Accounts receivable");
            for p in &priced {
                b.debit(slot(&p.product.sales_account), p.amounts.subtotal, "Sales");
            }
            for (account, amount) in tax_by_account(&priced, costing) {
                b.debit(account, amount, "Tax payable");
            }
        }
        MemoSide::Debit => {
            b.debit(slot(&m.account_receivable), net, "Accounts receivable");
            for p in &priced {
                b.credit(slot(&p.product.sales_account), p.amounts.subtotal, "Sales");
            }
            for (account, amount) in tax_by_account(&priced, costing) {
                b.credit(account, amount, "Tax payable");
            }
        }
    }

    Ok(b.finish(net))
}

/// Split an adjustment reason of the form `"<label>$<accountId>"`
fn parse_reason_account(reason: Option<&str>) -> Option<(String, String)> {
    let (label, account) = reason?.split_once('$')?;
    if account.trim().is_empty() {
        return None;
    }
    Some((label.to_string(), account.to_string()))
}

fn build_inventory_adjustment(
    request: &PostingRequestV1,
    costing: &ResolvedCosting,
) -> Result<PostingDraft, Rejection> {
    let mut b = DraftBuilder::new(request);
    let mut total = Decimal::ZERO;

    for item in &request.line_items {
        if item.quantity.is_zero() {
            continue;
        }

        let product = costing.product(&item.product_id).ok_or_else(|| {
            Rejection::new(format!(
                "item {} has no accounting configuration",
                item.product_id
            ))
        })?;

        if product.average_cost <= Decimal::ZERO {
            return Err(Rejection::new(format!(
                "item {}: average cost is missing or zero",
                item.product_id
            )));
        }

        let (label, reason_account) = parse_reason_account(item.reason.as_deref())
            .ok_or_else(|| {
                Rejection::new(format!(
                    "adjustment line for item {} has no reason account",
                    item.product_id
                ))
            })?;

        let amount = round_money(product.average_cost * item.quantity.abs());
        let inventory = slot(&product.inventory_account);

        if item.quantity > Decimal::ZERO {
            b.debit(inventory, amount, "Inventory");
            b.credit(reason_account, amount, &label);
        } else {
            b.debit(reason_account, amount, &label);
            b.credit(inventory, amount, "Inventory");
        }
        total += amount;
    }

    Ok(b.finish(total))
}

fn build_item_receipt(
    request: &PostingRequestV1,
    config: &FormConfig,
    costing: &ResolvedCosting,
) -> Result<PostingDraft, Rejection> {
    let priced = price_items(request, costing)?;
    let m = &config.mapping;
    let mut b = DraftBuilder::new(request);

    for p in &priced {
        let (account, memo) = match p.product.item_type {
            ItemType::Inventory => (slot(&p.product.inventory_account), "Inventory"),
            ItemType::NonInventory => (slot(&p.product.expense_account), "Expense"),
        };
        b.debit(account, p.amounts.subtotal, memo);
        b.debit(slot(&m.clearing_vat), p.amounts.tax, "VAT clearing");
        b.credit(slot(&m.clearing_grni), p.amounts.net, "GRNI clearing");
    }

    let total: Decimal = priced.iter().map(|p| p.amounts.net).sum();
    Ok(b.finish(total))
}

fn build_vendor_bill(
    request: &PostingRequestV1,
    config: &FormConfig,
    costing: &ResolvedCosting,
) -> Result<PostingDraft, Rejection> {
    if request.line_items.is_empty() {
        return Err(Rejection::new("vendor bill has no line items to post"));
    }

    let priced = price_items(request, costing)?;
    let m = &config.mapping;
    let mut b = DraftBuilder::new(request);

    let subtotal = subtotal_total(&priced);
    let tax = tax_total(&priced);
    let net = round_money(subtotal + tax);

    // The bill relieves GRNI booked at receipt and books input VAT.
    b.credit(slot(&m.account_payable), net, "Accounts payable");
    for p in &priced {
        b.debit(slot(&m.clearing_grni), p.amounts.subtotal, "GRNI clearing");
    }
    b.debit(slot(&m.clearing_vat), tax, "VAT clearing");

    Ok(b.finish(net))
}

fn build_vendor_credit(
    request: &PostingRequestV1,
    config: &FormConfig,
    costing: &ResolvedCosting,
) -> Result<PostingDraft, Rejection> {
    if request.line_items.is_empty() {
        return Err(Rejection::new("vendor credit has no line items to post"));
    }

    let priced = price_items(request, costing)?;
    let m = &config.mapping;
    let mut b = DraftBuilder::new(request);

    let subtotal = subtotal_total(&priced);
    let tax = tax_total(&priced);
    let net = round_money(subtotal + tax);

    b.debit(slot(&m.account_payable), net, "Accounts payable");
    for p in &priced {
        b.credit(slot(&m.clearing_srni), p.amounts.subtotal, "SRNI clearing");
    }
    b.credit(slot(&m.clearing_vat), tax, "VAT clearing");

    Ok(b.finish(net))
}

fn build_vendor_payment(
    request: &PostingRequestV1,
    config: &FormConfig,
) -> Result<PostingDraft, Rejection> {
    let m = &config.mapping;
    let amount = round_money(request.total_amount);
    let mut b = DraftBuilder::new(request);

    b.debit(slot(&m.account_payable), amount, "Accounts payable");
    b.credit(slot(&m.undeposited_funds), amount, "Undeposited funds");

    Ok(b.finish(amount))
}

fn build_customer_payment(
    request: &PostingRequestV1,
    config: &FormConfig,
) -> Result<PostingDraft, Rejection> {
    let m = &config.mapping;
    let amount = round_money(request.total_amount);
    let mut b = DraftBuilder::new(request);

    b.debit(slot(&m.undeposited_funds), amount, "Undeposited funds");
    b.credit(slot(&m.account_receivable), amount, "Accounts receivable");

    Ok(b.finish(amount))
}
