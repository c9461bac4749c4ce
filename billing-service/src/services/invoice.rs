//! Invoice pricing: line extension, GST and net totals.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CatalogItem, Invoice, LineItem, RequestedLine};

/// GST rate applied to the subtotal unless the caller overrides the tax.
pub const GST_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("No valid items found")]
    NoValidItems,

    #[error("Bill is already paid")]
    AlreadyPaid,

    #[error("Invoice amount is out of range")]
    AmountOverflow,
}

/// Resolves item ids to catalog records; `None` means the item is unknown.
pub trait CatalogLookup {
    fn find_item(&self, item_id: &Uuid) -> Option<CatalogItem>;
}

impl CatalogLookup for HashMap<Uuid, CatalogItem> {
    fn find_item(&self, item_id: &Uuid) -> Option<CatalogItem> {
        self.get(item_id).cloned()
    }
}

impl CatalogLookup for [CatalogItem] {
    fn find_item(&self, item_id: &Uuid) -> Option<CatalogItem> {
        self.iter().find(|item| &item.id == item_id).cloned()
    }
}

impl CatalogLookup for Vec<CatalogItem> {
    fn find_item(&self, item_id: &Uuid) -> Option<CatalogItem> {
        self.as_slice().find_item(item_id)
    }
}

/// Adapts a plain function or closure into a catalog lookup.
pub struct FnLookup<F>(pub F);

impl<F> CatalogLookup for FnLookup<F>
where
    F: Fn(&Uuid) -> Option<CatalogItem>,
{
    fn find_item(&self, item_id: &Uuid) -> Option<CatalogItem> {
        (self.0)(item_id)
    }
}

/// Caller-controlled knobs for a single pricing request.
#[derive(Debug, Clone, Default)]
pub struct PricingOptions {
    /// Used verbatim instead of the derived GST when present.
    pub tax_amount: Option<Decimal>,
    pub paid: Option<bool>,
    pub created_by: String,
}

/// Stateless invoice pricing.
#[derive(Debug, Clone, Copy)]
pub struct InvoiceCalculator {
    tax_rate: Decimal,
}

impl Default for InvoiceCalculator {
    fn default() -> Self {
        Self { tax_rate: GST_RATE }
    }
}

/// Round half away from zero to 2 decimal places.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

impl InvoiceCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Price the requested lines against `catalog`.
    ///
    /// Unknown items are dropped, absent or non-positive quantities count
    /// as 1, and caller order is preserved. Only the tax and net amounts
    /// are rounded; line totals and the subtotal keep full precision.
    pub fn price_invoice<C>(
        &self,
        requested: &[RequestedLine],
        catalog: &C,
        options: PricingOptions,
    ) -> Result<Invoice, PricingError>
    where
        C: CatalogLookup + ?Sized,
    {
        let mut line_items = Vec::with_capacity(requested.len());
        for line in requested {
            let Some(item) = catalog.find_item(&line.item_id) else {
                continue;
            };
            let quantity = match line.quantity {
                Some(q) if q > 0 => q,
                _ => 1,
            };
            let line_total = item
                .special_price
                .checked_mul(Decimal::from(quantity))
                .ok_or(PricingError::AmountOverflow)?;
            line_items.push(LineItem {
                item_id: item.id,
                line_total,
                name: item.name,
                model_number: item.model_number,
                description: item.description,
                list_price: item.list_price,
                special_price: item.special_price,
                quantity,
            });
        }

        if line_items.is_empty() {
            return Err(PricingError::NoValidItems);
        }

        let subtotal = line_items
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.line_total))
            .ok_or(PricingError::AmountOverflow)?;
        let tax_amount = match options.tax_amount {
            Some(tax) => tax,
            None => subtotal
                .checked_mul(self.tax_rate)
                .map(round_money)
                .ok_or(PricingError::AmountOverflow)?,
        };
        let net_amount = subtotal
            .checked_add(tax_amount)
            .map(round_money)
            .ok_or(PricingError::AmountOverflow)?;

        Ok(Invoice {
            subtotal,
            tax_amount,
            net_amount,
            line_items,
            paid: options.paid.unwrap_or(false),
            created_by: options.created_by,
        })
    }

    /// The single allowed transition: unpaid to paid.
    pub fn mark_paid(&self, invoice: &Invoice) -> Result<Invoice, PricingError> {
        if invoice.paid {
            return Err(PricingError::AlreadyPaid);
        }

        Ok(Invoice {
            paid: true,
            ..invoice.clone()
        })
    }
}
