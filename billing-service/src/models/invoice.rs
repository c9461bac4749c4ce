//! Invoice and line item models for billing-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line the caller asks to bill: which item, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub item_id: Uuid,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl RequestedLine {
    pub fn new(item_id: Uuid, quantity: i64) -> Self {
        Self {
            item_id,
            quantity: Some(quantity),
        }
    }
}

/// Priced line on an invoice. `line_total` is the raw product, unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: Uuid,
    pub name: String,
    pub model_number: String,
    pub description: Option<String>,
    pub list_price: Decimal,
    pub special_price: Decimal,
    pub quantity: i64,
    pub line_total: Decimal,
}

/// Priced invoice totals.
///
/// `net_amount == round(subtotal + tax_amount, 2)` holds for every value
/// produced by `InvoiceCalculator`. The only permitted mutation is the
/// unpaid to paid transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub net_amount: Decimal,
    pub line_items: Vec<LineItem>,
    pub paid: bool,
    pub created_by: String,
}
