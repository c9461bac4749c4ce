use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Bill, BillDetails, RequestedLine, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedItem {
    pub id: Uuid,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl From<&SelectedItem> for RequestedLine {
    fn from(item: &SelectedItem) -> Self {
        Self {
            item_id: item.id,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBillRequest {
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_no: String,

    pub ref_number: Option<String>,

    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,

    pub to: Option<String>,
    pub address: Option<String>,
    pub branch: Option<String>,
    pub location: Option<String>,

    #[validate(length(min = 1, message = "At least one item must be selected"))]
    pub selected_items: Vec<SelectedItem>,

    pub paid: Option<bool>,
    /// Replaces the computed GST when present.
    pub tax_amount: Option<Decimal>,

    pub delivery_terms: Option<String>,
    pub payment_terms: Option<String>,
    pub warranty: Option<String>,
    pub bank_details: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

impl CreateBillRequest {
    /// Split into printable details and the lines to price.
    ///
    /// `to` falls back to the customer name and `address` to the location.
    pub fn into_parts(self) -> (BillDetails, Vec<RequestedLine>) {
        let lines = self.selected_items.iter().map(RequestedLine::from).collect();
        let details = BillDetails {
            to: self.to.unwrap_or_else(|| self.customer_name.clone()),
            address: self
                .address
                .or_else(|| self.location.clone())
                .unwrap_or_default(),
            invoice_no: self.invoice_no,
            ref_number: self.ref_number,
            customer_name: self.customer_name,
            branch: self.branch,
            location: self.location,
            delivery_terms: self.delivery_terms,
            payment_terms: self.payment_terms,
            warranty: self.warranty,
            bank_details: self.bank_details,
            contact_person: self.contact_person,
            contact_phone: self.contact_phone,
        };
        (details, lines)
    }
}

/// Bill with the account that created it.
#[derive(Debug, Serialize)]
pub struct BillResponse {
    #[serde(flatten)]
    pub bill: Bill,
    pub billed_by: Option<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct BillListResponse {
    pub bills: Vec<BillResponse>,
}
