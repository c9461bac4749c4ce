//! Bill model: a persisted invoice plus customer and terms details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Invoice;

/// Customer, delivery and payment details printed on a bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillDetails {
    pub invoice_no: String,
    pub ref_number: Option<String>,
    pub customer_name: String,
    pub to: String,
    pub address: String,
    pub branch: Option<String>,
    pub location: Option<String>,
    pub delivery_terms: Option<String>,
    pub payment_terms: Option<String>,
    pub warranty: Option<String>,
    pub bank_details: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
}

/// Stored bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: BillDetails,
    #[serde(flatten)]
    pub invoice: Invoice,
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a freshly priced bill.
#[derive(Debug, Clone)]
pub struct CreateBill {
    pub details: BillDetails,
    pub invoice: Invoice,
}
