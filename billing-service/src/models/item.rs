//! Catalog item model for billing-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Sellable product with list and special pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub model_number: String,
    pub list_price: Decimal,
    pub special_price: Decimal,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a catalog item.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub name: String,
    pub model_number: String,
    pub list_price: Decimal,
    pub special_price: Decimal,
    pub description: Option<String>,
}

/// Input for updating a catalog item.
#[derive(Debug, Clone, Default)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub model_number: Option<String>,
    pub list_price: Option<Decimal>,
    pub special_price: Option<Decimal>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}
