//! Persistence capability injected into handlers through `AppState`.

use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Bill, CatalogItem, CreateBill, CreateItem, CreateUser, UpdateItem, UpdateProfile, UpdateUser,
    User,
};

/// Result of an attempt to settle a bill.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Paid(Bill),
    AlreadyPaid,
    NotFound,
}

/// Storage for users, catalog items and bills.
///
/// `mark_bill_paid` must be atomic so two concurrent payments cannot both
/// return `Paid`.
#[async_trait]
pub trait BillingStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Users
    async fn create_user(&self, input: &CreateUser) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn update_user(&self, user_id: Uuid, input: &UpdateUser)
        -> Result<Option<User>, AppError>;
    async fn update_profile(
        &self,
        user_id: Uuid,
        input: &UpdateProfile,
    ) -> Result<Option<User>, AppError>;
    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AppError>;

    // Catalog
    async fn create_item(&self, input: &CreateItem) -> Result<CatalogItem, AppError>;
    async fn list_items(&self) -> Result<Vec<CatalogItem>, AppError>;
    async fn get_item(&self, item_id: Uuid) -> Result<Option<CatalogItem>, AppError>;
    async fn find_items(&self, item_ids: &[Uuid]) -> Result<Vec<CatalogItem>, AppError>;
    async fn update_item(
        &self,
        item_id: Uuid,
        input: &UpdateItem,
    ) -> Result<Option<CatalogItem>, AppError>;
    async fn delete_item(&self, item_id: Uuid) -> Result<bool, AppError>;

    // Bills
    async fn create_bill(&self, input: &CreateBill) -> Result<Bill, AppError>;
    /// Newest first.
    async fn list_bills(&self) -> Result<Vec<Bill>, AppError>;
    async fn get_bill(&self, bill_id: Uuid) -> Result<Option<Bill>, AppError>;
    async fn mark_bill_paid(&self, bill_id: Uuid) -> Result<PaymentOutcome, AppError>;
}
