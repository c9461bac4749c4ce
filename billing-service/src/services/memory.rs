//! In-process store used by tests and by local runs without a database.

use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Bill, CatalogItem, CreateBill, CreateItem, CreateUser, UpdateItem, UpdateProfile, UpdateUser,
    User,
};
use crate::services::store::{BillingStore, PaymentOutcome};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    items: RwLock<HashMap<Uuid, CatalogItem>>,
    // Insertion order; listing walks it backwards.
    bills: RwLock<Vec<Bill>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BillingStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn create_user(&self, input: &CreateUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == input.email) {
            return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            phone: input.phone.clone(),
            role: input.role,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        input: &UpdateUser,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;

        if let Some(email) = &input.email {
            if users.values().any(|u| u.id != user_id && &u.email == email) {
                return Err(AppError::Conflict(anyhow::anyhow!("Email already registered")));
            }
        }

        let Some(user) = users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            user.name = name.clone();
        }
        if let Some(email) = &input.email {
            user.email = email.clone();
        }
        if let Some(role) = input.role {
            user.role = role;
        }
        Ok(Some(user.clone()))
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        input: &UpdateProfile,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&user_id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            user.name = name.clone();
        }
        if let Some(phone) = &input.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(hash) = &input.password_hash {
            user.password_hash = hash.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(&user_id).is_some())
    }

    async fn create_item(&self, input: &CreateItem) -> Result<CatalogItem, AppError> {
        let item = CatalogItem {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            model_number: input.model_number.clone(),
            list_price: input.list_price,
            special_price: input.special_price,
            description: input.description.clone(),
            created_at: Utc::now(),
        };
        self.items.write().await.insert(item.id, item.clone());
        Ok(item)
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, AppError> {
        let mut items: Vec<CatalogItem> = self.items.read().await.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_item(&self, item_id: Uuid) -> Result<Option<CatalogItem>, AppError> {
        Ok(self.items.read().await.get(&item_id).cloned())
    }

    async fn find_items(&self, item_ids: &[Uuid]) -> Result<Vec<CatalogItem>, AppError> {
        let items = self.items.read().await;
        Ok(item_ids
            .iter()
            .filter_map(|id| items.get(id).cloned())
            .collect())
    }

    async fn update_item(
        &self,
        item_id: Uuid,
        input: &UpdateItem,
    ) -> Result<Option<CatalogItem>, AppError> {
        let mut items = self.items.write().await;
        let Some(item) = items.get_mut(&item_id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            item.name = name.clone();
        }
        if let Some(model_number) = &input.model_number {
            item.model_number = model_number.clone();
        }
        if let Some(list_price) = input.list_price {
            item.list_price = list_price;
        }
        if let Some(special_price) = input.special_price {
            item.special_price = special_price;
        }
        if let Some(description) = &input.description {
            item.description = description.clone();
        }
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<bool, AppError> {
        Ok(self.items.write().await.remove(&item_id).is_some())
    }

    async fn create_bill(&self, input: &CreateBill) -> Result<Bill, AppError> {
        let bill = Bill {
            id: Uuid::new_v4(),
            details: input.details.clone(),
            invoice: input.invoice.clone(),
            created_at: Utc::now(),
        };
        self.bills.write().await.push(bill.clone());
        Ok(bill)
    }

    async fn list_bills(&self) -> Result<Vec<Bill>, AppError> {
        Ok(self.bills.read().await.iter().rev().cloned().collect())
    }

    async fn get_bill(&self, bill_id: Uuid) -> Result<Option<Bill>, AppError> {
        let bills = self.bills.read().await;
        Ok(bills.iter().find(|b| b.id == bill_id).cloned())
    }

    async fn mark_bill_paid(&self, bill_id: Uuid) -> Result<PaymentOutcome, AppError> {
        let mut bills = self.bills.write().await;
        match bills.iter_mut().find(|b| b.id == bill_id) {
            Some(bill) if bill.invoice.paid => Ok(PaymentOutcome::AlreadyPaid),
            Some(bill) => {
                bill.invoice.paid = true;
                Ok(PaymentOutcome::Paid(bill.clone()))
            }
            None => Ok(PaymentOutcome::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BillDetails, Invoice, Role};
    use rust_decimal::Decimal;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Meera".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            phone: None,
            role: Role::User,
        }
    }

    fn new_bill(invoice_no: &str) -> CreateBill {
        CreateBill {
            details: BillDetails {
                invoice_no: invoice_no.to_string(),
                customer_name: "Acme".to_string(),
                to: "Acme".to_string(),
                ..Default::default()
            },
            invoice: Invoice {
                subtotal: Decimal::ONE_HUNDRED,
                tax_amount: Decimal::new(18, 0),
                net_amount: Decimal::new(118, 0),
                line_items: Vec::new(),
                paid: false,
                created_by: "u1".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        store.create_user(&new_user("a@example.com")).await.unwrap();

        let err = store
            .create_user(&new_user("a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn bills_list_newest_first() {
        let store = InMemoryStore::new();
        store.create_bill(&new_bill("INV-1")).await.unwrap();
        store.create_bill(&new_bill("INV-2")).await.unwrap();

        let bills = store.list_bills().await.unwrap();
        let numbers: Vec<&str> = bills.iter().map(|b| b.details.invoice_no.as_str()).collect();
        assert_eq!(numbers, vec!["INV-2", "INV-1"]);
    }

    #[tokio::test]
    async fn bill_can_only_be_marked_paid_once() {
        let store = InMemoryStore::new();
        let bill = store.create_bill(&new_bill("INV-1")).await.unwrap();

        match store.mark_bill_paid(bill.id).await.unwrap() {
            PaymentOutcome::Paid(paid) => assert!(paid.invoice.paid),
            other => panic!("expected Paid, got {:?}", other),
        }
        assert_eq!(
            store.mark_bill_paid(bill.id).await.unwrap(),
            PaymentOutcome::AlreadyPaid
        );
    }

    #[tokio::test]
    async fn paying_missing_bill_is_not_found() {
        let store = InMemoryStore::new();
        assert_eq!(
            store.mark_bill_paid(Uuid::new_v4()).await.unwrap(),
            PaymentOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn find_items_skips_unknown_ids() {
        let store = InMemoryStore::new();
        let item = store
            .create_item(&CreateItem {
                name: "Router".to_string(),
                model_number: "RT-1".to_string(),
                list_price: Decimal::new(1200, 0),
                special_price: Decimal::new(999, 0),
                description: None,
            })
            .await
            .unwrap();

        let found = store
            .find_items(&[Uuid::new_v4(), item.id])
            .await
            .unwrap();
        assert_eq!(found, vec![item]);
    }
}
