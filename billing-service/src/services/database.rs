//! PostgreSQL store for billing-service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    Bill, BillDetails, CatalogItem, CreateBill, CreateItem, CreateUser, Invoice, LineItem, Role,
    UpdateItem, UpdateProfile, UpdateUser, User,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{BillingStore, PaymentOutcome};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        phone TEXT,
        role TEXT NOT NULL DEFAULT 'USER',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        model_number TEXT NOT NULL,
        list_price NUMERIC NOT NULL CHECK (list_price >= 0),
        special_price NUMERIC NOT NULL CHECK (special_price >= 0),
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS bills (
        id UUID PRIMARY KEY,
        invoice_no TEXT NOT NULL,
        ref_number TEXT,
        customer_name TEXT NOT NULL,
        to_name TEXT NOT NULL,
        address TEXT NOT NULL,
        branch TEXT,
        location TEXT,
        delivery_terms TEXT,
        payment_terms TEXT,
        warranty TEXT,
        bank_details TEXT,
        contact_person TEXT,
        contact_phone TEXT,
        line_items JSONB NOT NULL,
        subtotal NUMERIC NOT NULL,
        tax_amount NUMERIC NOT NULL,
        net_amount NUMERIC NOT NULL,
        paid BOOLEAN NOT NULL DEFAULT FALSE,
        created_by TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bills_created_at ON bills (created_at DESC)",
];

const USER_COLUMNS: &str = "id, name, email, password_hash, phone, role, created_at";
const ITEM_COLUMNS: &str =
    "id, name, model_number, list_price, special_price, description, created_at";
const BILL_COLUMNS: &str = "id, invoice_no, ref_number, customer_name, to_name, address, branch, \
    location, delivery_terms, payment_terms, warranty, bank_details, contact_person, \
    contact_phone, line_items, subtotal, tax_amount, net_amount, paid, created_by, created_at";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    phone: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BillRow {
    id: Uuid,
    invoice_no: String,
    ref_number: Option<String>,
    customer_name: String,
    to_name: String,
    address: String,
    branch: Option<String>,
    location: Option<String>,
    delivery_terms: Option<String>,
    payment_terms: Option<String>,
    warranty: Option<String>,
    bank_details: Option<String>,
    contact_person: Option<String>,
    contact_phone: Option<String>,
    line_items: Json<Vec<LineItem>>,
    subtotal: Decimal,
    tax_amount: Decimal,
    net_amount: Decimal,
    paid: bool,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl From<BillRow> for Bill {
    fn from(row: BillRow) -> Self {
        Bill {
            id: row.id,
            details: BillDetails {
                invoice_no: row.invoice_no,
                ref_number: row.ref_number,
                customer_name: row.customer_name,
                to: row.to_name,
                address: row.address,
                branch: row.branch,
                location: row.location,
                delivery_terms: row.delivery_terms,
                payment_terms: row.payment_terms,
                warranty: row.warranty,
                bank_details: row.bank_details,
                contact_person: row.contact_person,
                contact_phone: row.contact_phone,
            },
            invoice: Invoice {
                subtotal: row.subtotal,
                tax_amount: row.tax_amount,
                net_amount: row.net_amount,
                line_items: row.line_items.0,
                paid: row.paid,
                created_by: row.created_by,
            },
            created_at: row.created_at,
        }
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "billing-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they are missing.
    #[instrument(skip(self))]
    pub async fn initialize_schema(&self) -> Result<(), AppError> {
        info!("Initializing database schema");
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Schema setup failed: {}", e))
                })?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

#[async_trait]
impl BillingStore for PgStore {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    async fn create_user(&self, input: &CreateUser) -> Result<User, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.phone)
        .bind(input.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("User already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        timer.observe_duration();

        let user = User::try_from(row)?;
        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_email"])
            .start_timer();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find user: {}", e)))?;

        timer.observe_duration();

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_user_by_id"])
            .start_timer();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        timer.observe_duration();

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_users"])
            .start_timer();

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list users: {}", e)))?;

        timer.observe_duration();

        rows.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self, input), fields(user_id = %user_id))]
    async fn update_user(
        &self,
        user_id: Uuid,
        input: &UpdateUser,
    ) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_user"])
            .start_timer();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update user: {}", e)),
        })?;

        timer.observe_duration();

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self, input), fields(user_id = %user_id))]
    async fn update_profile(
        &self,
        user_id: Uuid,
        input: &UpdateProfile,
    ) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_profile"])
            .start_timer();

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update profile: {}", e)))?;

        timer.observe_duration();

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn delete_user(&self, user_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_user"])
            .start_timer();

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete user: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Catalog Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(model_number = %input.model_number))]
    async fn create_item(&self, input: &CreateItem) -> Result<CatalogItem, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_item"])
            .start_timer();

        let item = sqlx::query_as::<_, CatalogItem>(&format!(
            r#"
            INSERT INTO items (id, name, model_number, list_price, special_price, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.model_number)
        .bind(input.list_price)
        .bind(input.special_price)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create item: {}", e)))?;

        timer.observe_duration();

        info!(item_id = %item.id, name = %item.name, "Item created");

        Ok(item)
    }

    #[instrument(skip(self))]
    async fn list_items(&self) -> Result<Vec<CatalogItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items"])
            .start_timer();

        let items = sqlx::query_as::<_, CatalogItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn get_item(&self, item_id: Uuid) -> Result<Option<CatalogItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_item"])
            .start_timer();

        let item = sqlx::query_as::<_, CatalogItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get item: {}", e)))?;

        timer.observe_duration();

        Ok(item)
    }

    #[instrument(skip(self, item_ids), fields(count = item_ids.len()))]
    async fn find_items(&self, item_ids: &[Uuid]) -> Result<Vec<CatalogItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_items"])
            .start_timer();

        let items = sqlx::query_as::<_, CatalogItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = ANY($1)"
        ))
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find items: {}", e)))?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self, input), fields(item_id = %item_id))]
    async fn update_item(
        &self,
        item_id: Uuid,
        input: &UpdateItem,
    ) -> Result<Option<CatalogItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_item"])
            .start_timer();

        let item = sqlx::query_as::<_, CatalogItem>(&format!(
            r#"
            UPDATE items
            SET name = COALESCE($2, name),
                model_number = COALESCE($3, model_number),
                list_price = COALESCE($4, list_price),
                special_price = COALESCE($5, special_price),
                description = CASE WHEN $6 THEN $7 ELSE description END
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .bind(&input.name)
        .bind(&input.model_number)
        .bind(input.list_price)
        .bind(input.special_price)
        .bind(input.description.is_some())
        .bind(input.description.clone().flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update item: {}", e)))?;

        timer.observe_duration();

        Ok(item)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn delete_item(&self, item_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_item"])
            .start_timer();

        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete item: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Bill Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self, input), fields(invoice_no = %input.details.invoice_no))]
    async fn create_bill(&self, input: &CreateBill) -> Result<Bill, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_bill"])
            .start_timer();

        let details = &input.details;
        let invoice = &input.invoice;

        let row = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            INSERT INTO bills (
                id, invoice_no, ref_number, customer_name, to_name, address, branch, location,
                delivery_terms, payment_terms, warranty, bank_details, contact_person,
                contact_phone, line_items, subtotal, tax_amount, net_amount, paid, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&details.invoice_no)
        .bind(&details.ref_number)
        .bind(&details.customer_name)
        .bind(&details.to)
        .bind(&details.address)
        .bind(&details.branch)
        .bind(&details.location)
        .bind(&details.delivery_terms)
        .bind(&details.payment_terms)
        .bind(&details.warranty)
        .bind(&details.bank_details)
        .bind(&details.contact_person)
        .bind(&details.contact_phone)
        .bind(Json(&invoice.line_items))
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.net_amount)
        .bind(invoice.paid)
        .bind(&invoice.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create bill: {}", e)))?;

        timer.observe_duration();

        let bill = Bill::from(row);
        info!(bill_id = %bill.id, net_amount = %bill.invoice.net_amount, "Bill created");
        Ok(bill)
    }

    #[instrument(skip(self))]
    async fn list_bills(&self) -> Result<Vec<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_bills"])
            .start_timer();

        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list bills: {}", e)))?;

        timer.observe_duration();

        Ok(rows.into_iter().map(Bill::from).collect())
    }

    #[instrument(skip(self), fields(bill_id = %bill_id))]
    async fn get_bill(&self, bill_id: Uuid) -> Result<Option<Bill>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_bill"])
            .start_timer();

        let row = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = $1"
        ))
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get bill: {}", e)))?;

        timer.observe_duration();

        Ok(row.map(Bill::from))
    }

    #[instrument(skip(self), fields(bill_id = %bill_id))]
    async fn mark_bill_paid(&self, bill_id: Uuid) -> Result<PaymentOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["mark_bill_paid"])
            .start_timer();

        let row = sqlx::query_as::<_, BillRow>(&format!(
            r#"
            UPDATE bills
            SET paid = TRUE
            WHERE id = $1 AND paid = FALSE
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to mark bill paid: {}", e)))?;

        if let Some(row) = row {
            timer.observe_duration();
            info!(bill_id = %bill_id, "Bill marked paid");
            return Ok(PaymentOutcome::Paid(Bill::from(row)));
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bills WHERE id = $1)")
            .bind(bill_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to look up bill: {}", e)))?;

        timer.observe_duration();

        Ok(if exists {
            PaymentOutcome::AlreadyPaid
        } else {
            PaymentOutcome::NotFound
        })
    }
}
