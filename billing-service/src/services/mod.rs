//! Services module for billing-service.

pub mod database;
mod error;
pub mod invoice;
pub mod memory;
pub mod metrics;
pub mod store;
pub mod token;

pub use database::PgStore;
pub use invoice::{CatalogLookup, InvoiceCalculator, PricingError, PricingOptions, GST_RATE};
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use store::{BillingStore, PaymentOutcome};
pub use token::{AuthError, Claims, TokenAuthority};
