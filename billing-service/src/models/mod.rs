//! Domain models for billing-service.

mod bill;
mod invoice;
mod item;
mod user;

pub use bill::{Bill, BillDetails, CreateBill};
pub use invoice::{Invoice, LineItem, RequestedLine};
pub use item::{CatalogItem, CreateItem, UpdateItem};
pub use user::{CreateUser, Role, UpdateProfile, UpdateUser, User, UserResponse, UserSummary};
