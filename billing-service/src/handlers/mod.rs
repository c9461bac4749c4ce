pub mod admin;
pub mod auth;
pub mod bills;
pub mod health;
pub mod items;
pub mod metrics;
