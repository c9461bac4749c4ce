pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    body::Body,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use service_core::middleware::{
    make_request_span, request_id_middleware, security_headers_middleware,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::BillingConfig;
use crate::services::{BillingStore, InvoiceCalculator, TokenAuthority};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BillingConfig>,
    pub store: Arc<dyn BillingStore>,
    pub tokens: Arc<TokenAuthority>,
    pub calculator: InvoiceCalculator,
}

impl AppState {
    pub fn new(config: BillingConfig, store: Arc<dyn BillingStore>) -> Self {
        let tokens = TokenAuthority::new(config.jwt.secret.expose_secret().as_bytes());
        Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
            calculator: InvoiceCalculator::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Admin only: role guard runs after the session check.
    let admin_routes = Router::new()
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route(
            "/api/admin/users/:id",
            get(handlers::admin::get_user)
                .put(handlers::admin::update_user)
                .delete(handlers::admin::delete_user),
        )
        .route("/api/items", post(handlers::items::create_item))
        .route(
            "/api/items/:id",
            put(handlers::items::update_item).delete(handlers::items::delete_item),
        )
        .route_layer(from_fn(middleware::require_admin))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    // Any signed-in user
    let user_routes = Router::new()
        .route(
            "/api/auth/profile",
            get(handlers::auth::get_profile).put(handlers::auth::update_profile),
        )
        .route("/api/items", get(handlers::items::list_items))
        .route("/api/items/:id", get(handlers::items::get_item))
        .route(
            "/api/bills",
            get(handlers::bills::list_bills).post(handlers::bills::create_bill),
        )
        .route("/api/bills/:id", get(handlers::bills::get_bill))
        .route("/api/bills/:id/pay", put(handlers::bills::pay_bill))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}
