//! Application startup and lifecycle management.

use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AdminBootstrap, BillingConfig};
use crate::models::{CreateUser, Role};
use crate::services::{init_metrics, BillingStore, InMemoryStore, PgStore};
use crate::utils::hash_password;
use crate::{build_router, AppState};

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BillingConfig) -> Result<Self, AppError> {
        init_metrics();

        let store = connect_store(&config).await?;

        if let Some(admin) = &config.admin {
            seed_admin(store.as_ref(), admin).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to seed admin account");
                e
            })?;
        }

        let addr = config.common.socket_addr();
        let state = AppState::new(config, store);

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Billing service listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state.clone());

        tracing::info!(
            service = %self.state.config.service_name,
            version = %self.state.config.service_version,
            port = self.port,
            "Service ready to accept connections"
        );

        axum::serve(self.listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}

async fn connect_store(config: &BillingConfig) -> Result<Arc<dyn BillingStore>, AppError> {
    match &config.database.url {
        Some(url) => {
            let store = PgStore::new(
                url.expose_secret(),
                config.database.max_connections,
                config.database.min_connections,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                e
            })?;

            store.initialize_schema().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to initialize schema");
                e
            })?;

            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data will not persist");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Create the bootstrap admin unless an account with that email exists.
///
/// Returns true when a new account was created.
pub async fn seed_admin(
    store: &dyn BillingStore,
    admin: &AdminBootstrap,
) -> Result<bool, AppError> {
    let email = admin.email.trim().to_lowercase();

    if let Some(existing) = store.find_user_by_email(&email).await? {
        tracing::info!(user_id = %existing.id, "Admin account already present");
        return Ok(false);
    }

    let user = store
        .create_user(&CreateUser {
            name: admin.name.clone(),
            email,
            password_hash: hash_password(&admin.password)?,
            phone: None,
            role: Role::Admin,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Bootstrap admin account created");
    Ok(true)
}
