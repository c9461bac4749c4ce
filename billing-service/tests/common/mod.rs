//! Test helper module for billing-service integration tests.
//!
//! Builds the full router over an in-memory store and drives it with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use billing_service::config::{
    BillingConfig, CookieConfig, DatabaseConfig, Environment, JwtConfig,
};
use billing_service::models::{CreateUser, Role};
use billing_service::services::{init_metrics, BillingStore, InMemoryStore};
use billing_service::utils::hash_password;
use billing_service::{build_router, AppState};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-jwt-secret";
pub const TEST_PASSWORD: &str = "secret-pass-123";

pub fn test_config() -> BillingConfig {
    BillingConfig {
        common: CoreConfig::default(),
        environment: Environment::Dev,
        service_name: "billing-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new(TEST_JWT_SECRET.to_string()),
        },
        cookie: CookieConfig { secure: false },
        admin: None,
    }
}

/// Response captured from a single request.
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn spawn() -> Self {
        init_metrics();

        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(test_config(), store.clone());
        let router = build_router(state.clone());

        Self {
            router,
            store,
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    /// GET a non-JSON endpoint and return the raw body.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), cookie).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::PUT, uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, cookie).await
    }

    /// Insert an account directly into the store.
    pub async fn create_account(&self, role: Role) -> (Uuid, String) {
        let email = format!("{}@example.com", Uuid::new_v4());
        let user = self
            .store
            .create_user(&CreateUser {
                name: format!("{} tester", role),
                email: email.clone(),
                password_hash: hash_password(&Secret::new(TEST_PASSWORD.to_string())).unwrap(),
                phone: None,
                role,
            })
            .await
            .unwrap();
        (user.id, email)
    }

    /// Log in and return the `token=...` pair to send as a Cookie header.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);

        session_pair(&response.set_cookie.expect("login must set a cookie"))
    }

    pub async fn admin_cookie(&self) -> String {
        let (_, email) = self.create_account(Role::Admin).await;
        self.login(&email, TEST_PASSWORD).await
    }

    pub async fn user_cookie(&self) -> String {
        let (_, email) = self.create_account(Role::User).await;
        self.login(&email, TEST_PASSWORD).await
    }

    /// Create a catalog item as admin and return its id.
    pub async fn create_item(
        &self,
        admin_cookie: &str,
        name: &str,
        list_price: &str,
        special_price: &str,
    ) -> String {
        let response = self
            .post(
                "/api/items",
                serde_json::json!({
                    "name": name,
                    "model_number": format!("{}-M1", name),
                    "list_price": list_price,
                    "special_price": special_price,
                }),
                Some(admin_cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }
}

/// `token=abc; Path=/; HttpOnly` -> `token=abc`
pub fn session_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}
