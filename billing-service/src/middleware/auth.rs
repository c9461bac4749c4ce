use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::Role;
use crate::services::metrics::record_auth_failure;
use crate::services::token::{AuthError, Claims, TokenAuthority};
use crate::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Middleware to require a valid session cookie.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = session_token(&jar) else {
        record_auth_failure("missing");
        return Err(AppError::Unauthorized(anyhow::anyhow!("Unauthorized")));
    };

    let claims = state.tokens.verify(&token).map_err(|e| {
        let reason = match e {
            AuthError::Invalid => "invalid",
            AuthError::Expired => "expired",
        };
        tracing::debug!(reason, path = %req.uri().path(), "Rejected session token");
        record_auth_failure(reason);
        AppError::from(e)
    })?;

    // Store claims in request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Role guard for admin routes. Must run after `auth_middleware`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Unauthorized")))?;

    if !TokenAuthority::require_role(claims, Role::Admin) {
        tracing::warn!(user_id = %claims.id, path = %req.uri().path(), "Admin route denied");
        record_auth_failure("forbidden");
        return Err(AppError::Forbidden(anyhow::anyhow!("Admin access required")));
    }

    Ok(next.run(req).await)
}

/// Extractor to easily get claims in handlers
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.id)
            .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid token subject")))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth claims missing from request extensions"
            ))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}

/// Claims of the caller if a valid session cookie is present, on routes
/// that do not require one.
pub struct MaybeAuthUser(pub Option<Claims>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let claims = session_token(&jar).and_then(|token| state.tokens.verify(&token).ok());
        Ok(MaybeAuthUser(claims))
    }
}
