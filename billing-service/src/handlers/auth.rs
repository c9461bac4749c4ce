//! Session handlers: signup, login, logout and the caller's own profile.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use secrecy::Secret;
use service_core::error::AppError;

use crate::dtos::auth::{
    LoginRequest, LoginResponse, ProfileResponse, SignupRequest, SignupResponse,
    UpdateProfileRequest,
};
use crate::dtos::MessageResponse;
use crate::middleware::{AuthUser, MaybeAuthUser, SESSION_COOKIE};
use crate::models::{CreateUser, Role, UpdateProfile};
use crate::services::metrics::record_auth_failure;
use crate::services::token::{Claims, TokenAuthority};
use crate::utils::{hash_password, verify_password, ValidatedJson};
use crate::AppState;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register a new account.
///
/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let role = req.role.unwrap_or_default();
    if role == Role::Admin {
        let caller_is_admin = caller
            .as_ref()
            .is_some_and(|claims| TokenAuthority::require_role(claims, Role::Admin));
        if !caller_is_admin {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Only admins can create admin accounts"
            )));
        }
    }

    let email = normalize_email(&req.email);
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(anyhow::anyhow!("User already exists")));
    }

    let password_hash = hash_password(&Secret::new(req.password))?;
    let user = state
        .store
        .create_user(&CreateUser {
            name: req.name.trim().to_string(),
            email,
            password_hash,
            phone: req.phone,
            role,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            user: user.sanitized(),
        }),
    ))
}

/// Verify credentials and set the session cookie.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let invalid = || {
        record_auth_failure("bad_credentials");
        AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
    };

    let user = state
        .store
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&Secret::new(req.password), &user.password_hash) {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let token = state.tokens.issue(&Claims {
        id: user.id.to_string(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    })?;

    let max_age = time::Duration::seconds(state.tokens.validity().num_seconds());
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie.secure)
        .max_age(max_age);

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            role: user.role,
            name: user.name,
        }),
    ))
}

/// Expire the session cookie.
///
/// POST /api/auth/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Json(MessageResponse::new("Logged out")))
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .store
        .find_user_by_id(auth.user_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(ProfileResponse {
        profile: user.sanitized(),
    }))
}

/// Update name and phone; changing the password needs the current one.
///
/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user_id = auth.user_id()?;
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    let password_hash = match req.new_password {
        Some(new_password) => {
            let current_ok = req
                .current_password
                .map(|current| verify_password(&Secret::new(current), &user.password_hash))
                .unwrap_or(false);
            if !current_ok {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Current password is incorrect"
                )));
            }
            Some(hash_password(&Secret::new(new_password))?)
        }
        None => None,
    };

    let password_changed = password_hash.is_some();
    let updated = state
        .store
        .update_profile(
            user_id,
            &UpdateProfile {
                name: req.name,
                phone: req.phone,
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    tracing::info!(user_id = %user_id, password_changed, "Profile updated");

    Ok(Json(ProfileResponse {
        profile: updated.sanitized(),
    }))
}
