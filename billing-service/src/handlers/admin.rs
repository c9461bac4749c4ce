//! Account management for administrators.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::admin::{UpdateUserRequest, UserListResponse};
use crate::dtos::MessageResponse;
use crate::middleware::AuthUser;
use crate::models::{UpdateUser, UserResponse};
use crate::utils::ValidatedJson;
use crate::AppState;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(UserListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/admin/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;
    Ok(Json(user.sanitized()))
}

/// PUT /api/admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let update = UpdateUser::from(req);
    let user = state
        .store
        .update_user(user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    tracing::info!(
        admin_id = %auth.0.id,
        user_id = %user.id,
        role = %user.role,
        "User updated by admin"
    );

    Ok(Json(user.sanitized()))
}

/// DELETE /api/admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if auth.user_id()? == user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Admins cannot delete their own account"
        )));
    }

    if !state.store.delete_user(user_id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
    }

    tracing::info!(admin_id = %auth.0.id, user_id = %user_id, "User deleted by admin");

    Ok(Json(MessageResponse::new("User deleted")))
}
