use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::items::{CreateItemRequest, ItemListResponse, UpdateItemRequest};
use crate::dtos::MessageResponse;
use crate::models::{CatalogItem, CreateItem, UpdateItem};
use crate::utils::ValidatedJson;
use crate::AppState;

fn item_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Item not found"))
}

pub async fn list_items(State(state): State<AppState>) -> Result<Json<ItemListResponse>, AppError> {
    let items = state.store.list_items().await?;
    Ok(Json(ItemListResponse { items }))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<CatalogItem>, AppError> {
    let item = state
        .store
        .get_item(item_id)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<CatalogItem>), AppError> {
    let item = state.store.create_item(&CreateItem::from(req)).await?;

    tracing::info!(item_id = %item.id, model_number = %item.model_number, "Item created");

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateItemRequest>,
) -> Result<Json<CatalogItem>, AppError> {
    let item = state
        .store
        .update_item(item_id, &UpdateItem::from(req))
        .await?
        .ok_or_else(item_not_found)?;

    tracing::info!(item_id = %item.id, "Item updated");

    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_item(item_id).await? {
        return Err(item_not_found());
    }

    tracing::info!(item_id = %item_id, "Item deleted");

    Ok(Json(MessageResponse::new("Item deleted")))
}
