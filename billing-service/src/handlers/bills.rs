//! Bill handlers: price, persist, list and settle invoices.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;
use uuid::Uuid;

use crate::dtos::bills::{BillListResponse, BillResponse, CreateBillRequest};
use crate::middleware::AuthUser;
use crate::models::{Bill, CreateBill, UserSummary};
use crate::services::invoice::{PricingError, PricingOptions};
use crate::services::metrics::record_bill;
use crate::services::store::PaymentOutcome;
use crate::utils::ValidatedJson;
use crate::AppState;

fn bill_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Bill not found"))
}

async fn billed_by(state: &AppState, bill: &Bill) -> Result<Option<UserSummary>, AppError> {
    let Ok(user_id) = Uuid::parse_str(&bill.invoice.created_by) else {
        return Ok(None);
    };
    Ok(state
        .store
        .find_user_by_id(user_id)
        .await?
        .map(|user| user.summary()))
}

/// POST /api/bills
pub async fn create_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateBillRequest>,
) -> Result<(StatusCode, Json<BillResponse>), AppError> {
    let options = PricingOptions {
        tax_amount: req.tax_amount,
        paid: req.paid,
        created_by: auth.0.id.clone(),
    };
    let (details, lines) = req.into_parts();

    let item_ids: Vec<Uuid> = lines.iter().map(|line| line.item_id).collect();
    let catalog = state.store.find_items(&item_ids).await?;

    let invoice = state
        .calculator
        .price_invoice(&lines, &catalog, options)
        .map_err(|e| {
            tracing::info!(requested = lines.len(), error = %e, "Bill rejected");
            AppError::from(e)
        })?;

    let bill = state
        .store
        .create_bill(&CreateBill { details, invoice })
        .await?;

    record_bill("created", bill.invoice.net_amount);
    tracing::info!(
        bill_id = %bill.id,
        invoice_no = %bill.details.invoice_no,
        line_count = bill.invoice.line_items.len(),
        net_amount = %bill.invoice.net_amount,
        user_id = %auth.0.id,
        "Bill created"
    );

    let billed_by = billed_by(&state, &bill).await?;
    Ok((StatusCode::CREATED, Json(BillResponse { bill, billed_by })))
}

/// GET /api/bills
pub async fn list_bills(State(state): State<AppState>) -> Result<Json<BillListResponse>, AppError> {
    let bills = state.store.list_bills().await?;
    let users: HashMap<String, UserSummary> = state
        .store
        .list_users()
        .await?
        .into_iter()
        .map(|user| (user.id.to_string(), user.summary()))
        .collect();

    let bills = bills
        .into_iter()
        .map(|bill| {
            let billed_by = users.get(&bill.invoice.created_by).cloned();
            BillResponse { bill, billed_by }
        })
        .collect();

    Ok(Json(BillListResponse { bills }))
}

/// GET /api/bills/:id
pub async fn get_bill(
    State(state): State<AppState>,
    Path(bill_id): Path<Uuid>,
) -> Result<Json<BillResponse>, AppError> {
    let bill = state
        .store
        .get_bill(bill_id)
        .await?
        .ok_or_else(bill_not_found)?;
    let billed_by = billed_by(&state, &bill).await?;
    Ok(Json(BillResponse { bill, billed_by }))
}

/// Settle an unpaid bill.
///
/// PUT /api/bills/:id/pay
pub async fn pay_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(bill_id): Path<Uuid>,
) -> Result<Json<BillResponse>, AppError> {
    let bill = state
        .store
        .get_bill(bill_id)
        .await?
        .ok_or_else(bill_not_found)?;

    state.calculator.mark_paid(&bill.invoice)?;

    // The bill may have been paid or removed since the read above.
    let bill = match state.store.mark_bill_paid(bill_id).await? {
        PaymentOutcome::Paid(bill) => bill,
        PaymentOutcome::AlreadyPaid => return Err(PricingError::AlreadyPaid.into()),
        PaymentOutcome::NotFound => return Err(bill_not_found()),
    };

    record_bill("paid", bill.invoice.net_amount);
    tracing::info!(bill_id = %bill.id, user_id = %auth.0.id, "Bill marked paid");

    let billed_by = billed_by(&state, &bill).await?;
    Ok(Json(BillResponse { bill, billed_by }))
}
