// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Admin payment channel endpoints.
//!
//! Buyers read the list to know where to send money; admins create
//! channels. Referenced by payment requests via `payment_account_id`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    state::AppState,
    storage::{NewPaymentAccount, StoredPaymentAccount},
};

/// List active payment channels in display order.
#[utoipa::path(
    get,
    path = "/v1/payment-accounts",
    tag = "PaymentAccounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active payment channels", body = [StoredPaymentAccount]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_payment_accounts(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredPaymentAccount>>, ApiError> {
    let accounts = state.db.list_payment_accounts(true)?;
    Ok(Json(accounts))
}

/// Get a single payment channel by id.
#[utoipa::path(
    get,
    path = "/v1/payment-accounts/{account_id}",
    tag = "PaymentAccounts",
    params(("account_id" = String, Path, description = "Payment account ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The payment channel", body = StoredPaymentAccount),
        (status = 404, description = "Payment account not found")
    )
)]
pub async fn get_payment_account(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<StoredPaymentAccount>, ApiError> {
    let account = state.db.get_payment_account(&account_id)?;
    Ok(Json(account))
}

/// Create a payment channel (admin only).
#[utoipa::path(
    post,
    path = "/v1/payment-accounts",
    request_body = NewPaymentAccount,
    tag = "PaymentAccounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment channel created", body = StoredPaymentAccount),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn create_payment_account(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(new_account): Json<NewPaymentAccount>,
) -> Result<(StatusCode, Json<StoredPaymentAccount>), ApiError> {
    if new_account.account_number.trim().is_empty() {
        return Err(ApiError::bad_request("Account number is required"));
    }

    let account = state.db.create_payment_account(new_account)?;
    tracing::info!(
        account_id = %account.id,
        admin_id = %admin.user_id,
        "payment account created"
    );
    Ok((StatusCode::CREATED, Json(account)))
}
