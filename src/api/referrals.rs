// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Referral endpoints.
//!
//! Users record who they invited; the ledger row completes automatically
//! when the invited email's payment is approved.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateReferralRequest, ReferralCodeResponse},
    state::AppState,
    storage::{ReferralStats, StoredReferral, StoredReferralEarning},
};

/// Record a referred friend by email.
#[utoipa::path(
    post,
    path = "/v1/referrals",
    request_body = CreateReferralRequest,
    tag = "Referrals",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Referral recorded", body = StoredReferral),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Email already referred")
    )
)]
pub async fn create_referral(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<CreateReferralRequest>,
) -> Result<(StatusCode, Json<StoredReferral>), ApiError> {
    let email = body.email.trim();
    if !email.contains('@') {
        return Err(ApiError::bad_request("A valid email address is required"));
    }

    // Use the email prefix as the display name, as the signup form does
    let name = email.split('@').next().unwrap_or(email);
    let referral = state.db.create_referral(&user.user_id, name, email)?;
    Ok((StatusCode::CREATED, Json(referral)))
}

/// List the caller's referrals, newest first.
#[utoipa::path(
    get,
    path = "/v1/referrals/my",
    tag = "Referrals",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "The caller's referrals", body = [StoredReferral]))
)]
pub async fn my_referrals(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredReferral>>, ApiError> {
    let referrals = state.db.list_user_referrals(&user.user_id)?;
    Ok(Json(referrals))
}

/// Aggregate referral statistics for the caller.
#[utoipa::path(
    get,
    path = "/v1/referrals/stats",
    tag = "Referrals",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Referral statistics", body = ReferralStats))
)]
pub async fn referral_stats(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ReferralStats>, ApiError> {
    let stats = state.db.get_referral_stats(&user.user_id)?;
    Ok(Json(stats))
}

/// List the caller's referral payout audit records, newest first.
#[utoipa::path(
    get,
    path = "/v1/referrals/earnings",
    tag = "Referrals",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Referral payout records", body = [StoredReferralEarning]))
)]
pub async fn referral_earnings(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredReferralEarning>>, ApiError> {
    let earnings = state.db.list_referral_earnings(&user.user_id)?;
    Ok(Json(earnings))
}

/// Get the caller's referral code to share.
#[utoipa::path(
    get,
    path = "/v1/referrals/code",
    tag = "Referrals",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "The caller's referral code", body = ReferralCodeResponse))
)]
pub async fn referral_code(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<ReferralCodeResponse>, ApiError> {
    let stored = state.db.get_user(&user.user_id)?;
    Ok(Json(ReferralCodeResponse {
        referral_code: stored.referral_code,
    }))
}
