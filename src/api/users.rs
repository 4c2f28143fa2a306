// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Profile endpoints for the authenticated user.

use axum::{extract::State, Json};

use crate::{
    auth::Auth, error::ApiError, models::UserResponse, state::AppState, storage::LedgerError,
};

/// Get the caller's own profile, including earnings and referral code.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The caller's profile", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No profile for this identity")
    )
)]
pub async fn get_profile(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let stored = state.db.get_user(&user.user_id).map_err(|e| match e {
        LedgerError::NotFound(_) => ApiError::not_found("User profile not found"),
        other => other.into(),
    })?;
    Ok(Json(stored.into()))
}
