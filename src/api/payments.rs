// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Payment request endpoints.
//!
//! Users submit proof-of-payment for a course; admins adjudicate. Approval
//! enrolls the buyer and distributes any referral bonus in one atomic
//! storage transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    models::{ApprovalResponse, ApproveRequestBody, CreatePaymentRequestBody, RejectRequestBody},
    state::AppState,
    storage::{NewPaymentRequest, PaymentStatus, StoredPaymentRequest},
};

/// Query parameters for the admin request listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RequestStatusQuery {
    /// Filter by lifecycle status.
    pub status: Option<PaymentStatus>,
}

/// Submit a payment request for a course.
///
/// Requires an uploaded screenshot URL. Fails if the user already has a
/// pending or approved request for the same course.
#[utoipa::path(
    post,
    path = "/v1/payments/requests",
    request_body = CreatePaymentRequestBody,
    tag = "Payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Payment request submitted", body = StoredPaymentRequest),
        (status = 404, description = "Course or payment account not found"),
        (status = 409, description = "A pending or approved request already exists")
    )
)]
pub async fn create_payment_request(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<CreatePaymentRequestBody>,
) -> Result<(StatusCode, Json<StoredPaymentRequest>), ApiError> {
    if body.transaction_screenshot_url.trim().is_empty() {
        return Err(ApiError::bad_request("A transaction screenshot is required"));
    }

    let request = state.db.create_payment_request(
        &user.user_id,
        NewPaymentRequest {
            course_id: body.course_id,
            payment_account_id: body.payment_account_id,
            amount: body.amount,
            transaction_screenshot_url: body.transaction_screenshot_url,
            transaction_reference: body.transaction_reference,
        },
    )?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// List the caller's own payment requests, newest first.
#[utoipa::path(
    get,
    path = "/v1/payments/requests/my",
    tag = "Payments",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "The caller's payment requests", body = [StoredPaymentRequest]))
)]
pub async fn my_payment_requests(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredPaymentRequest>>, ApiError> {
    let requests = state.db.list_user_payment_requests(&user.user_id)?;
    Ok(Json(requests))
}

/// Get a single payment request.
///
/// Visible to its owner and to admins.
#[utoipa::path(
    get,
    path = "/v1/payments/requests/{request_id}",
    tag = "Payments",
    params(("request_id" = String, Path, description = "Payment request ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The payment request", body = StoredPaymentRequest),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Payment request not found")
    )
)]
pub async fn get_payment_request(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<Json<StoredPaymentRequest>, ApiError> {
    let request = state.db.get_payment_request(&request_id)?;

    if request.user_id != user.user_id && !user.is_admin() {
        return Err(ApiError::forbidden(
            "You don't have permission to view this payment request",
        ));
    }

    Ok(Json(request))
}

/// List payment requests across all users (admin only).
#[utoipa::path(
    get,
    path = "/v1/payments/requests",
    tag = "Payments",
    params(RequestStatusQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment requests", body = [StoredPaymentRequest]),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_payment_requests(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Query(query): Query<RequestStatusQuery>,
) -> Result<Json<Vec<StoredPaymentRequest>>, ApiError> {
    let requests = state.db.list_payment_requests(query.status)?;
    Ok(Json(requests))
}

/// Approve a payment request (admin only).
///
/// Atomically marks the request approved, enrolls the buyer, and
/// distributes any referral bonus. A request that was already processed
/// returns a conflict and changes nothing.
#[utoipa::path(
    post,
    path = "/v1/payments/requests/{request_id}/approve",
    request_body = ApproveRequestBody,
    tag = "Payments",
    params(("request_id" = String, Path, description = "Payment request ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment approved and user enrolled", body = ApprovalResponse),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn approve_payment_request(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(body): Json<ApproveRequestBody>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let outcome =
        state
            .db
            .approve_payment_and_enroll(&request_id, &admin.user_id, body.admin_notes)?;

    Ok(Json(ApprovalResponse {
        message: "Payment approved and user enrolled successfully".to_string(),
        enrollment_id: outcome.enrollment_id,
        referral_bonus_awarded: outcome.referral_bonus_awarded,
        referral_amount: outcome.referral_amount,
    }))
}

/// Reject a payment request (admin only). Requires a reason.
#[utoipa::path(
    post,
    path = "/v1/payments/requests/{request_id}/reject",
    request_body = RejectRequestBody,
    tag = "Payments",
    params(("request_id" = String, Path, description = "Payment request ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment request rejected", body = StoredPaymentRequest),
        (status = 400, description = "Missing rejection reason"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn reject_payment_request(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Json(body): Json<RejectRequestBody>,
) -> Result<Json<StoredPaymentRequest>, ApiError> {
    if body.rejection_reason.trim().is_empty() {
        return Err(ApiError::bad_request("Rejection reason is required"));
    }

    let request =
        state
            .db
            .reject_payment_request(&request_id, &admin.user_id, body.rejection_reason.trim())?;
    Ok(Json(request))
}
