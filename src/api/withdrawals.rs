// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Withdrawal endpoints.
//!
//! Users request payouts against accumulated referral earnings; admins
//! approve (debiting the balance atomically) or reject.

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
    models::{ApproveRequestBody, CreateWithdrawalBody, RejectRequestBody},
    state::AppState,
    storage::{NewWithdrawal, PaymentStatus, StoredWithdrawal},
};

/// Query parameters for the admin withdrawal listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct WithdrawalStatusQuery {
    /// Filter by lifecycle status.
    pub status: Option<PaymentStatus>,
}

/// Submit a withdrawal request.
///
/// The amount must meet the minimum and fit the caller's current balance;
/// the balance is re-checked authoritatively at approval time.
#[utoipa::path(
    post,
    path = "/v1/withdrawals",
    request_body = CreateWithdrawalBody,
    tag = "Withdrawals",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Withdrawal request submitted", body = StoredWithdrawal),
        (status = 400, description = "Below minimum or over balance")
    )
)]
pub async fn create_withdrawal(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(body): Json<CreateWithdrawalBody>,
) -> Result<(StatusCode, Json<StoredWithdrawal>), ApiError> {
    if body.account_number.trim().is_empty() || body.account_holder_name.trim().is_empty() {
        return Err(ApiError::bad_request(
            "Account number and holder name are required",
        ));
    }

    let withdrawal = state.db.create_withdrawal(
        &user.user_id,
        NewWithdrawal {
            amount: body.amount,
            account_type: body.account_type,
            account_number: body.account_number,
            account_holder_name: body.account_holder_name,
            phone_number: body.phone_number,
        },
    )?;

    Ok((StatusCode::CREATED, Json(withdrawal)))
}

/// List the caller's withdrawal requests, newest first.
#[utoipa::path(
    get,
    path = "/v1/withdrawals/my",
    tag = "Withdrawals",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "The caller's withdrawal requests", body = [StoredWithdrawal]))
)]
pub async fn my_withdrawals(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredWithdrawal>>, ApiError> {
    let withdrawals = state.db.list_user_withdrawals(&user.user_id)?;
    Ok(Json(withdrawals))
}

/// List withdrawal requests across all users (admin only).
#[utoipa::path(
    get,
    path = "/v1/withdrawals",
    tag = "Withdrawals",
    params(WithdrawalStatusQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Withdrawal requests", body = [StoredWithdrawal]),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_withdrawals(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Query(query): Query<WithdrawalStatusQuery>,
) -> Result<Json<Vec<StoredWithdrawal>>, ApiError> {
    let withdrawals = state.db.list_withdrawals(query.status)?;
    Ok(Json(withdrawals))
}

/// Approve a withdrawal request (admin only).
///
/// Re-checks the balance and debits it in one atomic transaction. If the
/// balance no longer covers the amount, the request stays pending and the
/// response reports available vs requested.
#[utoipa::path(
    post,
    path = "/v1/withdrawals/{withdrawal_id}/approve",
    request_body = ApproveRequestBody,
    tag = "Withdrawals",
    params(("withdrawal_id" = String, Path, description = "Withdrawal request ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Withdrawal approved", body = StoredWithdrawal),
        (status = 400, description = "Insufficient balance"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn approve_withdrawal(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(withdrawal_id): Path<String>,
    Json(body): Json<ApproveRequestBody>,
) -> Result<Json<StoredWithdrawal>, ApiError> {
    let withdrawal =
        state
            .db
            .approve_withdrawal(&withdrawal_id, &admin.user_id, body.admin_notes)?;
    Ok(Json(withdrawal))
}

/// Reject a withdrawal request (admin only). Requires a reason.
#[utoipa::path(
    post,
    path = "/v1/withdrawals/{withdrawal_id}/reject",
    request_body = RejectRequestBody,
    tag = "Withdrawals",
    params(("withdrawal_id" = String, Path, description = "Withdrawal request ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Withdrawal rejected", body = StoredWithdrawal),
        (status = 400, description = "Missing rejection reason"),
        (status = 403, description = "Not authorized (admin required)"),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn reject_withdrawal(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(withdrawal_id): Path<String>,
    Json(body): Json<RejectRequestBody>,
) -> Result<Json<StoredWithdrawal>, ApiError> {
    if body.rejection_reason.trim().is_empty() {
        return Err(ApiError::bad_request("Rejection reason is required"));
    }

    let withdrawal = state.db.reject_withdrawal(
        &withdrawal_id,
        &admin.user_id,
        body.rejection_reason.trim(),
    )?;
    Ok(Json(withdrawal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::storage::{NewCourse, NewPaymentAccount, NewPaymentRequest, NewUser};
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = crate::storage::LedgerDb::open(&temp_dir.path().join("test.redb")).unwrap();
        (AppState::new(db), temp_dir)
    }

    fn auth_for(user_id: &str) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user_id.to_string(),
            email: "referrer@example.com".to_string(),
            role: Role::Student,
            expires_at: 0,
        })
    }

    fn admin() -> AdminOnly {
        AdminOnly(AuthenticatedUser {
            user_id: "admin-1".to_string(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            expires_at: 0,
        })
    }

    /// Earn `amount` through the real referral payout path.
    fn user_with_earnings(state: &AppState, amount: u64) -> String {
        let referrer = state
            .db
            .create_user(NewUser {
                full_name: "Referrer".to_string(),
                email: "referrer@example.com".to_string(),
                password_hash: "$argon2id$stub".to_string(),
                referred_by: None,
                role: Role::Student,
            })
            .unwrap();
        let buyer = state
            .db
            .create_user(NewUser {
                full_name: "Buyer".to_string(),
                email: "buyer@example.com".to_string(),
                password_hash: "$argon2id$stub".to_string(),
                referred_by: Some(referrer.referral_code.clone()),
                role: Role::Student,
            })
            .unwrap();
        let course = state
            .db
            .create_course(NewCourse {
                title: "Course".to_string(),
                description: "Course".to_string(),
                price: amount * 10,
                duration: "1 week".to_string(),
                level: "Beginner".to_string(),
                image: None,
            })
            .unwrap();
        let account = state
            .db
            .create_payment_account(NewPaymentAccount {
                account_type: "CBE".to_string(),
                account_name: "Elevate Learning PLC".to_string(),
                account_number: "1000123456789".to_string(),
                bank_name: None,
                instructions: None,
                display_order: 0,
            })
            .unwrap();
        let request = state
            .db
            .create_payment_request(
                &buyer.id,
                NewPaymentRequest {
                    course_id: course.id,
                    payment_account_id: account.id,
                    amount: amount * 10,
                    transaction_screenshot_url: "/uploads/shot.png".to_string(),
                    transaction_reference: None,
                },
            )
            .unwrap();
        state
            .db
            .approve_payment_and_enroll(&request.id, "admin-1", None)
            .unwrap();
        referrer.id
    }

    fn withdrawal_body(amount: u64) -> CreateWithdrawalBody {
        CreateWithdrawalBody {
            amount,
            account_type: "CBE".to_string(),
            account_number: "1000987654321".to_string(),
            account_holder_name: "Referrer Name".to_string(),
            phone_number: None,
        }
    }

    #[tokio::test]
    async fn below_minimum_is_bad_request() {
        let (state, _dir) = test_state();
        let user_id = user_with_earnings(&state, 500);

        let result = create_withdrawal(
            auth_for(&user_id),
            State(state.clone()),
            Json(withdrawal_body(100)),
        )
        .await;
        match result {
            Err(err) => {
                assert_eq!(err.status, StatusCode::BAD_REQUEST);
                assert!(err.message.contains("300"));
            }
            Ok(_) => panic!("expected bad request"),
        }
    }

    #[tokio::test]
    async fn over_balance_reports_available_and_requested() {
        let (state, _dir) = test_state();
        let user_id = user_with_earnings(&state, 500);

        let result = create_withdrawal(
            auth_for(&user_id),
            State(state.clone()),
            Json(withdrawal_body(600)),
        )
        .await;
        match result {
            Err(err) => {
                assert_eq!(err.status, StatusCode::BAD_REQUEST);
                assert!(err.message.contains("500"));
                assert!(err.message.contains("600"));
            }
            Ok(_) => panic!("expected insufficient funds"),
        }
    }

    #[tokio::test]
    async fn approve_debits_balance_via_handler() {
        let (state, _dir) = test_state();
        let user_id = user_with_earnings(&state, 500);

        let (status, Json(withdrawal)) = create_withdrawal(
            auth_for(&user_id),
            State(state.clone()),
            Json(withdrawal_body(400)),
        )
        .await
        .expect("submission succeeds");
        assert_eq!(status, StatusCode::CREATED);

        let Json(approved) = approve_withdrawal(
            admin(),
            State(state.clone()),
            Path(withdrawal.id),
            Json(ApproveRequestBody { admin_notes: None }),
        )
        .await
        .expect("approval succeeds");

        assert_eq!(approved.status, PaymentStatus::Approved);
        assert_eq!(state.db.get_user(&user_id).unwrap().total_earnings, 100);
    }

    #[tokio::test]
    async fn reject_requires_reason_and_keeps_balance() {
        let (state, _dir) = test_state();
        let user_id = user_with_earnings(&state, 500);

        let (_, Json(withdrawal)) = create_withdrawal(
            auth_for(&user_id),
            State(state.clone()),
            Json(withdrawal_body(300)),
        )
        .await
        .unwrap();

        let missing = reject_withdrawal(
            admin(),
            State(state.clone()),
            Path(withdrawal.id.clone()),
            Json(RejectRequestBody {
                rejection_reason: "".to_string(),
            }),
        )
        .await;
        assert!(matches!(missing, Err(e) if e.status == StatusCode::BAD_REQUEST));

        let Json(rejected) = reject_withdrawal(
            admin(),
            State(state.clone()),
            Path(withdrawal.id),
            Json(RejectRequestBody {
                rejection_reason: "account name mismatch".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(rejected.status, PaymentStatus::Rejected);
        assert_eq!(state.db.get_user(&user_id).unwrap().total_earnings, 500);
    }
}
