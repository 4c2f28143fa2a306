// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::roles::Role,
    models::{
        ApprovalResponse, ApproveRequestBody, CreatePaymentRequestBody, CreateReferralRequest,
        CreateWithdrawalBody, EnrollmentCheckResponse, ReferralCodeResponse, RegisterRequest,
        RejectRequestBody, UpdateProgressRequest, UserResponse,
    },
    state::AppState,
    storage::{
        EnrollmentStatus, NewCourse, NewPaymentAccount, PaymentStatus, ReferralStats,
        ReferralStatus, StoredCourse, StoredEnrollment, StoredPaymentAccount,
        StoredPaymentRequest, StoredReferral, StoredReferralEarning, StoredWithdrawal,
    },
};

pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod health;
pub mod payment_accounts;
pub mod payments;
pub mod referrals;
pub mod users;
pub mod withdrawals;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/users/me", get(users::get_profile))
        .route(
            "/courses",
            get(courses::list_courses).post(courses::create_course),
        )
        .route("/courses/{course_id}", get(courses::get_course))
        .route(
            "/payment-accounts",
            get(payment_accounts::list_payment_accounts)
                .post(payment_accounts::create_payment_account),
        )
        .route(
            "/payment-accounts/{account_id}",
            get(payment_accounts::get_payment_account),
        )
        .route(
            "/payments/requests",
            get(payments::list_payment_requests).post(payments::create_payment_request),
        )
        .route("/payments/requests/my", get(payments::my_payment_requests))
        .route(
            "/payments/requests/{request_id}",
            get(payments::get_payment_request),
        )
        .route(
            "/payments/requests/{request_id}/approve",
            post(payments::approve_payment_request),
        )
        .route(
            "/payments/requests/{request_id}/reject",
            post(payments::reject_payment_request),
        )
        .route("/enrollments/my", get(enrollments::my_enrollments))
        .route(
            "/enrollments/check/{course_id}",
            get(enrollments::check_enrollment),
        )
        .route(
            "/enrollments/{enrollment_id}/progress",
            put(enrollments::update_progress),
        )
        .route("/referrals", post(referrals::create_referral))
        .route("/referrals/my", get(referrals::my_referrals))
        .route("/referrals/stats", get(referrals::referral_stats))
        .route("/referrals/earnings", get(referrals::referral_earnings))
        .route("/referrals/code", get(referrals::referral_code))
        .route(
            "/withdrawals",
            get(withdrawals::list_withdrawals).post(withdrawals::create_withdrawal),
        )
        .route("/withdrawals/my", get(withdrawals::my_withdrawals))
        .route(
            "/withdrawals/{withdrawal_id}/approve",
            post(withdrawals::approve_withdrawal),
        )
        .route(
            "/withdrawals/{withdrawal_id}/reject",
            post(withdrawals::reject_withdrawal),
        )
        .with_state(state);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::register,
        users::get_profile,
        courses::list_courses,
        courses::get_course,
        courses::create_course,
        payment_accounts::list_payment_accounts,
        payment_accounts::get_payment_account,
        payment_accounts::create_payment_account,
        payments::create_payment_request,
        payments::my_payment_requests,
        payments::get_payment_request,
        payments::list_payment_requests,
        payments::approve_payment_request,
        payments::reject_payment_request,
        enrollments::my_enrollments,
        enrollments::check_enrollment,
        enrollments::update_progress,
        referrals::create_referral,
        referrals::my_referrals,
        referrals::referral_stats,
        referrals::referral_earnings,
        referrals::referral_code,
        withdrawals::create_withdrawal,
        withdrawals::my_withdrawals,
        withdrawals::list_withdrawals,
        withdrawals::approve_withdrawal,
        withdrawals::reject_withdrawal
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            Role,
            RegisterRequest,
            UserResponse,
            StoredCourse,
            NewCourse,
            StoredPaymentAccount,
            NewPaymentAccount,
            PaymentStatus,
            StoredPaymentRequest,
            CreatePaymentRequestBody,
            ApproveRequestBody,
            RejectRequestBody,
            ApprovalResponse,
            EnrollmentStatus,
            StoredEnrollment,
            UpdateProgressRequest,
            EnrollmentCheckResponse,
            ReferralStatus,
            StoredReferral,
            StoredReferralEarning,
            ReferralStats,
            CreateReferralRequest,
            ReferralCodeResponse,
            StoredWithdrawal,
            CreateWithdrawalBody
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health probes"),
        (name = "Auth", description = "Account registration"),
        (name = "Users", description = "User profiles"),
        (name = "Courses", description = "Course catalog"),
        (name = "PaymentAccounts", description = "Admin payment channels"),
        (name = "Payments", description = "Payment requests and adjudication"),
        (name = "Enrollments", description = "Course enrollments and progress"),
        (name = "Referrals", description = "Referral ledger and earnings"),
        (name = "Withdrawals", description = "Earnings withdrawal requests")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LedgerDb;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("test.redb")).unwrap();
        let app = router(AppState::new(db));
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_document_includes_core_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("/v1/payments/requests/{request_id}/approve"));
        assert!(json.contains("/v1/withdrawals/{withdrawal_id}/approve"));
        assert!(json.contains("/v1/auth/register"));
    }
}
