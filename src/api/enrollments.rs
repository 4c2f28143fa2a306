// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Enrollment endpoints ("My Courses").
//!
//! Enrollments are created only by payment approval; these endpoints
//! cover reads and progress tracking.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{EnrollmentCheckResponse, UpdateProgressRequest},
    state::AppState,
    storage::StoredEnrollment,
};

/// List the caller's enrollments, newest first.
#[utoipa::path(
    get,
    path = "/v1/enrollments/my",
    tag = "Enrollments",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "The caller's enrollments", body = [StoredEnrollment]))
)]
pub async fn my_enrollments(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredEnrollment>>, ApiError> {
    let enrollments = state.db.list_user_enrollments(&user.user_id)?;
    Ok(Json(enrollments))
}

/// Check whether the caller is enrolled in a course.
#[utoipa::path(
    get,
    path = "/v1/enrollments/check/{course_id}",
    tag = "Enrollments",
    params(("course_id" = String, Path, description = "Course ID")),
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Enrollment status", body = EnrollmentCheckResponse))
)]
pub async fn check_enrollment(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<EnrollmentCheckResponse>, ApiError> {
    let enrolled = state.db.is_enrolled(&user.user_id, &course_id)?;
    Ok(Json(EnrollmentCheckResponse { enrolled }))
}

/// Update progress on one of the caller's enrollments.
///
/// Progress 100 marks the enrollment completed.
#[utoipa::path(
    put,
    path = "/v1/enrollments/{enrollment_id}/progress",
    request_body = UpdateProgressRequest,
    tag = "Enrollments",
    params(("enrollment_id" = String, Path, description = "Enrollment ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated enrollment", body = StoredEnrollment),
        (status = 400, description = "Progress out of range"),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn update_progress(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(enrollment_id): Path<String>,
    Json(body): Json<UpdateProgressRequest>,
) -> Result<Json<StoredEnrollment>, ApiError> {
    let enrollment =
        state
            .db
            .update_enrollment_progress(&user.user_id, &enrollment_id, body.progress)?;
    Ok(Json(enrollment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::storage::{
        EnrollmentStatus, NewCourse, NewPaymentAccount, NewPaymentRequest, NewUser,
    };
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = crate::storage::LedgerDb::open(&temp_dir.path().join("test.redb")).unwrap();
        (AppState::new(db), temp_dir)
    }

    fn auth_for(user_id: &str) -> Auth {
        Auth(AuthenticatedUser {
            user_id: user_id.to_string(),
            email: "student@example.com".to_string(),
            role: Role::Student,
            expires_at: 0,
        })
    }

    /// Enroll a user through the real approval path.
    fn enrolled(state: &AppState) -> (String, String, String) {
        let user = state
            .db
            .create_user(NewUser {
                full_name: "Student".to_string(),
                email: "student@example.com".to_string(),
                password_hash: "$argon2id$stub".to_string(),
                referred_by: None,
                role: Role::Student,
            })
            .unwrap();
        let course = state
            .db
            .create_course(NewCourse {
                title: "Photography".to_string(),
                description: "Light and framing".to_string(),
                price: 800,
                duration: "6 weeks".to_string(),
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
                &user.id,
                NewPaymentRequest {
                    course_id: course.id.clone(),
                    payment_account_id: account.id,
                    amount: 800,
                    transaction_screenshot_url: "/uploads/shot.png".to_string(),
                    transaction_reference: None,
                },
            )
            .unwrap();
        let outcome = state
            .db
            .approve_payment_and_enroll(&request.id, "admin-1", None)
            .unwrap();
        (user.id, course.id, outcome.enrollment_id)
    }

    #[tokio::test]
    async fn listing_and_check_reflect_enrollment() {
        let (state, _dir) = test_state();
        let (user_id, course_id, _) = enrolled(&state);

        let Json(list) = my_enrollments(auth_for(&user_id), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(list.len(), 1);

        let Json(check) = check_enrollment(
            auth_for(&user_id),
            State(state.clone()),
            Path(course_id),
        )
        .await
        .unwrap();
        assert!(check.enrolled);

        let Json(other) = check_enrollment(
            auth_for(&user_id),
            State(state.clone()),
            Path("other-course".to_string()),
        )
        .await
        .unwrap();
        assert!(!other.enrolled);
    }

    #[tokio::test]
    async fn progress_completion_via_handler() {
        let (state, _dir) = test_state();
        let (user_id, _, enrollment_id) = enrolled(&state);

        let Json(updated) = update_progress(
            auth_for(&user_id),
            State(state.clone()),
            Path(enrollment_id),
            Json(UpdateProgressRequest { progress: 100 }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Completed);
        assert!(updated.completed_at.is_some());
    }
}
