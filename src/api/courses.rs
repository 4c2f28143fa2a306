// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Course catalog endpoints.
//!
//! Browsing is public; creation is admin-only so the catalog can be
//! populated. Full course management tooling is out of scope here.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    state::AppState,
    storage::{NewCourse, StoredCourse},
};

/// List active courses, newest first.
#[utoipa::path(
    get,
    path = "/v1/courses",
    tag = "Courses",
    responses((status = 200, description = "Active courses", body = [StoredCourse]))
)]
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredCourse>>, ApiError> {
    let courses = state.db.list_courses(true)?;
    Ok(Json(courses))
}

/// Get a single course by id.
#[utoipa::path(
    get,
    path = "/v1/courses/{course_id}",
    tag = "Courses",
    params(("course_id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "The course", body = StoredCourse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<StoredCourse>, ApiError> {
    let course = state.db.get_course(&course_id)?;
    Ok(Json(course))
}

/// Create a course (admin only).
#[utoipa::path(
    post,
    path = "/v1/courses",
    request_body = NewCourse,
    tag = "Courses",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Course created", body = StoredCourse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn create_course(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(new_course): Json<NewCourse>,
) -> Result<(StatusCode, Json<StoredCourse>), ApiError> {
    if new_course.title.trim().is_empty() {
        return Err(ApiError::bad_request("Course title is required"));
    }

    let course = state.db.create_course(new_course)?;
    tracing::info!(course_id = %course.id, admin_id = %admin.user_id, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}
