// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Account registration.
//!
//! Login and token minting live in the external identity service; this
//! endpoint only creates the platform profile (with its referral code)
//! and stores the password credential as an Argon2id hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::Role,
    error::ApiError,
    models::{RegisterRequest, UserResponse},
    state::AppState,
    storage::NewUser,
};

/// Minimum accepted password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Register a new user account.
///
/// An optional referral code binds the new user to their referrer; the
/// code is stored as given and only resolved when a payment is approved.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if request.full_name.trim().is_empty() {
        return Err(ApiError::bad_request("Full name is required"));
    }
    if !request.email.contains('@') {
        return Err(ApiError::bad_request("A valid email address is required"));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(request.password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?
        .to_string();

    let user = state.db.create_user(NewUser {
        full_name: request.full_name.trim().to_string(),
        email: request.email.trim().to_string(),
        password_hash,
        referred_by: request.referral_code.filter(|c| !c.trim().is_empty()),
        role: Role::Student,
    })?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = crate::storage::LedgerDb::open(&temp_dir.path().join("test.redb")).unwrap();
        (AppState::new(db), temp_dir)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            full_name: "Abebe Bikila".to_string(),
            email: email.to_string(),
            password: "correct-horse".to_string(),
            referral_code: None,
        }
    }

    #[tokio::test]
    async fn register_creates_profile_with_referral_code() {
        let (state, _dir) = test_state();

        let (status, Json(user)) = register(
            State(state.clone()),
            Json(register_request("abebe@example.com")),
        )
        .await
        .expect("registration succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert!(user.referral_code.starts_with("ELEVATE"));
        assert_eq!(user.total_earnings, 0);
        assert_eq!(user.role, Role::Student);

        // The stored hash is a real Argon2id hash, not the plaintext
        let stored = state.db.get_user(&user.id).unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (state, _dir) = test_state();

        register(
            State(state.clone()),
            Json(register_request("dup@example.com")),
        )
        .await
        .expect("first registration succeeds");

        let result = register(
            State(state.clone()),
            Json(register_request("dup@example.com")),
        )
        .await;
        match result {
            Err(err) => assert_eq!(err.status, StatusCode::CONFLICT),
            Ok(_) => panic!("expected conflict for duplicate email"),
        }
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (state, _dir) = test_state();

        let mut no_at = register_request("not-an-email");
        no_at.email = "not-an-email".to_string();
        let result = register(State(state.clone()), Json(no_at)).await;
        assert!(matches!(result, Err(e) if e.status == StatusCode::BAD_REQUEST));

        let mut short = register_request("ok@example.com");
        short.password = "short".to_string();
        let result = register(State(state.clone()), Json(short)).await;
        assert!(matches!(result, Err(e) if e.status == StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn register_captures_referrer_code() {
        let (state, _dir) = test_state();

        let (_, Json(referrer)) = register(
            State(state.clone()),
            Json(register_request("referrer@example.com")),
        )
        .await
        .unwrap();

        let mut referred = register_request("referred@example.com");
        referred.referral_code = Some(referrer.referral_code.clone());
        let (_, Json(user)) = register(State(state.clone()), Json(referred)).await.unwrap();

        assert_eq!(user.referred_by.as_deref(), Some(referrer.referral_code.as_str()));
    }
}
