// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::{AuthError, AuthenticatedUser, Role};
use crate::state::AppState;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Claims carried by identity-service tokens.
#[derive(Debug, Deserialize)]
struct JwtClaims {
    /// Subject (platform user ID)
    sub: String,
    /// Email address
    #[serde(default)]
    email: String,
    /// Expiration timestamp
    #[serde(default)]
    exp: i64,
    /// Issuer
    #[serde(default)]
    #[allow(dead_code)]
    iss: String,
    /// Role claim (set by the identity service)
    #[serde(default)]
    role: Option<String>,
}

impl JwtClaims {
    fn into_user(self) -> AuthenticatedUser {
        let role = self
            .role
            .as_deref()
            .and_then(Role::from_str)
            .unwrap_or(Role::Student);

        AuthenticatedUser {
            user_id: self.sub,
            email: self.email,
            role,
            expires_at: self.exp,
        }
    }
}

/// Extractor for authenticated users.
///
/// Validates the JWT from the Authorization header and provides the
/// authenticated user information.
///
/// ## Authentication Modes
///
/// - **Production mode** (`AUTH_JWT_SECRET` set): full HS256 signature
///   verification against the shared secret
/// - **Development mode** (no secret): structure validation only
///   (no signature check)
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        // Extract Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        // Extract Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthHeader)?;

        let user = verify_jwt(token, &state.auth)?;

        Ok(Auth(user))
    }
}

/// Verify JWT and extract user information.
fn verify_jwt(token: &str, auth: &crate::state::AuthConfig) -> Result<AuthenticatedUser, AuthError> {
    if let Some(ref secret) = auth.jwt_secret {
        verify_jwt_production(token, secret, auth.issuer.as_deref())
    } else {
        verify_jwt_development(token)
    }
}

/// Production JWT verification against the shared secret (HS256).
fn verify_jwt_production(
    token: &str,
    secret: &str,
    issuer: Option<&str>,
) -> Result<AuthenticatedUser, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_aud = false;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }

    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        _ => AuthError::MalformedToken,
    })?;

    Ok(token_data.claims.into_user())
}

/// Development JWT verification (no signature check).
///
/// WARNING: This should only be used in development environments.
fn verify_jwt_development(token: &str) -> Result<AuthenticatedUser, AuthError> {
    let token_data = jsonwebtoken::dangerous::insecure_decode::<JwtClaims>(token)
        .map_err(|_e| AuthError::MalformedToken)?;

    let claims = token_data.claims;

    // Check expiration manually
    let now = chrono::Utc::now().timestamp();
    if claims.exp > 0 && claims.exp < now - CLOCK_SKEW_LEEWAY as i64 {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims.into_user())
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, AuthConfig};
    use crate::storage::LedgerDb;
    use axum::http::Request;
    use tempfile::TempDir;

    /// Helper to create a test AppState in development auth mode.
    fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = LedgerDb::open(&temp_dir.path().join("test.redb")).expect("open db");
        let state = AppState::new(db);
        (state, temp_dir)
    }

    /// Helper to create a test JWT token (unsigned, for development mode).
    fn create_test_jwt(user_id: &str, role: &str) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let header = r#"{"alg":"HS256","typ":"JWT"}"#;
        let claims = format!(
            r#"{{"sub":"{user_id}","email":"{user_id}@example.com","exp":9999999999,"iss":"test","role":"{role}"}}"#
        );

        let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.as_bytes());

        // Signature is ignored in development mode
        format!("{header_b64}.{claims_b64}.fake_signature")
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_succeeds_with_jwt() {
        let (state, _temp_dir) = create_test_state();
        let token = create_test_jwt("user_123", "student");
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        let Auth(user) = result.expect("auth succeeds");
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.role, Role::Student);
    }

    #[tokio::test]
    async fn production_mode_verifies_signature() {
        use jsonwebtoken::{encode, EncodingKey, Header};
        use serde::Serialize;

        #[derive(Serialize)]
        struct Claims<'a> {
            sub: &'a str,
            email: &'a str,
            exp: i64,
            iss: &'a str,
            role: &'a str,
        }

        let (state, _temp_dir) = create_test_state();
        let state = state.with_auth(AuthConfig {
            jwt_secret: Some("test-secret".to_string()),
            issuer: None,
        });

        let token = encode(
            &Header::default(),
            &Claims {
                sub: "admin_1",
                email: "admin@example.com",
                exp: chrono::Utc::now().timestamp() + 3600,
                iss: "test",
                role: "admin",
            },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let Auth(user) = Auth::from_request_parts(&mut parts, &state)
            .await
            .expect("valid signature accepted");
        assert_eq!(user.role, Role::Admin);

        // Tampered secret is rejected
        let bad = state.clone().with_auth(AuthConfig {
            jwt_secret: Some("other-secret".to_string()),
            issuer: None,
        });
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts()
            .0;
        let result = Auth::from_request_parts(&mut parts, &bad).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn admin_only_rejects_non_admin() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let user = AuthenticatedUser {
            user_id: "user_123".to_string(),
            email: "user@example.com".to_string(),
            role: Role::Student,
            expires_at: 0,
        };
        parts.extensions.insert(user);

        let result = AdminOnly::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }
}
