// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! # Authentication Module
//!
//! Bearer-token authentication for the Elevate API. Token minting and
//! credential verification live in the external identity service; this
//! module only verifies tokens and extracts the caller's identity.
//!
//! ## Auth Flow
//!
//! 1. Frontend authenticates the user with the identity service
//! 2. Frontend sends `Authorization: Bearer <JWT>`
//! 3. This server:
//!    - Verifies signature (HS256 shared secret), expiry, issuer
//!    - Extracts:
//!      - `sub` → canonical `user_id`
//!      - `email`, `role` claims
//!
//! ## Security
//!
//! - All non-health endpoints require authentication
//! - Clock skew tolerance is 60 seconds
//! - Without `AUTH_JWT_SECRET` the server runs in development mode and
//!   skips signature verification

pub mod claims;
pub mod error;
pub mod extractor;
pub mod roles;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use roles::Role;
