// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

use std::sync::Arc;

use crate::storage::LedgerDb;

/// Authentication configuration loaded from the environment at startup.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Shared secret for HS256 token verification. `None` enables
    /// development mode (structure-only token validation).
    pub jwt_secret: Option<String>,
    /// Expected `iss` claim, when the identity service sets one.
    pub issuer: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<LedgerDb>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(db: LedgerDb) -> Self {
        Self {
            db: Arc::new(db),
            auth: AuthConfig::default(),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }
}
