// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

use std::{env, net::SocketAddr, path::PathBuf};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use tracing_subscriber::EnvFilter;

use elevate_server::{
    api::router,
    auth::Role,
    config::{
        AUTH_ISSUER_ENV, AUTH_JWT_SECRET_ENV, DATA_DIR_ENV, DEFAULT_DATA_DIR, HOST_ENV,
        LEDGER_DB_FILE, LOG_FORMAT_ENV, PORT_ENV, SEED_ADMIN_EMAIL_ENV, SEED_ADMIN_PASSWORD_ENV,
    },
    state::{AppState, AuthConfig},
    storage::{LedgerDb, NewUser},
};

#[tokio::main]
async fn main() {
    init_tracing();

    // Open the ledger database. There is no fallback store: if this fails
    // the process must not come up.
    let data_dir =
        PathBuf::from(env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()));
    let db = LedgerDb::open(&data_dir.join(LEDGER_DB_FILE))
        .expect("Failed to open ledger database");
    tracing::info!(data_dir = %data_dir.display(), "ledger database opened");

    seed_admin(&db);

    let auth = AuthConfig {
        jwt_secret: env::var(AUTH_JWT_SECRET_ENV).ok(),
        issuer: env::var(AUTH_ISSUER_ENV).ok(),
    };
    if auth.jwt_secret.is_none() {
        tracing::warn!(
            "AUTH_JWT_SECRET not set; running in development mode without signature verification"
        );
    }

    let state = AppState::new(db).with_auth(auth);
    let app = router(state);

    // Parse bind address
    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    tracing::info!("Elevate server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = env::var(LOG_FORMAT_ENV).map(|v| v == "json").unwrap_or(false);
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Create the bootstrap admin account if configured and missing.
fn seed_admin(db: &LedgerDb) {
    let (Ok(email), Ok(password)) = (
        env::var(SEED_ADMIN_EMAIL_ENV),
        env::var(SEED_ADMIN_PASSWORD_ENV),
    ) else {
        return;
    };

    match db.get_user_by_email(&email) {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, "failed to check for existing admin account");
            return;
        }
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = match Argon2::default().hash_password(password.as_bytes(), &salt) {
        Ok(hash) => hash.to_string(),
        Err(e) => {
            tracing::error!(error = %e, "failed to hash seed admin password");
            return;
        }
    };

    match db.create_user(NewUser {
        full_name: "Platform Admin".to_string(),
        email,
        password_hash,
        referred_by: None,
        role: Role::Admin,
    }) {
        Ok(admin) => tracing::info!(user_id = %admin.id, "seed admin account created"),
        Err(e) => tracing::error!(error = %e, "failed to create seed admin account"),
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("shutdown signal received, draining connections");
}
