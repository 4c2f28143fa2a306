// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the embedded database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_JWT_SECRET` | Shared secret for bearer-token verification | Required for production |
//! | `AUTH_ISSUER` | Expected JWT issuer claim | Optional |
//! | `SEED_ADMIN_EMAIL` | Bootstrap admin account email | Optional |
//! | `SEED_ADMIN_PASSWORD` | Bootstrap admin account password | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the data directory path.
///
/// The ledger database file lives under this directory. It is created on
/// first start if missing.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory when `DATA_DIR` is not set.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// File name of the ledger database inside the data directory.
pub const LEDGER_DB_FILE: &str = "elevate.redb";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the JWT shared secret.
///
/// When set, bearer tokens are verified (HS256) against this secret. When
/// unset, the server runs in development mode and only validates token
/// structure and expiry.
pub const AUTH_JWT_SECRET_ENV: &str = "AUTH_JWT_SECRET";

/// Environment variable name for the expected JWT issuer claim.
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";

/// Environment variable name for the bootstrap admin account email.
///
/// When set together with `SEED_ADMIN_PASSWORD` and no user exists with
/// that email, an admin user is created at startup.
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";

/// Environment variable name for the bootstrap admin account password.
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
