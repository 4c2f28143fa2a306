// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Elevate - Learning Platform Backend
//!
//! This crate provides the REST backend for the Elevate learning platform:
//! a course catalog, a manual payment-approval workflow with automatic
//! enrollment, a referral bonus system, and an earnings withdrawal
//! workflow, all over an embedded ACID store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer-token authentication and role gating
//! - `storage` - Embedded ledger database (redb) and all state transitions
//! - `models` - API request/response types

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
