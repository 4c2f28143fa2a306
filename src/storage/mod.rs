// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! # Ledger Storage Module
//!
//! Persistent storage for all platform state, backed by redb (embedded,
//! pure Rust, ACID). One [`LedgerDb`] is opened per process and shared
//! through the application state.
//!
//! ## Why one database type
//!
//! The correctness-critical operations (payment approval, withdrawal
//! approval) span several entities: a status transition, an enrollment
//! insert, a ledger update, and a balance mutation must commit or abort
//! together. Methods on a single [`LedgerDb`] can open every table they
//! need inside one write transaction; per-entity repositories with their
//! own transactions could not.
//!
//! ## Module Layout
//!
//! - [`db`] - database handle, table definitions, error type
//! - [`users`] - accounts, email/referral-code indexes, earnings balance
//! - [`catalog`] - courses and admin payment channels
//! - [`payments`] - payment request lifecycle, the approval transaction
//! - [`enrollments`] - enrollment reads and progress updates
//! - [`referrals`] - referral ledger and payout audit records
//! - [`withdrawals`] - withdrawal lifecycle and balance debits
//!
//! ## Important Notes
//!
//! - Write transactions are serialized by redb; every status transition
//!   re-checks state inside its own write transaction, so no transition
//!   can race another writer.
//! - There is no in-memory fallback. If the database cannot be opened the
//!   process fails at startup rather than running without durability.

pub mod catalog;
pub mod db;
pub mod enrollments;
pub mod payments;
pub mod referrals;
pub mod users;
pub mod withdrawals;

pub use catalog::{NewCourse, NewPaymentAccount, StoredCourse, StoredPaymentAccount};
pub use db::{LedgerDb, LedgerError, LedgerResult};
pub use enrollments::{EnrollmentStatus, StoredEnrollment};
pub use payments::{
    ApprovalOutcome, NewPaymentRequest, PaymentStatus, StoredPaymentRequest,
    REFERRAL_BONUS_PERCENT,
};
pub use referrals::{ReferralStats, ReferralStatus, StoredReferral, StoredReferralEarning};
pub use users::{NewUser, StoredUser};
pub use withdrawals::{NewWithdrawal, StoredWithdrawal, MIN_WITHDRAWAL_AMOUNT};
