// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `user_email_idx`: lowercase email → user_id
//! - `referral_code_idx`: referral code → user_id
//! - `courses`: course_id → serialized StoredCourse
//! - `payment_accounts`: account_id → serialized StoredPaymentAccount
//! - `payment_requests`: request_id → serialized StoredPaymentRequest
//! - `payment_course_idx`: composite key (user_id|course_id|request_id) → status
//! - `enrollments`: enrollment_id → serialized StoredEnrollment
//! - `enrollment_idx`: composite key (user_id|course_id) → enrollment_id
//! - `referrals`: referral_id → serialized StoredReferral
//! - `referral_match_idx`: composite key (referrer_id|email) → referral_id
//! - `referral_earnings`: earning_id → serialized StoredReferralEarning
//! - `withdrawals`: withdrawal_id → serialized StoredWithdrawal
//!
//! ## Concurrency Model
//!
//! redb serializes write transactions (single writer). Every state
//! transition re-reads the row inside its own write transaction before
//! mutating it, so a "check status, then transition" sequence cannot race
//! another writer. This is the embedded-store equivalent of a conditional
//! `UPDATE ... WHERE status = 'pending'` whose affected-row-count signals
//! success. Balance credits and debits happen inside the same write
//! transaction as the status transition that justifies them.

use std::path::Path;

use redb::{Database, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user_id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Index: lowercase email → user_id.
pub(crate) const USER_EMAIL_IDX: TableDefinition<&str, &str> =
    TableDefinition::new("user_email_idx");

/// Index: referral code → user_id.
pub(crate) const REFERRAL_CODE_IDX: TableDefinition<&str, &str> =
    TableDefinition::new("referral_code_idx");

/// Primary table: course_id → serialized StoredCourse.
pub(crate) const COURSES: TableDefinition<&str, &[u8]> = TableDefinition::new("courses");

/// Primary table: account_id → serialized StoredPaymentAccount.
pub(crate) const PAYMENT_ACCOUNTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("payment_accounts");

/// Primary table: request_id → serialized StoredPaymentRequest.
pub(crate) const PAYMENT_REQUESTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("payment_requests");

/// Index: composite key (user_id|course_id|request_id) → status string.
///
/// Scanned by prefix to find a user's requests for one course, e.g. the
/// duplicate pending/approved guard at submission time.
pub(crate) const PAYMENT_COURSE_IDX: TableDefinition<&str, &str> =
    TableDefinition::new("payment_course_idx");

/// Primary table: enrollment_id → serialized StoredEnrollment.
pub(crate) const ENROLLMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("enrollments");

/// Index: composite key (user_id|course_id) → enrollment_id.
///
/// Presence of a key is the "at most one enrollment per pair" guard.
pub(crate) const ENROLLMENT_IDX: TableDefinition<&str, &str> =
    TableDefinition::new("enrollment_idx");

/// Primary table: referral_id → serialized StoredReferral.
pub(crate) const REFERRALS: TableDefinition<&str, &[u8]> = TableDefinition::new("referrals");

/// Index: composite key (referrer_id|lowercase email) → referral_id.
///
/// Used by the approval transaction to locate the ledger row to complete.
pub(crate) const REFERRAL_MATCH_IDX: TableDefinition<&str, &str> =
    TableDefinition::new("referral_match_idx");

/// Primary table: earning_id → serialized StoredReferralEarning.
pub(crate) const REFERRAL_EARNINGS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("referral_earnings");

/// Primary table: withdrawal_id → serialized StoredWithdrawal.
pub(crate) const WITHDRAWALS: TableDefinition<&str, &[u8]> = TableDefinition::new("withdrawals");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: u64, requested: u64 },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build a two-part composite key, e.g. `user_id|course_id`.
pub(crate) fn pair_key(a: &str, b: &str) -> String {
    format!("{a}|{b}")
}

/// Build the composite key for the payment_course_idx table.
pub(crate) fn request_course_key(user_id: &str, course_id: &str, request_id: &str) -> String {
    format!("{user_id}|{course_id}|{request_id}")
}

/// Build the prefix for range-scanning all of a user's requests for a course.
pub(crate) fn request_course_prefix(user_id: &str, course_id: &str) -> String {
    format!("{user_id}|{course_id}|")
}

// =============================================================================
// LedgerDb
// =============================================================================

/// Embedded ACID ledger database.
///
/// All money-movement invariants (payment approval, referral payout,
/// withdrawal debit) ride on redb write transactions. Operations are
/// grouped by entity in the sibling modules, all as methods on this type.
pub struct LedgerDb {
    pub(crate) db: Database,
}

impl LedgerDb {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAIL_IDX)?;
            let _ = write_txn.open_table(REFERRAL_CODE_IDX)?;
            let _ = write_txn.open_table(COURSES)?;
            let _ = write_txn.open_table(PAYMENT_ACCOUNTS)?;
            let _ = write_txn.open_table(PAYMENT_REQUESTS)?;
            let _ = write_txn.open_table(PAYMENT_COURSE_IDX)?;
            let _ = write_txn.open_table(ENROLLMENTS)?;
            let _ = write_txn.open_table(ENROLLMENT_IDX)?;
            let _ = write_txn.open_table(REFERRALS)?;
            let _ = write_txn.open_table(REFERRAL_MATCH_IDX)?;
            let _ = write_txn.open_table(REFERRAL_EARNINGS)?;
            let _ = write_txn.open_table(WITHDRAWALS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }
}

// =============================================================================
// Tests
// =============================================================================
