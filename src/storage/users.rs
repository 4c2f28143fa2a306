// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! User accounts and the earnings balance.
//!
//! `total_earnings` is mutated only by the payment-approval transaction
//! (credit) and withdrawal approval (debit); both live in sibling modules
//! and run inside a single write transaction each.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

use super::db::{pair_key, LedgerDb, LedgerError, LedgerResult, REFERRAL_CODE_IDX, USERS, USER_EMAIL_IDX};

/// Prefix for generated referral codes.
const REFERRAL_CODE_PREFIX: &str = "ELEVATE";

/// A platform user account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Display name
    pub full_name: String,
    /// Email address (unique, also the login identifier)
    pub email: String,
    /// Argon2id password hash. Verified by the identity service, never
    /// returned through the API.
    pub password_hash: String,
    /// This user's own referral code (unique, generated at creation)
    pub referral_code: String,
    /// Referral code of the user who referred this one, captured at
    /// registration and immutable afterwards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    /// Authorization role
    pub role: Role,
    /// Accumulated referral earnings, in whole currency units (ETB)
    pub total_earnings: u64,
    /// Whether the account is active
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub referred_by: Option<String>,
    pub role: Role,
}

impl LedgerDb {
    /// Create a new user with a generated id and referral code.
    ///
    /// The email must not already be registered. `referred_by` is stored
    /// as given; whether it resolves to a real referrer is decided at
    /// payment-approval time (a stale code simply never pays out).
    pub fn create_user(&self, new_user: NewUser) -> LedgerResult<StoredUser> {
        let id = uuid::Uuid::new_v4().to_string();
        let referral_code = format!("{REFERRAL_CODE_PREFIX}{}", id[..8].to_uppercase());
        let email_key = new_user.email.to_lowercase();

        let user = StoredUser {
            id,
            full_name: new_user.full_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            referral_code,
            referred_by: new_user.referred_by,
            role: new_user.role,
            total_earnings: 0,
            is_active: true,
            created_at: Utc::now(),
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut email_idx = write_txn.open_table(USER_EMAIL_IDX)?;
            let mut code_idx = write_txn.open_table(REFERRAL_CODE_IDX)?;

            if email_idx.get(email_key.as_str())?.is_some() {
                return Err(LedgerError::Conflict(format!(
                    "email {} is already registered",
                    user.email
                )));
            }

            let json = serde_json::to_vec(&user)?;
            users.insert(user.id.as_str(), json.as_slice())?;
            email_idx.insert(email_key.as_str(), user.id.as_str())?;
            code_idx.insert(user.referral_code.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;

        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Look up a user by id.
    pub fn get_user(&self, user_id: &str) -> LedgerResult<StoredUser> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(user_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(LedgerError::NotFound(format!("User {user_id}"))),
        }
    }

    /// Look up a user by email (case-insensitive).
    pub fn get_user_by_email(&self, email: &str) -> LedgerResult<Option<StoredUser>> {
        let email_key = email.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let email_idx = read_txn.open_table(USER_EMAIL_IDX)?;
        let user_id = match email_idx.get(email_key.as_str())? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Resolve a referral code to its owner.
    pub fn find_user_by_referral_code(&self, code: &str) -> LedgerResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let code_idx = read_txn.open_table(REFERRAL_CODE_IDX)?;
        let user_id = match code_idx.get(code)? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

/// Build the referral-ledger match key for a (referrer, referred email) pair.
pub(crate) fn referral_match_key(referrer_id: &str, email: &str) -> String {
    pair_key(referrer_id, &email.to_lowercase())
}
