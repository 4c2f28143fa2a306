// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Referral ledger and earning audit records.
//!
//! A referral row records who invited whom (by email) and is completed by
//! the payment-approval transaction when the invited email's payment is
//! approved. The earning record is the immutable proof of each payout.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::db::{LedgerDb, LedgerError, LedgerResult, REFERRALS, REFERRAL_EARNINGS, REFERRAL_MATCH_IDX};
use super::users::referral_match_key;

/// Referral completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    Pending,
    Completed,
}

/// One referred signup in the referral ledger.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredReferral {
    /// Unique referral identifier (UUID)
    pub id: String,
    pub referrer_id: String,
    /// Display name of the referred person
    pub name: String,
    /// Email the referral is bound to; matched at approval time
    pub email: String,
    pub status: ReferralStatus,
    /// Bonus amount, 0 until the referral completes
    pub reward_earned: u64,
    /// The payment request whose approval completed this referral
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_request_id: Option<String>,
    pub date_referred: DateTime<Utc>,
}

/// Immutable audit record of one referral payout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredReferralEarning {
    /// Unique earning identifier (UUID)
    pub id: String,
    pub referrer_id: String,
    pub referred_user_id: String,
    pub enrollment_id: String,
    pub course_id: String,
    pub bonus_amount: u64,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
}

/// Aggregated referral statistics for one user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ReferralStats {
    pub total_referrals: u64,
    pub completed_referrals: u64,
    pub pending_referrals: u64,
    /// Sum of reward_earned across the ledger
    pub total_earnings: u64,
    pub referral_code: String,
}

impl LedgerDb {
    /// Record a referred signup (status pending until payment approval).
    ///
    /// The email is not validated against existing users; the binding
    /// happens at approval time by matching the buyer's email. One ledger
    /// row per (referrer, email) keeps that match unambiguous.
    pub fn create_referral(
        &self,
        referrer_id: &str,
        name: &str,
        email: &str,
    ) -> LedgerResult<StoredReferral> {
        let referral = StoredReferral {
            id: uuid::Uuid::new_v4().to_string(),
            referrer_id: referrer_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            status: ReferralStatus::Pending,
            reward_earned: 0,
            payment_request_id: None,
            date_referred: Utc::now(),
        };

        let match_key = referral_match_key(referrer_id, email);

        let write_txn = self.db.begin_write()?;
        {
            let mut referrals = write_txn.open_table(REFERRALS)?;
            let mut match_idx = write_txn.open_table(REFERRAL_MATCH_IDX)?;

            if match_idx.get(match_key.as_str())?.is_some() {
                return Err(LedgerError::Conflict(format!(
                    "you already referred {email}"
                )));
            }

            let json = serde_json::to_vec(&referral)?;
            referrals.insert(referral.id.as_str(), json.as_slice())?;
            match_idx.insert(match_key.as_str(), referral.id.as_str())?;
        }
        write_txn.commit()?;

        Ok(referral)
    }

    /// List a user's referrals, newest first.
    pub fn list_user_referrals(&self, user_id: &str) -> LedgerResult<Vec<StoredReferral>> {
        let read_txn = self.db.begin_read()?;
        let referrals = read_txn.open_table(REFERRALS)?;

        let mut results = Vec::new();
        for entry in referrals.iter()? {
            let (_, value) = entry?;
            let referral: StoredReferral = serde_json::from_slice(value.value())?;
            if referral.referrer_id == user_id {
                results.push(referral);
            }
        }
        results.sort_by(|a, b| b.date_referred.cmp(&a.date_referred));
        Ok(results)
    }

    /// List a user's referral payout audit records, newest first.
    pub fn list_referral_earnings(
        &self,
        user_id: &str,
    ) -> LedgerResult<Vec<StoredReferralEarning>> {
        let read_txn = self.db.begin_read()?;
        let earnings = read_txn.open_table(REFERRAL_EARNINGS)?;

        let mut results = Vec::new();
        for entry in earnings.iter()? {
            let (_, value) = entry?;
            let earning: StoredReferralEarning = serde_json::from_slice(value.value())?;
            if earning.referrer_id == user_id {
                results.push(earning);
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// Aggregate a user's referral statistics.
    pub fn get_referral_stats(&self, user_id: &str) -> LedgerResult<ReferralStats> {
        let referral_code = self.get_user(user_id)?.referral_code;
        let referrals = self.list_user_referrals(user_id)?;

        let completed = referrals
            .iter()
            .filter(|r| r.status == ReferralStatus::Completed)
            .count() as u64;
        let pending = referrals
            .iter()
            .filter(|r| r.status == ReferralStatus::Pending)
            .count() as u64;
        let total_earnings = referrals.iter().map(|r| r.reward_earned).sum();

        Ok(ReferralStats {
            total_referrals: referrals.len() as u64,
            completed_referrals: completed,
            pending_referrals: pending,
            total_earnings,
            referral_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::storage::users::{NewUser, StoredUser};

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    fn make_user(db: &LedgerDb, email: &str) -> StoredUser {
        db.create_user(NewUser {
            full_name: "Referrer".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            referred_by: None,
            role: Role::Student,
        })
        .unwrap()
    }

    #[test]
    fn create_referral_starts_pending_with_zero_reward() {
        let (db, _dir) = temp_db();
        let user = make_user(&db, "r@example.com");

        let referral = db
            .create_referral(&user.id, "friend", "friend@example.com")
            .unwrap();
        assert_eq!(referral.status, ReferralStatus::Pending);
        assert_eq!(referral.reward_earned, 0);
        assert!(referral.payment_request_id.is_none());
    }

    #[test]
    fn duplicate_referral_for_same_email_conflicts() {
        let (db, _dir) = temp_db();
        let user = make_user(&db, "r@example.com");

        db.create_referral(&user.id, "friend", "friend@example.com")
            .unwrap();
        let second = db.create_referral(&user.id, "friend", "Friend@Example.com");
        assert!(matches!(second, Err(LedgerError::Conflict(_))));
    }

    #[test]
    fn different_referrers_may_refer_same_email() {
        let (db, _dir) = temp_db();
        let a = make_user(&db, "a@example.com");
        let b = make_user(&db, "b@example.com");

        db.create_referral(&a.id, "friend", "friend@example.com").unwrap();
        db.create_referral(&b.id, "friend", "friend@example.com").unwrap();

        assert_eq!(db.list_user_referrals(&a.id).unwrap().len(), 1);
        assert_eq!(db.list_user_referrals(&b.id).unwrap().len(), 1);
    }

    #[test]
    fn stats_aggregate_counts_and_rewards() {
        let (db, _dir) = temp_db();
        let user = make_user(&db, "r@example.com");

        db.create_referral(&user.id, "one", "one@example.com").unwrap();
        db.create_referral(&user.id, "two", "two@example.com").unwrap();

        let stats = db.get_referral_stats(&user.id).unwrap();
        assert_eq!(stats.total_referrals, 2);
        assert_eq!(stats.pending_referrals, 2);
        assert_eq!(stats.completed_referrals, 0);
        assert_eq!(stats.total_earnings, 0);
        assert_eq!(stats.referral_code, user.referral_code);
    }

    #[test]
    fn stats_for_unknown_user_fail() {
        let (db, _dir) = temp_db();
        assert!(matches!(
            db.get_referral_stats("missing"),
            Err(LedgerError::NotFound(_))
        ));
    }
}
