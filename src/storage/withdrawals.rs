// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Withdrawal requests against accumulated referral earnings.
//!
//! Submission checks the balance for early feedback only; the authoritative
//! check happens at approval time, in the same write transaction as the
//! debit, so the balance can never go below zero even under concurrent
//! approvals.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::db::{LedgerDb, LedgerError, LedgerResult, USERS, WITHDRAWALS};
use super::payments::PaymentStatus;
use super::users::StoredUser;

/// Minimum withdrawal amount in whole currency units (ETB).
pub const MIN_WITHDRAWAL_AMOUNT: u64 = 300;

/// A request to pay out accumulated earnings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredWithdrawal {
    /// Unique withdrawal identifier (UUID)
    pub id: String,
    pub user_id: String,
    /// Amount in whole currency units (ETB)
    pub amount: u64,
    /// Payout channel, e.g. "CBE" or "TeleBirr"
    pub account_type: String,
    pub account_number: String,
    pub account_holder_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
}

/// Input for submitting a withdrawal request.
#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub amount: u64,
    pub account_type: String,
    pub account_number: String,
    pub account_holder_name: String,
    pub phone_number: Option<String>,
}

impl LedgerDb {
    /// Submit a withdrawal request.
    ///
    /// The amount must meet the minimum and must not exceed the user's
    /// current balance. The balance check here is informational; the
    /// authoritative one re-runs at approval time.
    pub fn create_withdrawal(
        &self,
        user_id: &str,
        new_withdrawal: NewWithdrawal,
    ) -> LedgerResult<StoredWithdrawal> {
        if new_withdrawal.amount < MIN_WITHDRAWAL_AMOUNT {
            return Err(LedgerError::Validation(format!(
                "Minimum withdrawal amount is {MIN_WITHDRAWAL_AMOUNT} ETB"
            )));
        }

        let withdrawal = StoredWithdrawal {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount: new_withdrawal.amount,
            account_type: new_withdrawal.account_type,
            account_number: new_withdrawal.account_number,
            account_holder_name: new_withdrawal.account_holder_name,
            phone_number: new_withdrawal.phone_number,
            status: PaymentStatus::Pending,
            admin_notes: None,
            rejection_reason: None,
            created_at: Utc::now(),
            processed_at: None,
            processed_by: None,
        };

        let write_txn = self.db.begin_write()?;
        {
            let users = write_txn.open_table(USERS)?;
            let user: StoredUser = {
                let guard = users
                    .get(user_id)?
                    .ok_or_else(|| LedgerError::NotFound(format!("User {user_id}")))?;
                serde_json::from_slice(guard.value())?
            };
            if user.total_earnings < withdrawal.amount {
                return Err(LedgerError::InsufficientFunds {
                    available: user.total_earnings,
                    requested: withdrawal.amount,
                });
            }

            let mut withdrawals = write_txn.open_table(WITHDRAWALS)?;
            let json = serde_json::to_vec(&withdrawal)?;
            withdrawals.insert(withdrawal.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        tracing::info!(
            withdrawal_id = %withdrawal.id,
            user_id = %user_id,
            amount = withdrawal.amount,
            "withdrawal request submitted"
        );
        Ok(withdrawal)
    }

    /// Approve a withdrawal and debit the user's balance atomically.
    ///
    /// The balance is re-read inside the transaction; if it no longer
    /// covers the amount, the request is left pending (not auto-rejected)
    /// so the admin can retry later or reject explicitly.
    pub fn approve_withdrawal(
        &self,
        withdrawal_id: &str,
        admin_id: &str,
        admin_notes: Option<String>,
    ) -> LedgerResult<StoredWithdrawal> {
        let write_txn = self.db.begin_write()?;
        let withdrawal = {
            let mut withdrawals = write_txn.open_table(WITHDRAWALS)?;
            let mut users = write_txn.open_table(USERS)?;

            let mut withdrawal: StoredWithdrawal = {
                let guard = withdrawals.get(withdrawal_id)?.ok_or_else(|| {
                    LedgerError::NotFound("Withdrawal request not found".to_string())
                })?;
                serde_json::from_slice(guard.value())?
            };
            if withdrawal.status != PaymentStatus::Pending {
                return Err(LedgerError::Conflict(
                    "withdrawal request already processed".to_string(),
                ));
            }

            let mut user: StoredUser = {
                let guard = users.get(withdrawal.user_id.as_str())?.ok_or_else(|| {
                    LedgerError::NotFound(format!("User {}", withdrawal.user_id))
                })?;
                serde_json::from_slice(guard.value())?
            };

            // Authoritative balance check, paired with the debit in the
            // same transaction.
            if user.total_earnings < withdrawal.amount {
                return Err(LedgerError::InsufficientFunds {
                    available: user.total_earnings,
                    requested: withdrawal.amount,
                });
            }

            withdrawal.status = PaymentStatus::Approved;
            withdrawal.processed_at = Some(Utc::now());
            withdrawal.processed_by = Some(admin_id.to_string());
            withdrawal.admin_notes = admin_notes;
            {
                let json = serde_json::to_vec(&withdrawal)?;
                withdrawals.insert(withdrawal_id, json.as_slice())?;
            }

            user.total_earnings -= withdrawal.amount;
            {
                let json = serde_json::to_vec(&user)?;
                users.insert(user.id.as_str(), json.as_slice())?;
            }
            withdrawal
        };
        write_txn.commit()?;

        tracing::info!(
            withdrawal_id = %withdrawal_id,
            admin_id = %admin_id,
            amount = withdrawal.amount,
            "withdrawal approved and balance debited"
        );
        Ok(withdrawal)
    }

    /// Reject a pending withdrawal request. No balance change.
    pub fn reject_withdrawal(
        &self,
        withdrawal_id: &str,
        admin_id: &str,
        rejection_reason: &str,
    ) -> LedgerResult<StoredWithdrawal> {
        let write_txn = self.db.begin_write()?;
        let withdrawal = {
            let mut withdrawals = write_txn.open_table(WITHDRAWALS)?;

            let mut withdrawal: StoredWithdrawal = {
                let guard = withdrawals.get(withdrawal_id)?.ok_or_else(|| {
                    LedgerError::NotFound("Withdrawal request not found".to_string())
                })?;
                serde_json::from_slice(guard.value())?
            };
            if withdrawal.status != PaymentStatus::Pending {
                return Err(LedgerError::Conflict(
                    "withdrawal request already processed".to_string(),
                ));
            }

            withdrawal.status = PaymentStatus::Rejected;
            withdrawal.processed_at = Some(Utc::now());
            withdrawal.processed_by = Some(admin_id.to_string());
            withdrawal.rejection_reason = Some(rejection_reason.to_string());
            {
                let json = serde_json::to_vec(&withdrawal)?;
                withdrawals.insert(withdrawal_id, json.as_slice())?;
            }
            withdrawal
        };
        write_txn.commit()?;

        tracing::info!(withdrawal_id = %withdrawal_id, admin_id = %admin_id, "withdrawal rejected");
        Ok(withdrawal)
    }

    /// List one user's withdrawal requests, newest first.
    pub fn list_user_withdrawals(&self, user_id: &str) -> LedgerResult<Vec<StoredWithdrawal>> {
        let read_txn = self.db.begin_read()?;
        let withdrawals = read_txn.open_table(WITHDRAWALS)?;

        let mut results = Vec::new();
        for entry in withdrawals.iter()? {
            let (_, value) = entry?;
            let withdrawal: StoredWithdrawal = serde_json::from_slice(value.value())?;
            if withdrawal.user_id == user_id {
                results.push(withdrawal);
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// List withdrawal requests, newest first, optionally filtered by
    /// status. Admin view across all users.
    pub fn list_withdrawals(
        &self,
        status: Option<PaymentStatus>,
    ) -> LedgerResult<Vec<StoredWithdrawal>> {
        let read_txn = self.db.begin_read()?;
        let withdrawals = read_txn.open_table(WITHDRAWALS)?;

        let mut results = Vec::new();
        for entry in withdrawals.iter()? {
            let (_, value) = entry?;
            let withdrawal: StoredWithdrawal = serde_json::from_slice(value.value())?;
            if status.is_none_or(|s| withdrawal.status == s) {
                results.push(withdrawal);
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }
}
