// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Payment request lifecycle and the approval transaction.
//!
//! A payment request is a user's submitted proof-of-payment for a course,
//! pending admin adjudication. Approval is the only path that creates an
//! enrollment and the only path that credits referral earnings, and it
//! runs as a single write transaction:
//!
//! 1. re-read the request, which must still be pending
//! 2. mark it approved
//! 3. insert the enrollment
//! 4. if the buyer was referred: complete the referral ledger row, insert
//!    the earning audit record, credit the referrer's balance
//! 5. commit
//!
//! Any error before commit aborts the whole transaction, so a failed
//! approval leaves the request pending and retryable. Two concurrent
//! approvals of the same request cannot both succeed: write transactions
//! are serialized and the second one sees a non-pending status.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::catalog::StoredCourse;
use super::db::{
    pair_key, request_course_key, request_course_prefix, LedgerDb, LedgerError, LedgerResult,
    COURSES, ENROLLMENTS, ENROLLMENT_IDX, PAYMENT_ACCOUNTS, PAYMENT_COURSE_IDX, PAYMENT_REQUESTS,
    REFERRALS, REFERRAL_CODE_IDX, REFERRAL_EARNINGS, REFERRAL_MATCH_IDX, USERS,
};
use super::enrollments::{EnrollmentStatus, StoredEnrollment};
use super::referrals::{ReferralStatus, StoredReferral, StoredReferralEarning};
use super::users::{referral_match_key, StoredUser};

/// Referral bonus as a percentage of the course price at approval time.
pub const REFERRAL_BONUS_PERCENT: u64 = 10;

/// Lifecycle state of a payment or withdrawal request.
///
/// The only allowed transitions are pending → approved and
/// pending → rejected; both are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's submitted proof-of-payment for one course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredPaymentRequest {
    /// Unique request identifier (UUID)
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    /// Which admin-defined payment channel was used
    pub payment_account_id: String,
    /// Amount paid, in whole currency units (snapshot of the course price)
    pub amount: u64,
    /// URL of the uploaded transaction screenshot (external blob store)
    pub transaction_screenshot_url: String,
    /// User-provided bank/telecom reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<String>,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Admin who processed the request (set on both approve and reject)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for submitting a payment request.
#[derive(Debug, Clone)]
pub struct NewPaymentRequest {
    pub course_id: String,
    pub payment_account_id: String,
    pub amount: u64,
    pub transaction_screenshot_url: String,
    pub transaction_reference: Option<String>,
}

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalOutcome {
    pub enrollment_id: String,
    pub referral_bonus_awarded: bool,
    pub referral_amount: u64,
}

impl LedgerDb {
    /// Submit a payment request.
    ///
    /// The referenced course and payment account must exist, and the user
    /// must not already have a pending or approved request for the same
    /// course. Nothing moves here: no enrollment, no earnings.
    pub fn create_payment_request(
        &self,
        user_id: &str,
        new_request: NewPaymentRequest,
    ) -> LedgerResult<StoredPaymentRequest> {
        let now = Utc::now();
        let request = StoredPaymentRequest {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            course_id: new_request.course_id,
            payment_account_id: new_request.payment_account_id,
            amount: new_request.amount,
            transaction_screenshot_url: new_request.transaction_screenshot_url,
            transaction_reference: new_request.transaction_reference,
            status: PaymentStatus::Pending,
            admin_notes: None,
            rejection_reason: None,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };

        let write_txn = self.db.begin_write()?;
        {
            let courses = write_txn.open_table(COURSES)?;
            if courses.get(request.course_id.as_str())?.is_none() {
                return Err(LedgerError::NotFound("Course not found".to_string()));
            }

            let accounts = write_txn.open_table(PAYMENT_ACCOUNTS)?;
            if accounts.get(request.payment_account_id.as_str())?.is_none() {
                return Err(LedgerError::NotFound("Payment account not found".to_string()));
            }

            let mut requests = write_txn.open_table(PAYMENT_REQUESTS)?;
            let mut request_idx = write_txn.open_table(PAYMENT_COURSE_IDX)?;

            // Duplicate guard: at most one request per (user, course) may be
            // pending or approved at a time.
            let prefix = request_course_prefix(user_id, &request.course_id);
            let mut existing_status: Option<&'static str> = None;
            {
                for entry in request_idx.range(prefix.as_str()..)? {
                    let (key, value) = entry?;
                    if !key.value().starts_with(prefix.as_str()) {
                        break;
                    }
                    match value.value() {
                        "pending" => existing_status = Some("pending"),
                        "approved" => existing_status = Some("approved"),
                        _ => continue,
                    }
                    break;
                }
            }
            if let Some(status) = existing_status {
                return Err(LedgerError::Conflict(format!(
                    "you already have a {status} payment request for this course"
                )));
            }

            let json = serde_json::to_vec(&request)?;
            requests.insert(request.id.as_str(), json.as_slice())?;
            request_idx.insert(
                request_course_key(user_id, &request.course_id, &request.id).as_str(),
                request.status.as_str(),
            )?;
        }
        write_txn.commit()?;

        tracing::info!(
            request_id = %request.id,
            user_id = %user_id,
            course_id = %request.course_id,
            amount = request.amount,
            "payment request submitted"
        );
        Ok(request)
    }

    /// Approve a payment request, enroll the buyer, and distribute any
    /// referral bonus, all in one atomic transaction.
    ///
    /// Only a pending request can be approved; anything else fails with a
    /// conflict and changes nothing. The referral bonus is a percentage of
    /// the course's current price and is credited to the referrer exactly
    /// once, in the same transaction that approves the request. A referral
    /// code that no longer resolves skips the bonus without failing the
    /// enrollment.
    pub fn approve_payment_and_enroll(
        &self,
        request_id: &str,
        admin_id: &str,
        admin_notes: Option<String>,
    ) -> LedgerResult<ApprovalOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut requests = write_txn.open_table(PAYMENT_REQUESTS)?;
            let mut request_idx = write_txn.open_table(PAYMENT_COURSE_IDX)?;
            let mut users = write_txn.open_table(USERS)?;
            let courses = write_txn.open_table(COURSES)?;
            let mut enrollments = write_txn.open_table(ENROLLMENTS)?;
            let mut enrollment_idx = write_txn.open_table(ENROLLMENT_IDX)?;
            let mut referrals = write_txn.open_table(REFERRALS)?;
            let referral_match_idx = write_txn.open_table(REFERRAL_MATCH_IDX)?;
            let code_idx = write_txn.open_table(REFERRAL_CODE_IDX)?;
            let mut earnings = write_txn.open_table(REFERRAL_EARNINGS)?;

            let already_processed =
                || LedgerError::Conflict("payment request not found or already processed".to_string());

            // 1. Re-read the request; it must still be pending. Because
            // write transactions are serialized, this check cannot race a
            // concurrent approval.
            let mut request: StoredPaymentRequest = {
                let guard = requests.get(request_id)?.ok_or_else(already_processed)?;
                serde_json::from_slice(guard.value())?
            };
            if request.status != PaymentStatus::Pending {
                return Err(already_processed());
            }

            let user: StoredUser = {
                let guard = users
                    .get(request.user_id.as_str())?
                    .ok_or_else(already_processed)?;
                serde_json::from_slice(guard.value())?
            };
            let course: StoredCourse = {
                let guard = courses
                    .get(request.course_id.as_str())?
                    .ok_or_else(already_processed)?;
                serde_json::from_slice(guard.value())?
            };

            let now = Utc::now();

            // 2. Transition the request to approved.
            request.status = PaymentStatus::Approved;
            request.approved_by = Some(admin_id.to_string());
            request.approved_at = Some(now);
            request.admin_notes = admin_notes;
            request.updated_at = now;
            {
                let json = serde_json::to_vec(&request)?;
                requests.insert(request_id, json.as_slice())?;
            }
            request_idx.insert(
                request_course_key(&request.user_id, &request.course_id, request_id).as_str(),
                request.status.as_str(),
            )?;

            // 3. Create the enrollment. Its uniqueness per (user, course)
            // is enforced here, not just by the duplicate-request guard.
            let enrollment_key = pair_key(&request.user_id, &request.course_id);
            if enrollment_idx.get(enrollment_key.as_str())?.is_some() {
                return Err(LedgerError::Conflict(
                    "user is already enrolled in this course".to_string(),
                ));
            }
            let enrollment = StoredEnrollment {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: request.user_id.clone(),
                course_id: request.course_id.clone(),
                payment_request_id: Some(request_id.to_string()),
                enrolled_at: now,
                progress: 0,
                status: EnrollmentStatus::Active,
                completed_at: None,
            };
            {
                let json = serde_json::to_vec(&enrollment)?;
                enrollments.insert(enrollment.id.as_str(), json.as_slice())?;
            }
            enrollment_idx.insert(enrollment_key.as_str(), enrollment.id.as_str())?;

            // 4. Referral bonus, if the buyer was referred and the code
            // still resolves.
            let mut referral_bonus_awarded = false;
            let mut referral_amount = 0u64;
            if let Some(ref code) = user.referred_by {
                let referrer_id = code_idx.get(code.as_str())?.map(|v| v.value().to_string());
                match referrer_id {
                    None => {
                        // Enrollment must not fail because the referrer is
                        // gone; the bonus is simply never paid.
                        tracing::warn!(
                            request_id = %request_id,
                            referral_code = %code,
                            "referral code no longer resolves, skipping bonus"
                        );
                    }
                    Some(referrer_id) => {
                        referral_amount = course.price * REFERRAL_BONUS_PERCENT / 100;

                        // Complete the matching ledger row, pending → completed
                        // at most once.
                        let match_key = referral_match_key(&referrer_id, &user.email);
                        let referral_id = referral_match_idx
                            .get(match_key.as_str())?
                            .map(|v| v.value().to_string());
                        if let Some(referral_id) = referral_id {
                            let mut referral: StoredReferral = {
                                let guard = referrals.get(referral_id.as_str())?.ok_or_else(|| {
                                    LedgerError::NotFound(format!("Referral {referral_id}"))
                                })?;
                                serde_json::from_slice(guard.value())?
                            };
                            if referral.status == ReferralStatus::Pending {
                                referral.status = ReferralStatus::Completed;
                                referral.reward_earned = referral_amount;
                                referral.payment_request_id = Some(request_id.to_string());
                                let json = serde_json::to_vec(&referral)?;
                                referrals.insert(referral_id.as_str(), json.as_slice())?;
                            }
                        }

                        // Durable audit record of the payout.
                        let earning = StoredReferralEarning {
                            id: uuid::Uuid::new_v4().to_string(),
                            referrer_id: referrer_id.clone(),
                            referred_user_id: user.id.clone(),
                            enrollment_id: enrollment.id.clone(),
                            course_id: course.id.clone(),
                            bonus_amount: referral_amount,
                            status: ReferralStatus::Completed,
                            created_at: now,
                        };
                        {
                            let json = serde_json::to_vec(&earning)?;
                            earnings.insert(earning.id.as_str(), json.as_slice())?;
                        }

                        // Credit the referrer. The read-modify-write is safe
                        // because it happens inside this serialized write
                        // transaction.
                        let mut referrer: StoredUser = {
                            let guard = users.get(referrer_id.as_str())?.ok_or_else(|| {
                                LedgerError::NotFound(format!("User {referrer_id}"))
                            })?;
                            serde_json::from_slice(guard.value())?
                        };
                        referrer.total_earnings += referral_amount;
                        {
                            let json = serde_json::to_vec(&referrer)?;
                            users.insert(referrer.id.as_str(), json.as_slice())?;
                        }

                        referral_bonus_awarded = true;
                    }
                }
            }

            ApprovalOutcome {
                enrollment_id: enrollment.id,
                referral_bonus_awarded,
                referral_amount,
            }
        };
        write_txn.commit()?;

        tracing::info!(
            request_id = %request_id,
            admin_id = %admin_id,
            enrollment_id = %outcome.enrollment_id,
            referral_bonus_awarded = outcome.referral_bonus_awarded,
            referral_amount = outcome.referral_amount,
            "payment approved and user enrolled"
        );
        Ok(outcome)
    }

    /// Reject a pending payment request.
    ///
    /// Touches nothing but the request row. The non-empty reason is
    /// enforced at the API boundary.
    pub fn reject_payment_request(
        &self,
        request_id: &str,
        admin_id: &str,
        rejection_reason: &str,
    ) -> LedgerResult<StoredPaymentRequest> {
        let write_txn = self.db.begin_write()?;
        let request = {
            let mut requests = write_txn.open_table(PAYMENT_REQUESTS)?;
            let mut request_idx = write_txn.open_table(PAYMENT_COURSE_IDX)?;

            let mut request: StoredPaymentRequest = {
                let guard = requests.get(request_id)?.ok_or_else(|| {
                    LedgerError::NotFound("Payment request not found".to_string())
                })?;
                serde_json::from_slice(guard.value())?
            };
            if request.status != PaymentStatus::Pending {
                return Err(LedgerError::Conflict(
                    "payment request already processed".to_string(),
                ));
            }

            request.status = PaymentStatus::Rejected;
            request.approved_by = Some(admin_id.to_string());
            request.rejection_reason = Some(rejection_reason.to_string());
            request.updated_at = Utc::now();
            {
                let json = serde_json::to_vec(&request)?;
                requests.insert(request_id, json.as_slice())?;
            }
            request_idx.insert(
                request_course_key(&request.user_id, &request.course_id, request_id).as_str(),
                request.status.as_str(),
            )?;
            request
        };
        write_txn.commit()?;

        tracing::info!(request_id = %request_id, admin_id = %admin_id, "payment request rejected");
        Ok(request)
    }

    /// Look up a payment request by id.
    pub fn get_payment_request(&self, request_id: &str) -> LedgerResult<StoredPaymentRequest> {
        let read_txn = self.db.begin_read()?;
        let requests = read_txn.open_table(PAYMENT_REQUESTS)?;
        match requests.get(request_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(LedgerError::NotFound("Payment request not found".to_string())),
        }
    }

    /// List payment requests, newest first, optionally filtered by status.
    /// Admin view across all users.
    pub fn list_payment_requests(
        &self,
        status: Option<PaymentStatus>,
    ) -> LedgerResult<Vec<StoredPaymentRequest>> {
        let read_txn = self.db.begin_read()?;
        let requests = read_txn.open_table(PAYMENT_REQUESTS)?;

        let mut results = Vec::new();
        for entry in requests.iter()? {
            let (_, value) = entry?;
            let request: StoredPaymentRequest = serde_json::from_slice(value.value())?;
            if status.is_none_or(|s| request.status == s) {
                results.push(request);
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// List one user's payment requests, newest first.
    pub fn list_user_payment_requests(
        &self,
        user_id: &str,
    ) -> LedgerResult<Vec<StoredPaymentRequest>> {
        let read_txn = self.db.begin_read()?;
        let requests = read_txn.open_table(PAYMENT_REQUESTS)?;

        let mut results = Vec::new();
        for entry in requests.iter()? {
            let (_, value) = entry?;
            let request: StoredPaymentRequest = serde_json::from_slice(value.value())?;
            if request.user_id == user_id {
                results.push(request);
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }
}
