// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! # API Data Models
//!
//! Request and response data structures used by the REST API. All types
//! derive `Serialize`/`Deserialize` and `ToSchema` for automatic JSON
//! handling and OpenAPI documentation.
//!
//! Stored entities (payment requests, enrollments, referrals, withdrawals,
//! catalog entries) are returned directly from the storage layer; this
//! module holds the request bodies plus the responses that differ from
//! their stored shape. Most importantly [`UserResponse`], which never
//! carries the password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::StoredUser;

// =============================================================================
// Users
// =============================================================================

/// Request to register a new user account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name.
    pub full_name: String,
    /// Email address (unique, also the login identifier).
    pub email: String,
    /// Plaintext password; stored only as an Argon2id hash.
    pub password: String,
    /// Referral code of the user who referred this one, if any.
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// A user profile as returned by the API.
///
/// Deliberately omits the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    /// This user's own referral code to share.
    pub referral_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referred_by: Option<String>,
    pub role: Role,
    /// Accumulated referral earnings in whole currency units (ETB).
    pub total_earnings: u64,
    pub created_at: DateTime<Utc>,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            referral_code: user.referral_code,
            referred_by: user.referred_by,
            role: user.role,
            total_earnings: user.total_earnings,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

/// Request to submit a payment for a course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePaymentRequestBody {
    pub course_id: String,
    /// Which admin payment channel was paid into.
    pub payment_account_id: String,
    /// Amount paid, in whole currency units (the course price).
    pub amount: u64,
    /// URL of the uploaded transaction screenshot.
    pub transaction_screenshot_url: String,
    /// Bank/telecom transfer reference, if the user has one.
    #[serde(default)]
    pub transaction_reference: Option<String>,
}

/// Admin request to approve a payment or withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApproveRequestBody {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Admin request to reject a payment or withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RejectRequestBody {
    /// Why the request was rejected. Must be non-empty.
    pub rejection_reason: String,
}

/// Response for a successful payment approval.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApprovalResponse {
    pub message: String,
    /// The enrollment created by this approval.
    pub enrollment_id: String,
    /// Whether a referral bonus was paid out.
    pub referral_bonus_awarded: bool,
    /// The bonus amount, 0 when no bonus was paid.
    pub referral_amount: u64,
}

// =============================================================================
// Enrollments
// =============================================================================

/// Request to update course progress.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProgressRequest {
    /// Completion percentage, 0–100.
    pub progress: u8,
}

/// Response for an enrollment check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentCheckResponse {
    pub enrolled: bool,
}

// =============================================================================
// Referrals
// =============================================================================

/// Request to record a referred friend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReferralRequest {
    /// Email address the referred person will sign up with.
    pub email: String,
}

/// Response carrying the caller's referral code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReferralCodeResponse {
    pub referral_code: String,
}

// =============================================================================
// Withdrawals
// =============================================================================

/// Request to withdraw accumulated earnings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWithdrawalBody {
    /// Amount in whole currency units (ETB).
    pub amount: u64,
    /// Payout channel, e.g. "CBE" or "TeleBirr".
    pub account_type: String,
    pub account_number: String,
    pub account_holder_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}
