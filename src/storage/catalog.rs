// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Course catalog and admin payment channels.
//!
//! Both are consumed read-only by the payment flow: a payment request
//! snapshots the course price and references the payment account the buyer
//! used. Creation endpoints exist so the catalog can be populated; full
//! management tooling lives outside this service.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::db::{LedgerDb, LedgerError, LedgerResult, COURSES, PAYMENT_ACCOUNTS};

/// A catalog course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredCourse {
    /// Unique course identifier (UUID)
    pub id: String,
    pub title: String,
    pub description: String,
    /// Price in whole currency units (ETB). Snapshotted into
    /// `StoredPaymentRequest.amount` at request time.
    pub price: u64,
    /// Human-readable duration, e.g. "6 weeks"
    pub duration: String,
    /// Difficulty level, e.g. "Beginner"
    pub level: String,
    /// Cover image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a course.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: u64,
    pub duration: String,
    pub level: String,
    pub image: Option<String>,
}

/// An admin-defined payment channel users pay into.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredPaymentAccount {
    /// Unique account identifier (UUID)
    pub id: String,
    /// Channel type, e.g. "CBE" or "TeleBirr"
    pub account_type: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    /// Payment instructions shown to the buyer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub is_active: bool,
    /// Sort order in the payment page
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a payment account.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPaymentAccount {
    pub account_type: String,
    pub account_name: String,
    pub account_number: String,
    pub bank_name: Option<String>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

impl LedgerDb {
    /// Create a new course.
    pub fn create_course(&self, new_course: NewCourse) -> LedgerResult<StoredCourse> {
        let now = Utc::now();
        let course = StoredCourse {
            id: uuid::Uuid::new_v4().to_string(),
            title: new_course.title,
            description: new_course.description,
            price: new_course.price,
            duration: new_course.duration,
            level: new_course.level,
            image: new_course.image,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut courses = write_txn.open_table(COURSES)?;
            let json = serde_json::to_vec(&course)?;
            courses.insert(course.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(course)
    }

    /// Look up a course by id.
    pub fn get_course(&self, course_id: &str) -> LedgerResult<StoredCourse> {
        let read_txn = self.db.begin_read()?;
        let courses = read_txn.open_table(COURSES)?;
        match courses.get(course_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(LedgerError::NotFound("Course not found".to_string())),
        }
    }

    /// List courses, newest first.
    pub fn list_courses(&self, active_only: bool) -> LedgerResult<Vec<StoredCourse>> {
        let read_txn = self.db.begin_read()?;
        let courses = read_txn.open_table(COURSES)?;

        let mut results = Vec::new();
        for entry in courses.iter()? {
            let (_, value) = entry?;
            let course: StoredCourse = serde_json::from_slice(value.value())?;
            if !active_only || course.is_active {
                results.push(course);
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// Create a new payment account.
    pub fn create_payment_account(
        &self,
        new_account: NewPaymentAccount,
    ) -> LedgerResult<StoredPaymentAccount> {
        let account = StoredPaymentAccount {
            id: uuid::Uuid::new_v4().to_string(),
            account_type: new_account.account_type,
            account_name: new_account.account_name,
            account_number: new_account.account_number,
            bank_name: new_account.bank_name,
            instructions: new_account.instructions,
            is_active: true,
            display_order: new_account.display_order,
            created_at: Utc::now(),
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut accounts = write_txn.open_table(PAYMENT_ACCOUNTS)?;
            let json = serde_json::to_vec(&account)?;
            accounts.insert(account.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;

        Ok(account)
    }

    /// Look up a payment account by id.
    pub fn get_payment_account(&self, account_id: &str) -> LedgerResult<StoredPaymentAccount> {
        let read_txn = self.db.begin_read()?;
        let accounts = read_txn.open_table(PAYMENT_ACCOUNTS)?;
        match accounts.get(account_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(LedgerError::NotFound("Payment account not found".to_string())),
        }
    }

    /// List payment accounts ordered by display_order.
    pub fn list_payment_accounts(&self, active_only: bool) -> LedgerResult<Vec<StoredPaymentAccount>> {
        let read_txn = self.db.begin_read()?;
        let accounts = read_txn.open_table(PAYMENT_ACCOUNTS)?;

        let mut results = Vec::new();
        for entry in accounts.iter()? {
            let (_, value) = entry?;
            let account: StoredPaymentAccount = serde_json::from_slice(value.value())?;
            if !active_only || account.is_active {
                results.push(account);
            }
        }
        results.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(results)
    }
}
