// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Elevate Learning

//! Course enrollments.
//!
//! An enrollment is only ever created by the payment-approval transaction
//! in the payments module; this module covers reads and progress updates.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::db::{pair_key, LedgerDb, LedgerError, LedgerResult, ENROLLMENTS, ENROLLMENT_IDX};

/// Enrollment state, derived from progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
}

/// A user's enrollment in a course.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredEnrollment {
    /// Unique enrollment identifier (UUID)
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    /// The approved payment request that created this enrollment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_request_id: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    /// Completion percentage, 0–100
    pub progress: u8,
    pub status: EnrollmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl LedgerDb {
    /// List a user's enrollments, newest first.
    pub fn list_user_enrollments(&self, user_id: &str) -> LedgerResult<Vec<StoredEnrollment>> {
        let read_txn = self.db.begin_read()?;
        let enrollments = read_txn.open_table(ENROLLMENTS)?;

        let mut results = Vec::new();
        for entry in enrollments.iter()? {
            let (_, value) = entry?;
            let enrollment: StoredEnrollment = serde_json::from_slice(value.value())?;
            if enrollment.user_id == user_id {
                results.push(enrollment);
            }
        }
        results.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(results)
    }

    /// Check whether a user is enrolled in a course.
    pub fn is_enrolled(&self, user_id: &str, course_id: &str) -> LedgerResult<bool> {
        let read_txn = self.db.begin_read()?;
        let enrollment_idx = read_txn.open_table(ENROLLMENT_IDX)?;
        Ok(enrollment_idx
            .get(pair_key(user_id, course_id).as_str())?
            .is_some())
    }

    /// Update an enrollment's progress.
    ///
    /// Progress caps at 100; reaching 100 marks the enrollment completed
    /// and stamps `completed_at`. The enrollment must belong to the caller.
    pub fn update_enrollment_progress(
        &self,
        user_id: &str,
        enrollment_id: &str,
        progress: u8,
    ) -> LedgerResult<StoredEnrollment> {
        if progress > 100 {
            return Err(LedgerError::Validation(
                "progress must be between 0 and 100".to_string(),
            ));
        }

        let write_txn = self.db.begin_write()?;
        let enrollment = {
            let mut enrollments = write_txn.open_table(ENROLLMENTS)?;

            let mut enrollment: StoredEnrollment = {
                let guard = enrollments.get(enrollment_id)?.ok_or_else(|| {
                    LedgerError::NotFound("Enrollment not found".to_string())
                })?;
                serde_json::from_slice(guard.value())?
            };
            if enrollment.user_id != user_id {
                return Err(LedgerError::NotFound("Enrollment not found".to_string()));
            }

            enrollment.progress = progress;
            if progress >= 100 {
                enrollment.status = EnrollmentStatus::Completed;
                if enrollment.completed_at.is_none() {
                    enrollment.completed_at = Some(Utc::now());
                }
            } else {
                enrollment.status = EnrollmentStatus::Active;
                enrollment.completed_at = None;
            }
            {
                let json = serde_json::to_vec(&enrollment)?;
                enrollments.insert(enrollment_id, json.as_slice())?;
            }
            enrollment
        };
        write_txn.commit()?;

        Ok(enrollment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::storage::{NewCourse, NewPaymentAccount, NewPaymentRequest, NewUser};

    fn temp_db() -> (LedgerDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = LedgerDb::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    /// Drive the real approval path to obtain an enrollment.
    fn enrolled_user(db: &LedgerDb) -> (String, String, String) {
        let user = db
            .create_user(NewUser {
                full_name: "Student".to_string(),
                email: "student@example.com".to_string(),
                password_hash: "$argon2id$stub".to_string(),
                referred_by: None,
                role: Role::Student,
            })
            .unwrap();
        let course = db
            .create_course(NewCourse {
                title: "Video Editing".to_string(),
                description: "Cuts and color".to_string(),
                price: 600,
                duration: "4 weeks".to_string(),
                level: "Intermediate".to_string(),
                image: None,
            })
            .unwrap();
        let account = db
            .create_payment_account(NewPaymentAccount {
                account_type: "CBE".to_string(),
                account_name: "Elevate Learning PLC".to_string(),
                account_number: "1000123456789".to_string(),
                bank_name: None,
                instructions: None,
                display_order: 0,
            })
            .unwrap();
        let request = db
            .create_payment_request(
                &user.id,
                NewPaymentRequest {
                    course_id: course.id.clone(),
                    payment_account_id: account.id,
                    amount: 600,
                    transaction_screenshot_url: "/uploads/shot.png".to_string(),
                    transaction_reference: None,
                },
            )
            .unwrap();
        let outcome = db
            .approve_payment_and_enroll(&request.id, "admin-1", None)
            .unwrap();
        (user.id, course.id, outcome.enrollment_id)
    }

    #[test]
    fn enrollment_exists_only_after_approval() {
        let (db, _dir) = temp_db();
        let (user_id, course_id, _) = enrolled_user(&db);

        assert!(db.is_enrolled(&user_id, &course_id).unwrap());
        assert!(!db.is_enrolled(&user_id, "other-course").unwrap());
    }

    #[test]
    fn progress_derives_status() {
        let (db, _dir) = temp_db();
        let (user_id, _, enrollment_id) = enrolled_user(&db);

        let halfway = db
            .update_enrollment_progress(&user_id, &enrollment_id, 50)
            .unwrap();
        assert_eq!(halfway.status, EnrollmentStatus::Active);
        assert!(halfway.completed_at.is_none());

        let done = db
            .update_enrollment_progress(&user_id, &enrollment_id, 100)
            .unwrap();
        assert_eq!(done.status, EnrollmentStatus::Completed);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn progress_over_100_is_rejected() {
        let (db, _dir) = temp_db();
        let (user_id, _, enrollment_id) = enrolled_user(&db);

        let result = db.update_enrollment_progress(&user_id, &enrollment_id, 101);
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn progress_update_enforces_ownership() {
        let (db, _dir) = temp_db();
        let (_, _, enrollment_id) = enrolled_user(&db);

        let result = db.update_enrollment_progress("someone-else", &enrollment_id, 10);
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }
}
