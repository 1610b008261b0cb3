// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Application Aggregate
//!
//! One measurement-device application and its draft → submitted state
//! machine.
//!
//! ## Invariants
//!
//! - `submitted_at` is `Some` if and only if `status == Submitted`.
//! - `owner_id` is fixed at creation.
//! - A submitted application can only be changed by an administrator.
//!
//! Permission checks (who may touch which application) are not part of the
//! aggregate; see [`crate::domain::policy`].

use crate::domain::form_data::FormData;
use crate::domain::principal::{Principal, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub i64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            other => Err(ApplicationError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("Application already submitted")]
    AlreadySubmitted,

    #[error("Cannot edit submitted application")]
    Locked,

    #[error("Status can only be changed through submit")]
    StatusChangeNotAllowed,

    #[error("Unknown application status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
    pub status: ApplicationStatus,
    pub form_data: FormData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// A draft that has not been assigned an id by storage yet.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub owner_id: UserId,
    pub form_data: FormData,
    pub created_at: DateTime<Utc>,
}

impl NewApplication {
    pub fn draft(owner_id: UserId, form_data: FormData, now: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            form_data,
            created_at: now,
        }
    }

    /// Materialise the draft once storage has picked an id.
    pub fn into_application(self, id: ApplicationId) -> Application {
        Application {
            id,
            owner_id: self.owner_id,
            status: ApplicationStatus::Draft,
            form_data: self.form_data,
            created_at: self.created_at,
            updated_at: self.created_at,
            submitted_at: None,
        }
    }
}

/// Merge-patch for [`Application::apply_patch`]. Absent fields are left as
/// they are; `form_data` replaces the stored form wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<FormData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
}

impl ApplicationPatch {
    pub fn form_data(form_data: FormData) -> Self {
        Self {
            form_data: Some(form_data),
            status: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.form_data.is_none() && self.status.is_none()
    }
}

impl Application {
    pub fn is_submitted(&self) -> bool {
        self.status == ApplicationStatus::Submitted
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }

    /// Apply a merge-patch on behalf of `actor`. `updated_at` moves even when
    /// the patch is empty.
    ///
    /// Non-admins may only edit drafts and may not move the status at all
    /// (that is what `submit` is for). Admins may reopen a submitted
    /// application or mark a draft submitted; `submitted_at` follows the
    /// status either way.
    pub fn apply_patch(
        &mut self,
        patch: ApplicationPatch,
        actor: &Principal,
        now: DateTime<Utc>,
    ) -> Result<(), ApplicationError> {
        if self.is_submitted() && !actor.is_admin() {
            return Err(ApplicationError::Locked);
        }

        if let Some(status) = patch.status {
            if status != self.status {
                if !actor.is_admin() {
                    return Err(ApplicationError::StatusChangeNotAllowed);
                }
                self.set_status(status, now);
            }
        }

        if let Some(form_data) = patch.form_data {
            self.form_data = form_data;
        }

        self.updated_at = now;
        Ok(())
    }

    /// Draft → Submitted. Only ever succeeds once.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), ApplicationError> {
        if self.is_submitted() {
            return Err(ApplicationError::AlreadySubmitted);
        }
        self.set_status(ApplicationStatus::Submitted, now);
        self.updated_at = now;
        Ok(())
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn set_status(&mut self, status: ApplicationStatus, now: DateTime<Utc>) {
        self.status = status;
        self.submitted_at = match status {
            ApplicationStatus::Submitted => Some(now),
            ApplicationStatus::Draft => None,
        };
    }
}

/// Owner details joined onto an application for admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationWithOwner {
    #[serde(flatten)]
    pub application: Application,
    #[serde(rename = "user")]
    pub owner: OwnerSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::principal::Role;
    use chrono::Duration;
    use serde_json::json;

    fn owner() -> Principal {
        Principal::new(UserId(2), "applicantA@example.com", Role::User)
    }

    fn admin() -> Principal {
        Principal::new(UserId(1), "admin@example.com", Role::Admin)
    }

    fn draft() -> Application {
        NewApplication::draft(UserId(2), FormData::new(), Utc::now()).into_application(ApplicationId(7))
    }

    fn invariant_holds(app: &Application) -> bool {
        app.is_submitted() == app.submitted_at.is_some()
    }

    #[test]
    fn test_new_draft_has_no_submission_time() {
        let app = draft();
        assert_eq!(app.status, ApplicationStatus::Draft);
        assert_eq!(app.created_at, app.updated_at);
        assert!(invariant_holds(&app));
    }

    #[test]
    fn test_empty_patch_only_touches_updated_at() {
        let mut app = draft();
        let before = app.clone();
        let later = before.updated_at + Duration::seconds(5);

        app.apply_patch(ApplicationPatch::default(), &owner(), later).unwrap();

        assert_eq!(app.form_data, before.form_data);
        assert_eq!(app.status, before.status);
        assert_eq!(app.updated_at, later);
    }

    #[test]
    fn test_submit_twice_fails() {
        let mut app = draft();
        app.submit(Utc::now()).unwrap();
        assert!(invariant_holds(&app));
        assert_eq!(app.submit(Utc::now()), Err(ApplicationError::AlreadySubmitted));
        assert!(app.is_submitted());
    }

    #[test]
    fn test_submitted_application_is_locked_for_owner() {
        let mut app = draft();
        app.submit(Utc::now()).unwrap();

        let patch = ApplicationPatch::form_data(FormData::from_value(json!({"projectName": "X"})).unwrap());
        assert_eq!(app.apply_patch(patch.clone(), &owner(), Utc::now()), Err(ApplicationError::Locked));
        assert!(app.apply_patch(patch, &admin(), Utc::now()).is_ok());
        assert_eq!(app.form_data.project_name(), Some("X"));
    }

    #[test]
    fn test_owner_cannot_change_status_through_patch() {
        let mut app = draft();
        let patch = ApplicationPatch {
            form_data: None,
            status: Some(ApplicationStatus::Submitted),
        };
        assert_eq!(
            app.apply_patch(patch, &owner(), Utc::now()),
            Err(ApplicationError::StatusChangeNotAllowed)
        );
        assert_eq!(app.status, ApplicationStatus::Draft);
    }

    #[test]
    fn test_admin_status_change_keeps_submitted_at_in_sync() {
        let mut app = draft();
        let to_submitted = ApplicationPatch {
            form_data: None,
            status: Some(ApplicationStatus::Submitted),
        };
        app.apply_patch(to_submitted, &admin(), Utc::now()).unwrap();
        assert!(app.submitted_at.is_some());

        let reopen = ApplicationPatch {
            form_data: None,
            status: Some(ApplicationStatus::Draft),
        };
        app.apply_patch(reopen, &admin(), Utc::now()).unwrap();
        assert_eq!(app.status, ApplicationStatus::Draft);
        assert!(app.submitted_at.is_none());
    }

    #[test]
    fn test_serializes_with_wire_field_names() {
        let value = serde_json::to_value(draft()).unwrap();
        assert_eq!(value["user_id"], json!(2));
        assert_eq!(value["status"], json!("draft"));
        assert!(value["submitted_at"].is_null());
    }
}
