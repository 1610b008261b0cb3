// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Append-only audit log. Entries are written in the same transaction as
//! the mutation they describe and are never updated afterwards.

use crate::domain::application::ApplicationId;
use crate::domain::principal::{Principal, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Updated,
    Submitted,
    Deleted,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Submitted => "submitted",
            AuditAction::Deleted => "deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown audit action: {0}")]
pub struct UnknownAuditAction(pub String);

impl FromStr for AuditAction {
    type Err = UnknownAuditAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(AuditAction::Created),
            "updated" => Ok(AuditAction::Updated),
            "submitted" => Ok(AuditAction::Submitted),
            "deleted" => Ok(AuditAction::Deleted),
            other => Err(UnknownAuditAction(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    /// `None` once the application row is gone.
    pub application_id: Option<ApplicationId>,
    pub user_id: UserId,
    pub action: AuditAction,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub application_id: Option<ApplicationId>,
    pub user_id: UserId,
    pub action: AuditAction,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn created(application_id: ApplicationId, actor: &Principal, now: DateTime<Utc>) -> Self {
        Self::entry(Some(application_id), actor, AuditAction::Created, "Application created", now)
    }

    pub fn updated(application_id: ApplicationId, actor: &Principal, now: DateTime<Utc>) -> Self {
        let details = format!("Application updated by {}", actor.email);
        Self::entry(Some(application_id), actor, AuditAction::Updated, details, now)
    }

    pub fn file_attached(
        application_id: ApplicationId,
        actor: &Principal,
        filename: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let details = format!("File {} attached by {}", filename, actor.email);
        Self::entry(Some(application_id), actor, AuditAction::Updated, details, now)
    }

    pub fn submitted(application_id: ApplicationId, actor: &Principal, now: DateTime<Utc>) -> Self {
        Self::entry(Some(application_id), actor, AuditAction::Submitted, "Application submitted", now)
    }

    /// Written after the row is gone, so the reference is null and the id
    /// survives only in `details`.
    pub fn deleted(application_id: ApplicationId, actor: &Principal, now: DateTime<Utc>) -> Self {
        let details = format!("Application {} deleted by {}", application_id, actor.email);
        Self::entry(None, actor, AuditAction::Deleted, details, now)
    }

    fn entry(
        application_id: Option<ApplicationId>,
        actor: &Principal,
        action: AuditAction,
        details: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            application_id,
            user_id: actor.id,
            action,
            details: Some(details.into()),
            timestamp: now,
        }
    }

    pub fn into_entry(self, id: i64) -> AuditEntry {
        AuditEntry {
            id,
            application_id: self.application_id,
            user_id: self.user_id,
            action: self.action,
            details: self.details,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::principal::Role;

    #[test]
    fn test_updated_entry_names_the_actor() {
        let admin = Principal::new(UserId(1), "admin@example.com", Role::Admin);
        let entry = NewAuditEntry::updated(ApplicationId(3), &admin, Utc::now());
        assert_eq!(entry.action, AuditAction::Updated);
        assert_eq!(entry.user_id, UserId(1));
        assert!(entry.details.unwrap().contains("admin@example.com"));
    }

    #[test]
    fn test_deleted_entry_has_no_application_reference() {
        let user = Principal::new(UserId(2), "a@example.com", Role::User);
        let entry = NewAuditEntry::deleted(ApplicationId(9), &user, Utc::now());
        assert_eq!(entry.application_id, None);
        assert_eq!(entry.details.as_deref(), Some("Application 9 deleted by a@example.com"));
    }

    #[test]
    fn test_action_round_trips_through_text() {
        for action in [AuditAction::Created, AuditAction::Updated, AuditAction::Submitted, AuditAction::Deleted] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
    }
}
