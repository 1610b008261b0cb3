// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Access Policy
//!
//! Every permission question the lifecycle service asks is answered by one
//! decision table: `(action, role, ownership) -> allow | deny`. State-based
//! refusals (editing a submitted application, submitting twice) are not
//! permissions and live on the aggregate instead.
//!
//! | Action | admin | owner | other user |
//! |--------|-------|-------|------------|
//! | Read, Update, Submit, Delete, AttachFile | allow | allow | deny |
//! | ListAll, ViewAudit | allow | deny | deny |

use crate::domain::principal::{Principal, Role, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationAction {
    Read,
    Update,
    Submit,
    Delete,
    AttachFile,
    ListAll,
    ViewAudit,
}

impl fmt::Display for ApplicationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplicationAction::Read => "read",
            ApplicationAction::Update => "update",
            ApplicationAction::Submit => "submit",
            ApplicationAction::Delete => "delete",
            ApplicationAction::AttachFile => "attach_file",
            ApplicationAction::ListAll => "list_all",
            ApplicationAction::ViewAudit => "view_audit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    Other,
}

impl Ownership {
    /// `owner` is `None` for actions that are not about a single record.
    pub fn of(principal: &Principal, owner: Option<UserId>) -> Self {
        match owner {
            Some(owner) if owner == principal.id => Ownership::Owner,
            _ => Ownership::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotOwner,
    AdminOnly,
}

impl DenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::NotOwner => "Access denied",
            DenyReason::AdminOnly => "Admin access required",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DenyReason::NotOwner => "not_owner",
            DenyReason::AdminOnly => "admin_only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    Deny(DenyReason),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allow)
    }
}

/// The decision table itself.
pub fn decide(action: ApplicationAction, role: Role, ownership: Ownership) -> PolicyDecision {
    use ApplicationAction::*;

    match (action, role, ownership) {
        (_, Role::Admin, _) => PolicyDecision::Allow,
        (ListAll | ViewAudit, Role::User, _) => PolicyDecision::Deny(DenyReason::AdminOnly),
        (Read | Update | Submit | Delete | AttachFile, Role::User, Ownership::Owner) => {
            PolicyDecision::Allow
        }
        (Read | Update | Submit | Delete | AttachFile, Role::User, Ownership::Other) => {
            PolicyDecision::Deny(DenyReason::NotOwner)
        }
    }
}

/// Stateless front door to [`decide`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        action: ApplicationAction,
        principal: &Principal,
        owner: Option<UserId>,
    ) -> PolicyDecision {
        decide(action, principal.role, Ownership::of(principal, owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD_ACTIONS: [ApplicationAction; 5] = [
        ApplicationAction::Read,
        ApplicationAction::Update,
        ApplicationAction::Submit,
        ApplicationAction::Delete,
        ApplicationAction::AttachFile,
    ];

    #[test]
    fn test_admin_is_allowed_everything() {
        for action in RECORD_ACTIONS.into_iter().chain([ApplicationAction::ListAll, ApplicationAction::ViewAudit]) {
            for ownership in [Ownership::Owner, Ownership::Other] {
                assert_eq!(decide(action, Role::Admin, ownership), PolicyDecision::Allow);
            }
        }
    }

    #[test]
    fn test_owner_may_touch_own_records() {
        for action in RECORD_ACTIONS {
            assert!(decide(action, Role::User, Ownership::Owner).is_allowed());
        }
    }

    #[test]
    fn test_other_user_is_denied_record_actions() {
        for action in RECORD_ACTIONS {
            assert_eq!(
                decide(action, Role::User, Ownership::Other),
                PolicyDecision::Deny(DenyReason::NotOwner)
            );
        }
    }

    #[test]
    fn test_admin_only_actions_deny_users_even_as_owner() {
        for action in [ApplicationAction::ListAll, ApplicationAction::ViewAudit] {
            assert_eq!(
                decide(action, Role::User, Ownership::Owner),
                PolicyDecision::Deny(DenyReason::AdminOnly)
            );
        }
    }

    #[test]
    fn test_ownership_is_derived_from_principal_id() {
        let principal = Principal::new(UserId(4), "u@example.com", Role::User);
        assert_eq!(Ownership::of(&principal, Some(UserId(4))), Ownership::Owner);
        assert_eq!(Ownership::of(&principal, Some(UserId(5))), Ownership::Other);
        assert_eq!(Ownership::of(&principal, None), Ownership::Other);
    }
}
