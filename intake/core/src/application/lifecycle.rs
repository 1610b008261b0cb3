// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application Lifecycle Service
//!
//! Application service owning the draft → submitted lifecycle of intake
//! applications.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Permission checks, state transitions and audit
//!   logging for one application per call
//! - **Collaborators:**
//!   - Domain: `Application` aggregate, `AccessPolicy` decision table
//!   - Infrastructure: `ApplicationRepository` (PostgreSQL or in-memory)
//!
//! # Flow (mutating operations)
//!
//! 1. Open a repository transaction
//! 2. Lock the application row (NotFound if absent)
//! 3. Evaluate the access policy (Forbidden unless owner or admin)
//! 4. Apply the transition on the aggregate (Conflict on illegal moves)
//! 5. Write the row and append the audit entry
//! 6. Commit; any earlier `?` drops the transaction and rolls back

use crate::domain::application::{
    Application, ApplicationError, ApplicationId, ApplicationPatch, ApplicationStatus,
    ApplicationWithOwner, NewApplication,
};
use crate::domain::attachment::{ApplicationFile, FileMetadata, NewApplicationFile};
use crate::domain::audit::{AuditEntry, NewAuditEntry};
use crate::domain::form_data::FormData;
use crate::domain::policy::{AccessPolicy, ApplicationAction, DenyReason, PolicyDecision};
use crate::domain::principal::{Principal, UserId};
use crate::domain::repository::{ApplicationRepository, RepositoryError};
use crate::domain::wizard::{StepCompletion, WizardStep};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Application not found")]
    NotFound,

    #[error("{}", .0.message())]
    Forbidden(DenyReason),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for LifecycleError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => LifecycleError::NotFound,
            other => LifecycleError::Repository(other),
        }
    }
}

impl From<ApplicationError> for LifecycleError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::UnknownStatus(_) => LifecycleError::Validation(err.to_string()),
            ApplicationError::AlreadySubmitted
            | ApplicationError::Locked
            | ApplicationError::StatusChangeNotAllowed => LifecycleError::Conflict(err.to_string()),
        }
    }
}

/// Tunables from the `lifecycle` config section.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleSettings {
    /// Refuse `submit` while any wizard step is incomplete.
    pub enforce_step_completion: bool,
}

/// Lifecycle operations on intake applications. Every call carries the
/// acting principal.
#[async_trait]
pub trait ApplicationLifecycleService: Send + Sync {
    /// Create a draft owned by `principal`.
    async fn create(&self, principal: &Principal, initial: FormData) -> Result<Application, LifecycleError>;

    async fn get(&self, principal: &Principal, id: ApplicationId) -> Result<ApplicationWithOwner, LifecycleError>;

    async fn list_own(&self, principal: &Principal) -> Result<Vec<Application>, LifecycleError>;

    /// Admin only.
    async fn list_all(
        &self,
        principal: &Principal,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithOwner>, LifecycleError>;

    async fn update(
        &self,
        principal: &Principal,
        id: ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, LifecycleError>;

    async fn submit(&self, principal: &Principal, id: ApplicationId) -> Result<Application, LifecycleError>;

    /// Hard delete in any status.
    async fn delete(&self, principal: &Principal, id: ApplicationId) -> Result<(), LifecycleError>;

    async fn attach_file(
        &self,
        principal: &Principal,
        id: ApplicationId,
        metadata: FileMetadata,
    ) -> Result<ApplicationFile, LifecycleError>;

    async fn list_files(&self, principal: &Principal, id: ApplicationId) -> Result<Vec<ApplicationFile>, LifecycleError>;

    /// Admin only. Oldest entry first.
    async fn audit_trail(&self, principal: &Principal, id: ApplicationId) -> Result<Vec<AuditEntry>, LifecycleError>;
}

pub struct StandardApplicationLifecycleService {
    repository: Arc<dyn ApplicationRepository>,
    policy: AccessPolicy,
    settings: LifecycleSettings,
}

impl StandardApplicationLifecycleService {
    pub fn new(repository: Arc<dyn ApplicationRepository>, settings: LifecycleSettings) -> Self {
        Self {
            repository,
            policy: AccessPolicy::new(),
            settings,
        }
    }

    fn authorize(
        &self,
        action: ApplicationAction,
        principal: &Principal,
        owner: Option<UserId>,
    ) -> Result<(), LifecycleError> {
        match self.policy.evaluate(action, principal, owner) {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(reason) => {
                warn!(
                    user_id = %principal.id,
                    action = %action,
                    reason = reason.label(),
                    "Lifecycle action denied"
                );
                metrics::counter!("udmt_lifecycle_denied_total", "reason" => reason.label()).increment(1);
                Err(LifecycleError::Forbidden(reason))
            }
        }
    }

    fn check_step_completion(&self, application: &Application) -> Result<(), LifecycleError> {
        if !self.settings.enforce_step_completion {
            return Ok(());
        }

        let incomplete = StepCompletion::evaluate(&application.form_data).incomplete_steps();
        if incomplete.is_empty() {
            return Ok(());
        }

        let names: Vec<&str> = incomplete.iter().map(|step: &WizardStep| step.display_name()).collect();
        Err(LifecycleError::Validation(format!(
            "Cannot submit: incomplete steps: {}",
            names.join(", ")
        )))
    }
}

#[async_trait]
impl ApplicationLifecycleService for StandardApplicationLifecycleService {
    async fn create(&self, principal: &Principal, initial: FormData) -> Result<Application, LifecycleError> {
        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let application = tx.insert(NewApplication::draft(principal.id, initial, now)).await?;
        tx.append_audit(NewAuditEntry::created(application.id, principal, now)).await?;
        tx.commit().await?;

        metrics::counter!("udmt_applications_created_total").increment(1);
        info!(application_id = %application.id, user_id = %principal.id, "Application created");
        Ok(application)
    }

    async fn get(&self, principal: &Principal, id: ApplicationId) -> Result<ApplicationWithOwner, LifecycleError> {
        let found = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound)?;

        self.authorize(ApplicationAction::Read, principal, Some(found.application.owner_id))?;
        Ok(found)
    }

    async fn list_own(&self, principal: &Principal) -> Result<Vec<Application>, LifecycleError> {
        let applications = self.repository.list_by_owner(principal.id).await?;
        debug!(user_id = %principal.id, count = applications.len(), "Listed own applications");
        Ok(applications)
    }

    async fn list_all(
        &self,
        principal: &Principal,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithOwner>, LifecycleError> {
        self.authorize(ApplicationAction::ListAll, principal, None)?;
        let applications = self.repository.list_all(status).await?;
        debug!(
            user_id = %principal.id,
            status = status.map(|s| s.as_str()).unwrap_or("any"),
            count = applications.len(),
            "Listed all applications"
        );
        Ok(applications)
    }

    async fn update(
        &self,
        principal: &Principal,
        id: ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, LifecycleError> {
        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let mut application = tx.lock(id).await?.ok_or(LifecycleError::NotFound)?;
        self.authorize(ApplicationAction::Update, principal, Some(application.owner_id))?;

        application.apply_patch(patch, principal, now)?;
        tx.save(&application).await?;
        tx.append_audit(NewAuditEntry::updated(id, principal, now)).await?;
        tx.commit().await?;

        metrics::counter!("udmt_applications_updated_total").increment(1);
        info!(application_id = %id, user_id = %principal.id, "Application updated");
        Ok(application)
    }

    async fn submit(&self, principal: &Principal, id: ApplicationId) -> Result<Application, LifecycleError> {
        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let mut application = tx.lock(id).await?.ok_or(LifecycleError::NotFound)?;
        self.authorize(ApplicationAction::Submit, principal, Some(application.owner_id))?;

        if application.is_submitted() {
            return Err(ApplicationError::AlreadySubmitted.into());
        }
        self.check_step_completion(&application)?;

        application.submit(now)?;
        tx.save(&application).await?;
        tx.append_audit(NewAuditEntry::submitted(id, principal, now)).await?;
        tx.commit().await?;

        metrics::counter!("udmt_applications_submitted_total").increment(1);
        info!(application_id = %id, user_id = %principal.id, "Application submitted");
        Ok(application)
    }

    async fn delete(&self, principal: &Principal, id: ApplicationId) -> Result<(), LifecycleError> {
        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let application = tx.lock(id).await?.ok_or(LifecycleError::NotFound)?;
        self.authorize(ApplicationAction::Delete, principal, Some(application.owner_id))?;

        tx.delete(id).await?;
        tx.append_audit(NewAuditEntry::deleted(id, principal, now)).await?;
        tx.commit().await?;

        metrics::counter!("udmt_applications_deleted_total").increment(1);
        info!(
            application_id = %id,
            user_id = %principal.id,
            status = application.status.as_str(),
            "Application deleted"
        );
        Ok(())
    }

    async fn attach_file(
        &self,
        principal: &Principal,
        id: ApplicationId,
        metadata: FileMetadata,
    ) -> Result<ApplicationFile, LifecycleError> {
        let now = Utc::now();
        let mut tx = self.repository.begin().await?;

        let mut application = tx.lock(id).await?.ok_or(LifecycleError::NotFound)?;
        self.authorize(ApplicationAction::AttachFile, principal, Some(application.owner_id))?;

        if application.is_submitted() && !principal.is_admin() {
            return Err(ApplicationError::Locked.into());
        }
        if let Some(field) = metadata.missing_field() {
            return Err(LifecycleError::Validation(format!("Missing required file field: {}", field)));
        }

        let filename = metadata.filename.clone();
        let file = tx
            .attach_file(NewApplicationFile {
                application_id: id,
                metadata,
                upload_date: now,
            })
            .await?;
        application.touch(now);
        tx.save(&application).await?;
        tx.append_audit(NewAuditEntry::file_attached(id, principal, &filename, now)).await?;
        tx.commit().await?;

        info!(application_id = %id, user_id = %principal.id, file_id = file.id, "File attached");
        Ok(file)
    }

    async fn list_files(&self, principal: &Principal, id: ApplicationId) -> Result<Vec<ApplicationFile>, LifecycleError> {
        let found = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(LifecycleError::NotFound)?;
        self.authorize(ApplicationAction::Read, principal, Some(found.application.owner_id))?;

        Ok(self.repository.list_files(id).await?)
    }

    async fn audit_trail(&self, principal: &Principal, id: ApplicationId) -> Result<Vec<AuditEntry>, LifecycleError> {
        self.authorize(ApplicationAction::ViewAudit, principal, None)?;

        if self.repository.find_by_id(id).await?.is_none() {
            return Err(LifecycleError::NotFound);
        }
        Ok(self.repository.audit_trail(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_errors_map_to_conflict() {
        for err in [
            ApplicationError::AlreadySubmitted,
            ApplicationError::Locked,
            ApplicationError::StatusChangeNotAllowed,
        ] {
            assert!(matches!(LifecycleError::from(err), LifecycleError::Conflict(_)));
        }
        assert!(matches!(
            LifecycleError::from(ApplicationError::UnknownStatus("archived".into())),
            LifecycleError::Validation(_)
        ));
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let err = LifecycleError::from(RepositoryError::NotFound("application 4".into()));
        assert!(matches!(err, LifecycleError::NotFound));

        let err = LifecycleError::from(RepositoryError::Database("connection reset".into()));
        assert!(matches!(err, LifecycleError::Repository(_)));
    }

    #[test]
    fn test_forbidden_message_comes_from_deny_reason() {
        assert_eq!(LifecycleError::Forbidden(DenyReason::NotOwner).to_string(), "Access denied");
        assert_eq!(
            LifecycleError::Forbidden(DenyReason::AdminOnly).to_string(),
            "Admin access required"
        );
    }
}
