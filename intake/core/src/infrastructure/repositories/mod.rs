// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository ports defined in
//! [`crate::domain::repository`].
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve users, applications, file references
//!   and audit entries
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresUserRepository** / **PostgresApplicationRepository** -
//!   production storage; one `sqlx` transaction per lifecycle operation
//! - **InMemoryStore** - one store implementing both ports, used when no
//!   database URL is configured and in tests
//!
//! Both honour the same foreign-key rules: applications need an existing
//! owner, files cascade with their application and audit entries outlive
//! it with a null reference.

pub mod postgres_application;
pub mod postgres_user;

pub use postgres_application::PostgresApplicationRepository;
pub use postgres_user::PostgresUserRepository;

use crate::domain::application::{
    Application, ApplicationId, ApplicationStatus, ApplicationWithOwner, NewApplication,
};
use crate::domain::attachment::{ApplicationFile, NewApplicationFile};
use crate::domain::audit::{AuditEntry, NewAuditEntry};
use crate::domain::principal::UserId;
use crate::domain::repository::{
    ApplicationRepository, ApplicationTransaction, RepositoryError, UserRepository,
};
use crate::domain::user::{NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    applications: BTreeMap<ApplicationId, Application>,
    files: BTreeMap<i64, ApplicationFile>,
    audit_log: Vec<AuditEntry>,
    last_user_id: i64,
    last_application_id: i64,
    last_file_id: i64,
    last_audit_id: i64,
}

impl StoreState {
    fn with_owner(&self, application: &Application) -> Option<ApplicationWithOwner> {
        let owner = self.users.get(&application.owner_id)?;
        Some(ApplicationWithOwner {
            application: application.clone(),
            owner: owner.owner_summary(),
        })
    }

    fn require_user(&self, id: UserId) -> Result<(), RepositoryError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::Constraint(format!("user {} does not exist", id)))
        }
    }

    fn require_application(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        if self.applications.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::Constraint(format!("application {} does not exist", id)))
        }
    }
}

fn newest_first(a: &Application) -> (Reverse<DateTime<Utc>>, Reverse<ApplicationId>) {
    (Reverse(a.updated_at), Reverse(a.id))
}

/// Thread-safe in-memory storage for users and applications.
///
/// A transaction holds the store lock for its whole lifetime and works on a
/// staged copy; `commit` swaps the copy in, dropping discards it.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every audit entry in insertion order, including those whose
    /// application has since been deleted.
    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        self.state.lock().await.audit_log.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate(format!("email {} already registered", user.email)));
        }

        state.last_user_id += 1;
        let user = user.into_user(UserId(state.last_user_id));
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("user {}", id)))?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(self.state.lock().await.users.len() as i64)
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn ApplicationTransaction>, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryTransaction { guard, staged }))
    }

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<ApplicationWithOwner>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.applications.get(&id).and_then(|a| state.with_owner(a)))
    }

    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Application>, RepositoryError> {
        let state = self.state.lock().await;
        let mut applications: Vec<Application> = state
            .applications
            .values()
            .filter(|a| a.owner_id == owner)
            .cloned()
            .collect();
        applications.sort_by_key(newest_first);
        Ok(applications)
    }

    async fn list_all(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithOwner>, RepositoryError> {
        let state = self.state.lock().await;
        let mut applications: Vec<&Application> = state
            .applications
            .values()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .collect();
        applications.sort_by_key(|a| newest_first(a));
        Ok(applications
            .into_iter()
            .filter_map(|a| state.with_owner(a))
            .collect())
    }

    async fn list_files(&self, id: ApplicationId) -> Result<Vec<ApplicationFile>, RepositoryError> {
        let state = self.state.lock().await;
        let mut files: Vec<ApplicationFile> = state
            .files
            .values()
            .filter(|f| f.application_id == id)
            .cloned()
            .collect();
        files.sort_by_key(|f| (f.upload_date, f.id));
        Ok(files)
    }

    async fn audit_trail(&self, id: ApplicationId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .audit_log
            .iter()
            .filter(|e| e.application_id == Some(id))
            .cloned()
            .collect())
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
}

#[async_trait]
impl ApplicationTransaction for InMemoryTransaction {
    async fn insert(&mut self, application: NewApplication) -> Result<Application, RepositoryError> {
        self.staged.require_user(application.owner_id)?;

        self.staged.last_application_id += 1;
        let application = application.into_application(ApplicationId(self.staged.last_application_id));
        self.staged.applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn lock(&mut self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.staged.applications.get(&id).cloned())
    }

    async fn save(&mut self, application: &Application) -> Result<(), RepositoryError> {
        let slot = self
            .staged
            .applications
            .get_mut(&application.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("application {}", application.id)))?;
        *slot = application.clone();
        Ok(())
    }

    async fn delete(&mut self, id: ApplicationId) -> Result<(), RepositoryError> {
        if self.staged.applications.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("application {}", id)));
        }

        self.staged.files.retain(|_, f| f.application_id != id);
        for entry in self.staged.audit_log.iter_mut().filter(|e| e.application_id == Some(id)) {
            entry.application_id = None;
        }
        Ok(())
    }

    async fn attach_file(&mut self, file: NewApplicationFile) -> Result<ApplicationFile, RepositoryError> {
        self.staged.require_application(file.application_id)?;

        self.staged.last_file_id += 1;
        let file = file.into_file(self.staged.last_file_id);
        self.staged.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn append_audit(&mut self, entry: NewAuditEntry) -> Result<AuditEntry, RepositoryError> {
        self.staged.require_user(entry.user_id)?;
        if let Some(application_id) = entry.application_id {
            self.staged.require_application(application_id)?;
        }

        self.staged.last_audit_id += 1;
        let entry = entry.into_entry(self.staged.last_audit_id);
        self.staged.audit_log.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attachment::FileMetadata;
    use crate::domain::form_data::FormData;
    use crate::domain::principal::{Principal, Role};

    async fn store_with_user() -> (InMemoryStore, User) {
        let store = InMemoryStore::new();
        let user = UserRepository::insert(
            &store,
            NewUser {
                email: "applicantA@example.com".to_string(),
                name: "Applicant A".to_string(),
                role: Role::User,
                password_hash: "x".to_string(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        (store, user)
    }

    async fn create_draft(store: &InMemoryStore, owner: UserId) -> Application {
        let mut tx = store.begin().await.unwrap();
        let app = tx
            .insert(NewApplication::draft(owner, FormData::new(), Utc::now()))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (store, user) = store_with_user().await;
        let err = UserRepository::insert(
            &store,
            NewUser {
                email: user.email.clone(),
                name: "Again".to_string(),
                role: Role::User,
                password_hash: "y".to_string(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let (store, user) = store_with_user().await;
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert(NewApplication::draft(user.id, FormData::new(), Utc::now()))
                .await
                .unwrap();
        }
        assert!(store.list_by_owner(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_requires_existing_owner() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx
            .insert(NewApplication::draft(UserId(99), FormData::new(), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_files_and_nulls_audit() {
        let (store, user) = store_with_user().await;
        let actor = Principal::new(user.id, user.email.clone(), user.role);
        let app = create_draft(&store, user.id).await;

        let mut tx = store.begin().await.unwrap();
        tx.append_audit(NewAuditEntry::created(app.id, &actor, Utc::now())).await.unwrap();
        tx.attach_file(NewApplicationFile {
            application_id: app.id,
            metadata: FileMetadata {
                filename: "site.jpg".to_string(),
                original_name: None,
                file_type: "image/jpeg".to_string(),
                file_category: Some("photo".to_string()),
                file_path: "/uploads/site.jpg".to_string(),
                file_size: Some(2048),
            },
            upload_date: Utc::now(),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.list_files(app.id).await.unwrap().len(), 1);

        let mut tx = store.begin().await.unwrap();
        tx.delete(app.id).await.unwrap();
        tx.append_audit(NewAuditEntry::deleted(app.id, &actor, Utc::now())).await.unwrap();
        tx.commit().await.unwrap();

        assert!(ApplicationRepository::find_by_id(&store, app.id).await.unwrap().is_none());
        assert!(store.list_files(app.id).await.unwrap().is_empty());
        assert!(store.audit_trail(app.id).await.unwrap().is_empty());

        let state = store.state.lock().await;
        assert_eq!(state.audit_log.len(), 2);
        assert!(state.audit_log.iter().all(|e| e.application_id.is_none()));
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_filterable() {
        let (store, user) = store_with_user().await;
        let first = create_draft(&store, user.id).await;
        let second = create_draft(&store, user.id).await;

        let mut tx = store.begin().await.unwrap();
        let mut touched = tx.lock(first.id).await.unwrap().unwrap();
        touched.submit(Utc::now() + chrono::Duration::seconds(10)).unwrap();
        tx.save(&touched).await.unwrap();
        tx.commit().await.unwrap();

        let own = store.list_by_owner(user.id).await.unwrap();
        assert_eq!(own.iter().map(|a| a.id).collect::<Vec<_>>(), vec![first.id, second.id]);

        let submitted = store.list_all(Some(ApplicationStatus::Submitted)).await.unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].owner.email, "applicantA@example.com");
        assert_eq!(store.list_all(None).await.unwrap().len(), 2);
    }
}
