// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Wizard Navigation Controller
//!
//! Session-side state of one applicant filling out the eight-step wizard:
//! the current step, the in-memory form, per-step completion flags and a
//! debounced autosave.
//!
//! Persistence goes through an [`ApplicationGateway`], which fronts the
//! lifecycle service either in-process ([`LocalApplicationGateway`]) or over
//! HTTP (the CLI client).
//!
//! ## Autosave
//!
//! Every form edit cancels the pending autosave and schedules a new one
//! (`autosave_delay`, 2 s by default). At most one timer is live per
//! controller. Once a timer has fired its persistence call runs to
//! completion; cancellation only ever stops timers that are still waiting.
//! Autosave failures are published on the save-status channel and left for
//! an explicit [`WizardController::save`].

use crate::application::lifecycle::{ApplicationLifecycleService, LifecycleError};
use crate::domain::application::{Application, ApplicationId, ApplicationPatch};
use crate::domain::config::WizardConfig;
use crate::domain::form_data::FormData;
use crate::domain::principal::Principal;
use crate::domain::wizard::{eligibility_satisfied, StepCompletion, WizardStep};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Remote persistence as seen from the wizard.
#[async_trait]
pub trait ApplicationGateway: Send + Sync {
    async fn create(&self, form_data: FormData) -> Result<Application, GatewayError>;

    async fn update(&self, id: ApplicationId, form_data: FormData) -> Result<Application, GatewayError>;

    async fn submit(&self, id: ApplicationId) -> Result<Application, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<LifecycleError> for GatewayError {
    fn from(err: LifecycleError) -> Self {
        let message = err.to_string();
        match err {
            LifecycleError::NotFound => GatewayError::NotFound(message),
            LifecycleError::Forbidden(_) => GatewayError::Forbidden(message),
            LifecycleError::Conflict(_) => GatewayError::Conflict(message),
            LifecycleError::Validation(_) => GatewayError::Validation(message),
            LifecycleError::Repository(_) => GatewayError::Unavailable(message),
        }
    }
}

/// Calls the lifecycle service directly on behalf of a fixed principal.
pub struct LocalApplicationGateway {
    service: Arc<dyn ApplicationLifecycleService>,
    principal: Principal,
}

impl LocalApplicationGateway {
    pub fn new(service: Arc<dyn ApplicationLifecycleService>, principal: Principal) -> Self {
        Self { service, principal }
    }
}

#[async_trait]
impl ApplicationGateway for LocalApplicationGateway {
    async fn create(&self, form_data: FormData) -> Result<Application, GatewayError> {
        Ok(self.service.create(&self.principal, form_data).await?)
    }

    async fn update(&self, id: ApplicationId, form_data: FormData) -> Result<Application, GatewayError> {
        Ok(self
            .service
            .update(&self.principal, id, ApplicationPatch::form_data(form_data))
            .await?)
    }

    async fn submit(&self, id: ApplicationId) -> Result<Application, GatewayError> {
        Ok(self.service.submit(&self.principal, id).await?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Failed(String),
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Application has been submitted and is read-only")]
    ReadOnly,

    #[error("Please complete all required steps before submitting: {}", step_list(.0))]
    Incomplete(Vec<WizardStep>),

    #[error("Please save the application before submitting")]
    NotSaved,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

fn step_list(steps: &[WizardStep]) -> String {
    steps.iter().map(|s| s.display_name()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, Copy)]
pub struct WizardSettings {
    pub autosave_delay: Duration,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_millis(2000),
        }
    }
}

impl From<&WizardConfig> for WizardSettings {
    fn from(config: &WizardConfig) -> Self {
        Self {
            autosave_delay: Duration::from_millis(config.autosave_delay_ms),
        }
    }
}

/// State shared between the controller and its autosave task.
struct Persistence {
    gateway: Arc<dyn ApplicationGateway>,
    status: watch::Sender<SaveStatus>,
    /// Serialises persistence calls of one session.
    in_flight: Mutex<()>,
    /// Highest form revision known to be stored.
    saved_revision: AtomicU64,
}

impl Persistence {
    async fn persist(
        &self,
        id: Option<ApplicationId>,
        form_data: FormData,
        revision: u64,
    ) -> Result<Application, GatewayError> {
        let _guard = self.in_flight.lock().await;
        self.persist_locked(id, form_data, revision).await
    }

    async fn autosave(&self, id: ApplicationId, form_data: FormData, revision: u64) {
        let _guard = self.in_flight.lock().await;

        // An explicit save got there first with the same or newer data
        if self.saved_revision.load(Ordering::SeqCst) >= revision {
            debug!(application_id = %id, revision, "Autosave superseded");
            return;
        }

        match self.persist_locked(Some(id), form_data, revision).await {
            Ok(_) => {
                metrics::counter!("udmt_autosaves_total", "outcome" => "success").increment(1);
                debug!(application_id = %id, revision, "Autosaved");
            }
            Err(err) => {
                metrics::counter!("udmt_autosaves_total", "outcome" => "failure").increment(1);
                warn!(application_id = %id, error = %err, "Autosave failed");
            }
        }
    }

    async fn persist_locked(
        &self,
        id: Option<ApplicationId>,
        form_data: FormData,
        revision: u64,
    ) -> Result<Application, GatewayError> {
        self.status.send_replace(SaveStatus::Saving);

        let result = match id {
            Some(id) => self.gateway.update(id, form_data).await,
            None => self.gateway.create(form_data).await,
        };

        match &result {
            Ok(_) => {
                self.saved_revision.fetch_max(revision, Ordering::SeqCst);
                self.status.send_replace(SaveStatus::Saved);
            }
            Err(err) => {
                self.status.send_replace(SaveStatus::Failed(err.to_string()));
            }
        }
        result
    }
}

struct PendingAutosave {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PendingAutosave {
    fn is_waiting(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

/// One wizard session.
///
/// Form edits spawn the autosave task, so the controller must be driven
/// from inside a Tokio runtime.
pub struct WizardController {
    persistence: Arc<Persistence>,
    settings: WizardSettings,
    current_step: WizardStep,
    form_data: FormData,
    completion: StepCompletion,
    application_id: Option<ApplicationId>,
    read_only: bool,
    revision: u64,
    autosave: Option<PendingAutosave>,
}

impl WizardController {
    /// Fresh wizard for an application that does not exist yet.
    pub fn new(gateway: Arc<dyn ApplicationGateway>, settings: WizardSettings) -> Self {
        Self::build(gateway, settings, None, FormData::new(), false)
    }

    /// Continue editing a stored application. Submitted applications open
    /// read-only.
    pub fn resume(gateway: Arc<dyn ApplicationGateway>, settings: WizardSettings, application: &Application) -> Self {
        Self::build(
            gateway,
            settings,
            Some(application.id),
            application.form_data.clone(),
            application.is_submitted(),
        )
    }

    fn build(
        gateway: Arc<dyn ApplicationGateway>,
        settings: WizardSettings,
        application_id: Option<ApplicationId>,
        form_data: FormData,
        read_only: bool,
    ) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            persistence: Arc::new(Persistence {
                gateway,
                status,
                in_flight: Mutex::new(()),
                saved_revision: AtomicU64::new(0),
            }),
            settings,
            current_step: WizardStep::FIRST,
            completion: StepCompletion::evaluate(&form_data),
            form_data,
            application_id,
            read_only,
            revision: 0,
            autosave: None,
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn completion(&self) -> StepCompletion {
        self.completion
    }

    pub fn all_steps_complete(&self) -> bool {
        self.completion.all_complete()
    }

    pub fn application_id(&self) -> Option<ApplicationId> {
        self.application_id
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn save_status(&self) -> SaveStatus {
        self.persistence.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.persistence.status.subscribe()
    }

    /// Edits not yet confirmed by storage.
    pub fn has_unsaved_changes(&self) -> bool {
        self.revision > self.persistence.saved_revision.load(Ordering::SeqCst)
    }

    /// Whether an autosave timer is still counting down.
    pub fn autosave_pending(&self) -> bool {
        self.autosave.as_ref().is_some_and(PendingAutosave::is_waiting)
    }

    pub fn can_navigate_to(&self, step: WizardStep) -> bool {
        step.is_always_reachable() || eligibility_satisfied(&self.form_data)
    }

    pub fn go_next(&mut self) -> WizardStep {
        self.current_step = self.current_step.next();
        self.current_step
    }

    pub fn go_previous(&mut self) -> WizardStep {
        self.current_step = self.current_step.previous();
        self.current_step
    }

    /// Jump to step `ordinal`. Returns `false` and stays put when the step
    /// does not exist or is gated behind the eligibility checklist.
    pub fn go_to_step(&mut self, ordinal: u8) -> bool {
        match WizardStep::from_ordinal(ordinal) {
            Some(step) if self.can_navigate_to(step) => {
                self.current_step = step;
                true
            }
            _ => {
                debug!(ordinal, current = self.current_step.ordinal(), "Navigation refused");
                false
            }
        }
    }

    /// Shallow-merge `partial` into the form, re-score every step and
    /// restart the autosave timer.
    pub fn update_form_data(&mut self, partial: FormData) -> Result<(), WizardError> {
        if self.read_only {
            return Err(WizardError::ReadOnly);
        }

        self.form_data.merge(partial);
        self.completion = StepCompletion::evaluate(&self.form_data);
        self.revision += 1;
        self.schedule_autosave();
        Ok(())
    }

    /// Persist now. Creates the application on first save and adopts its id.
    pub async fn save(&mut self) -> Result<Application, WizardError> {
        if self.read_only {
            return Err(WizardError::ReadOnly);
        }
        self.cancel_autosave();

        let application = self
            .persistence
            .persist(self.application_id, self.form_data.clone(), self.revision)
            .await?;

        if self.application_id.is_none() {
            info!(application_id = %application.id, "Wizard adopted new application");
            self.application_id = Some(application.id);
        }
        Ok(application)
    }

    /// Submit once every step is complete and the application exists.
    /// Unsaved edits are written first. The wizard is read-only afterwards.
    pub async fn submit(&mut self) -> Result<Application, WizardError> {
        if self.read_only {
            return Err(WizardError::ReadOnly);
        }

        let incomplete = self.completion.incomplete_steps();
        if !incomplete.is_empty() {
            return Err(WizardError::Incomplete(incomplete));
        }

        let id = self.application_id.ok_or(WizardError::NotSaved)?;
        self.cancel_autosave();

        if self.has_unsaved_changes() {
            self.persistence
                .persist(Some(id), self.form_data.clone(), self.revision)
                .await?;
        }

        let application = self.persistence.gateway.submit(id).await?;
        self.read_only = true;
        info!(application_id = %id, "Wizard submitted application");
        Ok(application)
    }

    fn schedule_autosave(&mut self) {
        self.cancel_autosave();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let persistence = Arc::clone(&self.persistence);
        let delay = self.settings.autosave_delay;
        let id = self.application_id;
        let form_data = self.form_data.clone();
        let revision = self.revision;

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    match id {
                        Some(id) => persistence.autosave(id, form_data, revision).await,
                        None => debug!("No application id yet, skipping autosave"),
                    }
                }
            }
        });

        self.autosave = Some(PendingAutosave { cancel, task });
    }

    fn cancel_autosave(&mut self) {
        if let Some(pending) = self.autosave.take() {
            pending.cancel.cancel();
        }
    }
}

impl Drop for WizardController {
    fn drop(&mut self) {
        self.cancel_autosave();
    }
}
