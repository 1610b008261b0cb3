// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wizard sessions driven against the real lifecycle service.

mod common;

use common::{complete_answers, form, harness, Harness};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use udmt_core::application::{
    ApplicationLifecycleService, GatewayError, LifecycleSettings, LocalApplicationGateway, SaveStatus,
    WizardController, WizardError, WizardSettings,
};
use udmt_core::domain::application::ApplicationStatus;
use udmt_core::domain::principal::Principal;
use udmt_core::domain::wizard::WizardStep;

fn settings() -> WizardSettings {
    WizardSettings {
        autosave_delay: Duration::from_millis(2000),
    }
}

fn wizard_for(h: &Harness, principal: &Principal) -> WizardController {
    let gateway = Arc::new(LocalApplicationGateway::new(h.service.clone(), principal.clone()));
    WizardController::new(gateway, settings())
}

async fn wait_until_saved(wizard: &WizardController) {
    for _ in 0..100 {
        if !wizard.has_unsaved_changes() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("autosave never completed");
}

#[tokio::test(start_paused = true)]
async fn test_full_session_saves_autosaves_and_submits() {
    let h = harness(LifecycleSettings::default()).await;
    let mut wizard = wizard_for(&h, &h.applicant_a);

    wizard
        .update_form_data(form(json!({ "projectName": "Green River" })))
        .unwrap();
    let created = wizard.save().await.unwrap();
    assert_eq!(wizard.application_id(), Some(created.id));
    assert_eq!(wizard.save_status(), SaveStatus::Saved);

    wizard.update_form_data(form(complete_answers())).unwrap();
    assert!(wizard.autosave_pending());
    assert!(wizard.has_unsaved_changes());

    tokio::time::sleep(Duration::from_millis(2100)).await;
    wait_until_saved(&wizard).await;

    let stored = h.service.get(&h.applicant_a, created.id).await.unwrap();
    assert_eq!(
        stored.application.form_data.project_name(),
        Some("Green River Diversion Telemetry")
    );

    let submitted = wizard.submit().await.unwrap();
    assert_eq!(submitted.status, ApplicationStatus::Submitted);
    assert!(wizard.is_read_only());
    assert!(matches!(
        wizard.update_form_data(form(json!({ "projectName": "Too late" }))),
        Err(WizardError::ReadOnly)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_produce_one_autosave() {
    let h = harness(LifecycleSettings::default()).await;
    let mut wizard = wizard_for(&h, &h.applicant_a);
    let created = wizard.save().await.unwrap();

    for name in ["G", "Gr", "Gre", "Green"] {
        wizard
            .update_form_data(form(json!({ "projectName": name })))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    tokio::time::sleep(Duration::from_millis(2000)).await;
    wait_until_saved(&wizard).await;

    let trail = h.service.audit_trail(&h.admin, created.id).await.unwrap();
    // created + one debounced update
    assert_eq!(trail.len(), 2);
    let stored = h.service.get(&h.applicant_a, created.id).await.unwrap();
    assert_eq!(stored.application.form_data.project_name(), Some("Green"));
}

#[tokio::test(start_paused = true)]
async fn test_submit_flushes_unsaved_edits() {
    let h = harness(LifecycleSettings {
        enforce_step_completion: true,
    })
    .await;
    let mut wizard = wizard_for(&h, &h.applicant_a);
    wizard.save().await.unwrap();

    wizard.update_form_data(form(complete_answers())).unwrap();
    let submitted = wizard.submit().await.unwrap();

    assert_eq!(submitted.status, ApplicationStatus::Submitted);
    assert!(submitted.form_data.project_name().is_some());
    assert!(!wizard.autosave_pending());
}

#[tokio::test]
async fn test_submit_refused_until_all_steps_complete() {
    let h = harness(LifecycleSettings::default()).await;
    let mut wizard = wizard_for(&h, &h.applicant_a);

    let err = wizard.submit().await.unwrap_err();
    match err {
        WizardError::Incomplete(steps) => {
            assert_eq!(steps.first(), Some(&WizardStep::Eligibility));
            assert!(!steps.contains(&WizardStep::Welcome));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    wizard.update_form_data(form(complete_answers())).unwrap();
    assert!(wizard.all_steps_complete());
    assert!(matches!(wizard.submit().await, Err(WizardError::NotSaved)));
}

#[tokio::test]
async fn test_navigation_is_gated_by_eligibility() {
    let h = harness(LifecycleSettings::default()).await;
    let mut wizard = wizard_for(&h, &h.applicant_a);

    assert_eq!(wizard.current_step(), WizardStep::Welcome);
    assert!(wizard.go_to_step(2));
    assert!(!wizard.go_to_step(5));
    assert_eq!(wizard.current_step(), WizardStep::Eligibility);
    assert!(!wizard.go_to_step(9));

    wizard
        .update_form_data(form(json!({ "eligibilityChecks": vec![true; 12] })))
        .unwrap();
    assert!(wizard.go_to_step(5));
    assert_eq!(wizard.current_step(), WizardStep::Location);
    assert_eq!(wizard.go_next(), WizardStep::WaterRights);
    assert_eq!(wizard.go_previous(), WizardStep::Location);
}

#[tokio::test]
async fn test_resume_submitted_application_is_read_only() {
    let h = harness(LifecycleSettings::default()).await;
    let app = h
        .service
        .create(&h.applicant_a, form(complete_answers()))
        .await
        .unwrap();
    let submitted = h.service.submit(&h.applicant_a, app.id).await.unwrap();

    let gateway = Arc::new(LocalApplicationGateway::new(h.service.clone(), h.applicant_a.clone()));
    let mut wizard = WizardController::resume(gateway, settings(), &submitted);

    assert!(wizard.is_read_only());
    assert!(wizard.all_steps_complete());
    assert!(matches!(wizard.save().await, Err(WizardError::ReadOnly)));
    assert!(matches!(wizard.submit().await, Err(WizardError::ReadOnly)));
}

#[tokio::test]
async fn test_save_failure_is_reported_on_status_channel() {
    let h = harness(LifecycleSettings::default()).await;
    let app = h.service.create(&h.applicant_a, form(json!({}))).await.unwrap();

    // Applicant B resumes A's draft: every write is refused
    let gateway = Arc::new(LocalApplicationGateway::new(h.service.clone(), h.applicant_b.clone()));
    let mut wizard = WizardController::resume(gateway, settings(), &app);
    wizard
        .update_form_data(form(json!({ "projectName": "Hijack" })))
        .unwrap();

    let err = wizard.save().await.unwrap_err();
    assert!(matches!(err, WizardError::Gateway(GatewayError::Forbidden(_))));
    assert!(matches!(wizard.save_status(), SaveStatus::Failed(_)));
    assert!(wizard.has_unsaved_changes());
}
