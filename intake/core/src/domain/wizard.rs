// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Wizard Steps
//!
//! The fixed eight-step catalog of the application wizard and the
//! completion predicate of every step. Predicates are pure and total: they
//! never fail, and anything missing simply reads as incomplete.
//!
//! Navigation gating lives in
//! [`crate::application::wizard::WizardController`]; this module only
//! answers "is step N complete for this form?".

use crate::domain::form_data::{fields, FormData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Number of attestations on the eligibility page.
pub const ELIGIBILITY_CHECK_COUNT: usize = 12;

/// Number of certifications on the review page.
pub const CERTIFICATION_COUNT: usize = 7;

/// `projectType` value selected for self-installed devices.
pub const SELF_INSTALL_PROJECT_TYPE: &str = "Self Install";

/// Legacy numeric code for the self-install project type.
const SELF_INSTALL_PROJECT_CODE: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Welcome,
    Eligibility,
    Applicant,
    Project,
    Location,
    WaterRights,
    SelfInstall,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 8] = [
        WizardStep::Welcome,
        WizardStep::Eligibility,
        WizardStep::Applicant,
        WizardStep::Project,
        WizardStep::Location,
        WizardStep::WaterRights,
        WizardStep::SelfInstall,
        WizardStep::Review,
    ];

    pub const FIRST: WizardStep = WizardStep::Welcome;
    pub const LAST: WizardStep = WizardStep::Review;

    /// 1-based position in the wizard.
    pub fn ordinal(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(usize::from(ordinal).checked_sub(1)?).copied()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            WizardStep::Welcome => "Welcome",
            WizardStep::Eligibility => "Eligibility",
            WizardStep::Applicant => "Applicant",
            WizardStep::Project => "Project",
            WizardStep::Location => "Location & Photos",
            WizardStep::WaterRights => "Water Rights",
            WizardStep::SelfInstall => "Self-Install",
            WizardStep::Review => "Review & Submit",
        }
    }

    /// Next step, clamped at the last one.
    pub fn next(self) -> Self {
        Self::from_ordinal(self.ordinal() + 1).unwrap_or(Self::LAST)
    }

    /// Previous step, clamped at the first one.
    pub fn previous(self) -> Self {
        self.ordinal()
            .checked_sub(1)
            .and_then(Self::from_ordinal)
            .unwrap_or(Self::FIRST)
    }

    /// Welcome and Eligibility can always be opened; everything after them
    /// waits for the eligibility checklist.
    pub fn is_always_reachable(self) -> bool {
        self <= WizardStep::Eligibility
    }

    pub fn is_complete(self, data: &FormData) -> bool {
        match self {
            WizardStep::Welcome => true,
            WizardStep::Eligibility => eligibility_satisfied(data),
            WizardStep::Applicant => applicant_complete(data),
            WizardStep::Project => {
                data.has_value(fields::PROJECT_TYPE)
                    && data.has_value(fields::PROJECT_NAME)
                    && data.has_value(fields::WATER_BODY_NAME)
            }
            WizardStep::Location => {
                data.has_value(fields::LATITUDE)
                    && data.has_value(fields::LONGITUDE)
                    && data.is_defined(fields::TRANSBASIN_DIVERSION)
            }
            WizardStep::WaterRights => {
                data.has_value(fields::WATER_RIGHT_NUMBER)
                    && data.has_value(fields::WATER_RIGHT_FLOW_RATE)
            }
            WizardStep::SelfInstall => self_install_complete(data),
            WizardStep::Review => {
                checklist_complete(data, fields::CERTIFICATIONS, CERTIFICATION_COUNT)
            }
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.ordinal(), self.display_name())
    }
}

/// Completion check by ordinal. Ordinals outside 1..=8 are never complete.
pub fn is_step_complete(ordinal: u8, data: &FormData) -> bool {
    WizardStep::from_ordinal(ordinal).is_some_and(|step| step.is_complete(data))
}

pub fn all_steps_complete(data: &FormData) -> bool {
    WizardStep::ALL.iter().all(|step| step.is_complete(data))
}

/// All twelve eligibility attestations are checked.
pub fn eligibility_satisfied(data: &FormData) -> bool {
    checklist_complete(data, fields::ELIGIBILITY_CHECKS, ELIGIBILITY_CHECK_COUNT)
}

fn checklist_complete(data: &FormData, key: &str, expected_len: usize) -> bool {
    data.checklist(key)
        .is_some_and(|checks| checks.len() == expected_len && checks.iter().all(|c| *c))
}

fn applicant_complete(data: &FormData) -> bool {
    use fields::contact;

    let Some(primary) = data.section(fields::PRIMARY_CONTACT) else {
        return false;
    };
    [contact::NAME, contact::PHONE, contact::MAILING_ADDRESS, contact::EMAIL]
        .iter()
        .all(|key| primary.get(*key).is_some_and(crate::domain::form_data::has_value))
}

fn self_install_complete(data: &FormData) -> bool {
    if !data.get(fields::PROJECT_TYPE).is_some_and(is_self_install) {
        return true;
    }
    let design_docs = data.is_defined(fields::HAS_DESIGN_DOCS)
        || data.is_defined(fields::HAS_DESIGN_DOCUMENTS);
    design_docs && data.is_defined(fields::HAS_COST_ESTIMATE)
}

fn is_self_install(project_type: &Value) -> bool {
    match project_type {
        Value::String(s) => {
            s == SELF_INSTALL_PROJECT_TYPE || s.parse::<i64>() == Ok(SELF_INSTALL_PROJECT_CODE)
        }
        Value::Number(n) => n.as_i64() == Some(SELF_INSTALL_PROJECT_CODE),
        _ => false,
    }
}

/// Completion flags for all eight steps, recomputed as a unit whenever the
/// form changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepCompletion([bool; 8]);

impl StepCompletion {
    pub fn evaluate(data: &FormData) -> Self {
        let mut flags = [false; 8];
        for (flag, step) in flags.iter_mut().zip(WizardStep::ALL) {
            *flag = step.is_complete(data);
        }
        Self(flags)
    }

    pub fn is_complete(&self, step: WizardStep) -> bool {
        self.0[usize::from(step.ordinal() - 1)]
    }

    pub fn all_complete(&self) -> bool {
        self.0.iter().all(|c| *c)
    }

    pub fn incomplete_steps(&self) -> Vec<WizardStep> {
        WizardStep::ALL
            .into_iter()
            .filter(|step| !self.is_complete(*step))
            .collect()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> FormData {
        FormData::from_value(value).unwrap()
    }

    fn complete_form() -> FormData {
        form(json!({
            "eligibilityChecks": vec![true; ELIGIBILITY_CHECK_COUNT],
            "primaryContact": {
                "name": "John Smith",
                "phone": "(435) 722-5555",
                "mailingAddress": "123 River Road, Roosevelt, UT 84066",
                "email": "applicantA@example.com"
            },
            "projectType": "New Installation",
            "projectName": "Green River Diversion Telemetry",
            "waterBodyName": "Green River",
            "latitude": 40.2991,
            "longitude": -109.9893,
            "transbasinDiversion": "no",
            "waterRightNumber": "WR-12345",
            "waterRightFlowRate": "25.5 CFS",
            "certifications": vec![true; CERTIFICATION_COUNT]
        }))
    }

    #[test]
    fn test_ordinals_round_trip_through_catalog() {
        for step in WizardStep::ALL {
            assert_eq!(WizardStep::from_ordinal(step.ordinal()), Some(step));
        }
        assert_eq!(WizardStep::from_ordinal(0), None);
        assert_eq!(WizardStep::from_ordinal(9), None);
    }

    #[test]
    fn test_next_and_previous_clamp() {
        assert_eq!(WizardStep::Review.next(), WizardStep::Review);
        assert_eq!(WizardStep::Welcome.previous(), WizardStep::Welcome);
        assert_eq!(WizardStep::Project.next(), WizardStep::Location);
        assert_eq!(WizardStep::Project.previous(), WizardStep::Applicant);
    }

    #[test]
    fn test_welcome_is_always_complete() {
        assert!(is_step_complete(1, &FormData::new()));
    }

    #[test]
    fn test_unknown_ordinals_are_incomplete() {
        let data = complete_form();
        assert!(!is_step_complete(0, &data));
        assert!(!is_step_complete(9, &data));
    }

    #[test]
    fn test_eligibility_requires_exactly_twelve_true_checks() {
        let all_true = form(json!({ "eligibilityChecks": vec![true; 12] }));
        assert!(is_step_complete(2, &all_true));

        let too_short = form(json!({ "eligibilityChecks": vec![true; 6] }));
        assert!(!is_step_complete(2, &too_short));

        let too_long = form(json!({ "eligibilityChecks": vec![true; 13] }));
        assert!(!is_step_complete(2, &too_long));

        let mut one_false = vec![true; 12];
        one_false[7] = false;
        let one_false = form(json!({ "eligibilityChecks": one_false }));
        assert!(!is_step_complete(2, &one_false));

        assert!(!is_step_complete(2, &FormData::new()));
    }

    #[test]
    fn test_applicant_requires_all_contact_fields() {
        let mut data = complete_form();
        assert!(is_step_complete(3, &data));

        data.insert(
            "primaryContact",
            json!({ "name": "John", "phone": "", "mailingAddress": "x", "email": "y" }),
        );
        assert!(!is_step_complete(3, &data));

        data.insert("primaryContact", json!("not an object"));
        assert!(!is_step_complete(3, &data));
    }

    #[test]
    fn test_project_requires_type_name_and_water_body() {
        let mut data = complete_form();
        assert!(is_step_complete(4, &data));
        data.insert("waterBodyName", json!(""));
        assert!(!is_step_complete(4, &data));
    }

    #[test]
    fn test_location_rejects_empty_string_transbasin() {
        let mut data = complete_form();
        assert!(is_step_complete(5, &data));

        data.insert("transbasinDiversion", json!(""));
        assert!(!is_step_complete(5, &data));

        data.insert("transbasinDiversion", json!(false));
        assert!(is_step_complete(5, &data));

        data.insert("latitude", Value::Null);
        assert!(!is_step_complete(5, &data));
    }

    #[test]
    fn test_water_rights_requires_number_and_flow_rate() {
        let mut data = complete_form();
        assert!(is_step_complete(6, &data));
        data.insert("waterRightFlowRate", Value::Null);
        assert!(!is_step_complete(6, &data));
    }

    #[test]
    fn test_self_install_only_required_for_self_install_projects() {
        let data = complete_form();
        assert!(is_step_complete(7, &data));

        let mut self_install = complete_form();
        self_install.insert("projectType", json!(SELF_INSTALL_PROJECT_TYPE));
        assert!(!is_step_complete(7, &self_install));

        self_install.insert("hasDesignDocs", json!("yes"));
        assert!(!is_step_complete(7, &self_install));

        self_install.insert("hasCostEstimate", json!("no"));
        assert!(is_step_complete(7, &self_install));

        self_install.insert("hasCostEstimate", json!(""));
        assert!(!is_step_complete(7, &self_install));
    }

    #[test]
    fn test_self_install_accepts_numeric_code_and_legacy_field_name() {
        let mut data = complete_form();
        data.insert("projectType", json!(4));
        assert!(!is_step_complete(7, &data));

        data.insert("hasDesignDocuments", json!(true));
        data.insert("hasCostEstimate", json!(false));
        assert!(is_step_complete(7, &data));
    }

    #[test]
    fn test_review_requires_all_seven_certifications() {
        let mut data = complete_form();
        assert!(is_step_complete(8, &data));

        data.insert("certifications", json!(vec![true; 6]));
        assert!(!is_step_complete(8, &data));

        data.insert("certifications", json!([true, true, true, false, true, true, true]));
        assert!(!is_step_complete(8, &data));
    }

    #[test]
    fn test_all_steps_complete_is_conjunction() {
        let data = complete_form();
        assert!(all_steps_complete(&data));
        assert!(StepCompletion::evaluate(&data).all_complete());

        let mut missing_cert = data.clone();
        missing_cert.insert("certifications", json!([]));
        assert!(!all_steps_complete(&missing_cert));
        assert_eq!(
            StepCompletion::evaluate(&missing_cert).incomplete_steps(),
            vec![WizardStep::Review]
        );
    }

    #[test]
    fn test_empty_form_only_completes_welcome() {
        let completion = StepCompletion::evaluate(&FormData::new());
        assert_eq!(completion.as_slice(), &[true, false, false, false, false, false, true, false]);
    }
}
