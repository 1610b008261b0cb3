// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use udmt_core::application::{LifecycleSettings, StandardApplicationLifecycleService};
use udmt_core::domain::form_data::FormData;
use udmt_core::domain::principal::Principal;
use udmt_core::domain::repository::UserRepository;
use udmt_core::domain::wizard::{CERTIFICATION_COUNT, ELIGIBILITY_CHECK_COUNT};
use udmt_core::infrastructure::repositories::InMemoryStore;
use udmt_core::infrastructure::seed::seed_demo_users;
use udmt_core::infrastructure::Argon2CredentialHasher;

pub struct Harness {
    pub store: InMemoryStore,
    pub hasher: Arc<Argon2CredentialHasher>,
    pub service: Arc<StandardApplicationLifecycleService>,
    pub admin: Principal,
    pub applicant_a: Principal,
    pub applicant_b: Principal,
}

/// In-memory store seeded with the demo accounts. Hashing is kept cheap.
pub async fn harness(settings: LifecycleSettings) -> Harness {
    let store = InMemoryStore::new();
    let hasher = Arc::new(Argon2CredentialHasher::with_params(8, 1, 1).unwrap());
    seed_demo_users(&store, hasher.as_ref()).await.unwrap();

    let service = Arc::new(StandardApplicationLifecycleService::new(
        Arc::new(store.clone()),
        settings,
    ));

    Harness {
        admin: principal(&store, "admin@example.com").await,
        applicant_a: principal(&store, "applicantA@example.com").await,
        applicant_b: principal(&store, "applicantB@example.com").await,
        store,
        hasher,
        service,
    }
}

async fn principal(store: &InMemoryStore, email: &str) -> Principal {
    UserRepository::find_by_email(store, email)
        .await
        .unwrap()
        .unwrap()
        .principal()
}

pub fn form(value: Value) -> FormData {
    FormData::from_value(value).unwrap()
}

/// Answers that satisfy every wizard step.
pub fn complete_answers() -> Value {
    json!({
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
    })
}
