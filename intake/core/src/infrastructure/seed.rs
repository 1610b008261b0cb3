// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Demo data for a fresh install:
//!
//! - `seed.demo_users`: admin and applicant accounts on an empty user table.
//! - `seed.sample_applications`: five applications for the demo applicants
//!   (three drafts, two submitted) when no application exists.

use crate::domain::application::{ApplicationStatus, NewApplication};
use crate::domain::audit::NewAuditEntry;
use crate::domain::credentials::CredentialHasher;
use crate::domain::form_data::FormData;
use crate::domain::principal::Role;
use crate::domain::repository::{ApplicationRepository, UserRepository};
use crate::domain::user::NewUser;
use crate::domain::wizard::{CERTIFICATION_COUNT, ELIGIBILITY_CHECK_COUNT};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

pub struct DemoAccount {
    pub email: &'static str,
    pub password: &'static str,
    pub name: &'static str,
    pub role: Role,
}

pub const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        email: "admin@example.com",
        password: "admin123",
        name: "Admin User",
        role: Role::Admin,
    },
    DemoAccount {
        email: "applicantA@example.com",
        password: "user123",
        name: "Applicant A",
        role: Role::User,
    },
    DemoAccount {
        email: "applicantB@example.com",
        password: "user123",
        name: "Applicant B",
        role: Role::User,
    },
];

/// Insert the demo accounts unless any user exists. Returns how many were
/// created.
pub async fn seed_demo_users(users: &dyn UserRepository, hasher: &dyn CredentialHasher) -> Result<usize> {
    if users.count().await.context("Failed to count users")? > 0 {
        return Ok(0);
    }

    info!("Seeding initial users...");
    for account in &DEMO_ACCOUNTS {
        let password_hash = hasher.hash(account.password).await?;
        users
            .insert(NewUser {
                email: account.email.to_string(),
                name: account.name.to_string(),
                role: account.role,
                password_hash,
                created_at: Utc::now(),
            })
            .await
            .with_context(|| format!("Failed to seed {}", account.email))?;
        info!(email = account.email, role = account.role.as_str(), "Demo user created");
    }

    Ok(DEMO_ACCOUNTS.len())
}

struct SampleApplication {
    owner_email: &'static str,
    status: ApplicationStatus,
    created_at: &'static str,
    updated_at: &'static str,
    form_data: Value,
}

fn applicant_a_contact() -> Value {
    json!({
        "name": "John Smith",
        "title": "Water Manager",
        "phone": "(435) 722-5555",
        "email": "applicantA@example.com",
        "mailingAddress": "123 River Road, Roosevelt, UT 84066"
    })
}

fn applicant_b_contact() -> Value {
    json!({
        "name": "Sarah Johnson",
        "title": "Irrigation District Manager",
        "phone": "(435) 587-3456",
        "email": "applicantB@example.com",
        "mailingAddress": "456 Canal Street, Monticello, UT 84535"
    })
}

fn sample_applications() -> Vec<SampleApplication> {
    let eligible = vec![true; ELIGIBILITY_CHECK_COUNT];
    let certified = vec![true; CERTIFICATION_COUNT];

    vec![
        SampleApplication {
            owner_email: "applicantA@example.com",
            status: ApplicationStatus::Draft,
            created_at: "2025-09-15T10:30:00Z",
            updated_at: "2025-10-05T14:22:00Z",
            form_data: json!({
                "eligibilityChecks": eligible,
                "primaryContact": applicant_a_contact(),
                "projectType": "New Installation",
                "projectName": "Green River Diversion Telemetry",
                "deviceType": "Parshall Flume with Ultrasonic Sensor",
                "deviceSize": "3-foot throat width",
                "waterBodyName": "Green River",
                "structureType": "Diversion Canal",
                "flowRate": 25.5,
                "latitude": 40.2991,
                "longitude": -109.9893,
                "transbasinDiversion": "no",
                "waterRightNumber": "WR-12345",
                "waterRightFlowRate": "25.5 CFS",
                "waterRightOwner": "Green River Irrigation Company",
                "pointOfDiversion": "NE 1/4, Section 12, T4S, R6E"
            }),
        },
        SampleApplication {
            owner_email: "applicantA@example.com",
            status: ApplicationStatus::Submitted,
            created_at: "2025-08-20T09:15:00Z",
            updated_at: "2025-09-28T16:45:00Z",
            form_data: json!({
                "eligibilityChecks": eligible,
                "primaryContact": applicant_a_contact(),
                "projectType": "Upgrade/Replacement",
                "projectName": "Duchesne River Flow Meter Installation",
                "deviceType": "Electromagnetic Flow Meter",
                "deviceSize": "24-inch",
                "waterBodyName": "Duchesne River",
                "structureType": "Headgate",
                "flowRate": 45.0,
                "latitude": 40.1633,
                "longitude": -110.4026,
                "transbasinDiversion": "no",
                "waterRightNumber": "WR-67890",
                "waterRightFlowRate": "45.0 CFS",
                "waterRightOwner": "Duchesne Water Users Association",
                "pointOfDiversion": "SW 1/4, Section 8, T3S, R4W",
                "certifications": certified
            }),
        },
        SampleApplication {
            owner_email: "applicantB@example.com",
            status: ApplicationStatus::Draft,
            created_at: "2025-09-10T11:20:00Z",
            updated_at: "2025-09-15T13:10:00Z",
            form_data: json!({
                "eligibilityChecks": eligible,
                "primaryContact": applicant_b_contact(),
                "projectType": "New Installation",
                "projectName": "Price River Measurement Device",
                "deviceType": "Cutthroat Flume",
                "deviceSize": "4-foot",
                "waterBodyName": "Price River",
                "structureType": "Diversion Structure",
                "flowRate": 18.2,
                "latitude": 39.7452,
                "longitude": -110.7821,
                "transbasinDiversion": "yes",
                "waterRightNumber": "WR-11223",
                "waterRightFlowRate": "18.2 CFS"
            }),
        },
        SampleApplication {
            owner_email: "applicantB@example.com",
            status: ApplicationStatus::Submitted,
            created_at: "2025-07-05T08:00:00Z",
            updated_at: "2025-08-12T15:30:00Z",
            form_data: json!({
                "eligibilityChecks": eligible,
                "primaryContact": applicant_b_contact(),
                "projectType": "New Installation",
                "projectName": "San Juan River Telemetry System",
                "deviceType": "Parshall Flume with Pressure Transducer",
                "deviceSize": "5-foot throat",
                "waterBodyName": "San Juan River",
                "structureType": "Canal Headgate",
                "flowRate": 32.8,
                "latitude": 37.2753,
                "longitude": -109.5498,
                "transbasinDiversion": "no",
                "waterRightNumber": "WR-44556",
                "waterRightFlowRate": "32.8 CFS",
                "waterRightOwner": "San Juan Water Conservancy District",
                "pointOfDiversion": "NW 1/4, Section 22, T12S, R8E",
                "certifications": certified
            }),
        },
        SampleApplication {
            owner_email: "applicantA@example.com",
            status: ApplicationStatus::Draft,
            created_at: "2025-10-01T14:00:00Z",
            updated_at: "2025-10-03T10:15:00Z",
            form_data: json!({
                "eligibilityChecks": eligible,
                "primaryContact": applicant_a_contact(),
                "projectType": "Self-Install",
                "projectName": "Strawberry River Monitor Upgrade",
                "deviceType": "Acoustic Doppler Velocity Meter",
                "waterBodyName": "Strawberry River"
            }),
        },
    ]
}

fn timestamp(value: &str) -> Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .with_context(|| format!("Invalid sample timestamp {}", value))
}

/// Insert the sample applications unless any application exists. Each one
/// gets a single audit entry: `submitted` at its submission time, otherwise
/// `created` at its creation time. Returns how many were created.
pub async fn seed_sample_applications(
    users: &dyn UserRepository,
    applications: &dyn ApplicationRepository,
) -> Result<usize> {
    if !applications
        .list_all(None)
        .await
        .context("Failed to list applications")?
        .is_empty()
    {
        return Ok(0);
    }

    let samples = sample_applications();
    let mut owners = Vec::with_capacity(samples.len());
    for sample in &samples {
        match users.find_by_email(sample.owner_email).await? {
            Some(user) => owners.push(user.principal()),
            None => {
                warn!(email = sample.owner_email, "Demo applicant missing, skipping sample applications");
                return Ok(0);
            }
        }
    }

    info!("Seeding sample applications...");
    let mut tx = applications.begin().await?;
    for (sample, owner) in samples.into_iter().zip(&owners) {
        let created_at = timestamp(sample.created_at)?;
        let updated_at = timestamp(sample.updated_at)?;
        let form_data = FormData::from_value(sample.form_data).context("Invalid sample form data")?;

        let mut application = tx.insert(NewApplication::draft(owner.id, form_data, created_at)).await?;
        let audit = match sample.status {
            ApplicationStatus::Submitted => {
                application.submit(updated_at)?;
                NewAuditEntry::submitted(application.id, owner, updated_at)
            }
            ApplicationStatus::Draft => {
                application.touch(updated_at);
                NewAuditEntry::created(application.id, owner, created_at)
            }
        };
        tx.save(&application).await?;
        tx.append_audit(audit).await?;
    }
    tx.commit().await?;

    info!(count = owners.len(), "Sample applications created");
    Ok(owners.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::AuditAction;
    use crate::domain::wizard::all_steps_complete;
    use crate::infrastructure::password::Argon2CredentialHasher;
    use crate::infrastructure::repositories::InMemoryStore;

    async fn seeded_users() -> InMemoryStore {
        let store = InMemoryStore::new();
        let hasher = Argon2CredentialHasher::with_params(8, 1, 1).unwrap();
        seed_demo_users(&store, &hasher).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_seeds_once() {
        let store = InMemoryStore::new();
        let hasher = Argon2CredentialHasher::with_params(8, 1, 1).unwrap();

        assert_eq!(seed_demo_users(&store, &hasher).await.unwrap(), 3);
        assert_eq!(seed_demo_users(&store, &hasher).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 3);

        let admin = store.find_by_email("admin@example.com").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(hasher.verify(&admin.password_hash, "admin123").await);
    }

    #[tokio::test]
    async fn test_sample_applications_are_seeded_once_with_audit() {
        let store = seeded_users().await;

        assert_eq!(seed_sample_applications(&store, &store).await.unwrap(), 5);
        assert_eq!(seed_sample_applications(&store, &store).await.unwrap(), 0);

        let all = store.list_all(None).await.unwrap();
        assert_eq!(all.len(), 5);
        // Newest update first
        assert_eq!(all[0].application.form_data.project_name(), Some("Green River Diversion Telemetry"));

        let submitted = store.list_all(Some(ApplicationStatus::Submitted)).await.unwrap();
        assert_eq!(submitted.len(), 2);
        for entry in &submitted {
            let application = &entry.application;
            assert_eq!(application.submitted_at, Some(application.updated_at));
            assert!(all_steps_complete(&application.form_data));

            let trail = store.audit_trail(application.id).await.unwrap();
            assert_eq!(trail.len(), 1);
            assert_eq!(trail[0].action, AuditAction::Submitted);
            assert_eq!(trail[0].user_id, application.owner_id);
        }

        let drafts = store.list_all(Some(ApplicationStatus::Draft)).await.unwrap();
        assert_eq!(drafts.len(), 3);
        for entry in &drafts {
            assert!(entry.application.submitted_at.is_none());
            let trail = store.audit_trail(entry.application.id).await.unwrap();
            assert_eq!(trail[0].action, AuditAction::Created);
            assert_eq!(trail[0].timestamp, entry.application.created_at);
        }

        let owners: Vec<&str> = all.iter().map(|e| e.owner.email.as_str()).collect();
        assert_eq!(owners.iter().filter(|e| **e == "applicantB@example.com").count(), 2);
    }

    #[tokio::test]
    async fn test_sample_applications_need_demo_applicants() {
        let store = InMemoryStore::new();
        assert_eq!(seed_sample_applications(&store, &store).await.unwrap(), 0);
        assert!(store.list_all(None).await.unwrap().is_empty());
    }
}
