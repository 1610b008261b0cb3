// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Argon2id password hashing. Digests are PHC strings carrying their own
//! salt and parameters, so verification works across parameter changes.
//!
//! Hashing and verification run on the blocking pool via
//! `tokio::task::spawn_blocking`.

use crate::domain::credentials::{CredentialHasher, HashError};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use tracing::error;

#[derive(Clone, Default)]
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
}

impl Argon2CredentialHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None).map_err(|e| HashError(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    fn hash_blocking(argon2: &Argon2<'static>, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError(e.to_string()))
    }

    fn verify_blocking(argon2: &Argon2<'static>, digest: &str, plaintext: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl CredentialHasher for Argon2CredentialHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let argon2 = self.argon2.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || Self::hash_blocking(&argon2, &plaintext))
            .await
            .map_err(|e| HashError(format!("hashing task failed: {}", e)))?
    }

    async fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let argon2 = self.argon2.clone();
        let digest = digest.to_string();
        let plaintext = plaintext.to_string();
        match tokio::task::spawn_blocking(move || Self::verify_blocking(&argon2, &digest, &plaintext)).await {
            Ok(verified) => verified,
            Err(e) => {
                error!("Password verification task failed: {}", e);
                false
            }
        }
    }
}
