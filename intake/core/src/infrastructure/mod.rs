// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod jwt;
pub mod password;
pub mod repositories;
pub mod seed;

pub use jwt::JwtTokenService;
pub use password::Argon2CredentialHasher;
