// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! UDMT intake CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Server bootstrap plus an HTTP client and commands for a running server

pub mod client;
pub mod commands;
pub mod server;
pub mod session;
