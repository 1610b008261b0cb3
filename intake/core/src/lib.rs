// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! UDMT Intake Core
//!
//! Application lifecycle, wizard gating and REST surface for the UDMT
//! measurement-device application portal.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, application services, persistence adapters and HTTP API

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;
