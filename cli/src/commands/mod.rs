// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the UDMT CLI

pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod wizard;

pub use self::admin::AdminCommand;
pub use self::app::AppCommand;
pub use self::config::ConfigCommand;
pub use self::wizard::FillArgs;
