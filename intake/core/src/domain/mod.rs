// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Aggregates, value objects and repository ports. Nothing in here touches
//! the network or the database directly.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`application`] | `Application` aggregate and the draft/submitted state machine |
//! | [`attachment`] | File references recorded against an application |
//! | [`audit`] | Append-only audit log entries |
//! | [`config`] | YAML configuration manifest |
//! | [`credentials`] | Session claims and the token/hash ports |
//! | [`form_data`] | Open JSON form state with presence-based accessors |
//! | [`policy`] | Action × role × ownership decision table |
//! | [`principal`] | Authenticated identity and role |
//! | [`repository`] | Persistence ports |
//! | [`user`] | User accounts |
//! | [`wizard`] | Step catalog and completion predicates |

pub mod application;
pub mod attachment;
pub mod audit;
pub mod config;
pub mod credentials;
pub mod form_data;
pub mod policy;
pub mod principal;
pub mod repository;
pub mod user;
pub mod wizard;
