// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for autofilter integration tests.
//!
//! Provides mock collaborators and a harness that wires a complete index
//! stack over temporary SQLite databases, so tests run without a bot token
//! or network access.
//!
//! # Components
//!
//! - [`MockMessenger`] - captures sends and edits, resolves scripted usernames
//! - [`ClientScript`] / [`ScriptedClientFactory`] - a protocol client serving canned history
//! - [`TestHarness`] - stores, engine, bridge and controls in one place
//! - [`fixtures`] - builders for fetched messages

pub mod fixtures;
pub mod harness;
pub mod mock_messenger;
pub mod scripted_client;

pub use harness::TestHarness;
pub use mock_messenger::MockMessenger;
pub use scripted_client::{ClientScript, ScriptedClient, ScriptedClientFactory};
