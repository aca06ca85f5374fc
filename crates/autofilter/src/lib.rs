// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process wiring for the autofilter bot.
//!
//! [`App`] assembles storage, the index engine, the conversation bridge and
//! the operator controls around a messenger and a protocol client factory.
//! [`serve::run_serve`] runs it behind Telegram long polling until a
//! shutdown signal arrives. [`commands`] backs the offline CLI reports.

pub mod app;
pub mod commands;
pub mod serve;
pub mod shutdown;

pub use app::App;
