// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation correlation for synchronous operator prompts.
//!
//! A flow calls [`Bridge::ask`] to send a prompt and wait for the operator's
//! answer. The update pipeline hands every inbound message to
//! [`Bridge::dispatch`], which delivers it to the first pending prompt whose
//! predicate accepts it.

pub mod bridge;

pub use bridge::{Bridge, Predicate, DEFAULT_PROMPT_TIMEOUT};
