// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index operations for the autofilter bot.
//!
//! An index operation crawls a message range of a source channel through the
//! protocol client, classifies every message's document, encodes a file
//! handle, and writes the resulting file through the file store. Operations
//! are persisted with a checkpoint so a paused or interrupted run resumes
//! where it stopped.
//!
//! [`IndexEngine`] owns the runs. [`Controls`] turns operator button presses
//! and prompt answers into engine calls.

pub mod classify;
pub mod controls;
pub mod engine;
pub mod floodwait;
pub mod link;
pub mod payload;
pub mod progress;
mod registry;
mod run;

pub use controls::{ControlReply, Controls, IndexRequest, Operator};
pub use engine::{EngineSettings, IndexEngine};
pub use link::{MessageLink, MessageTarget};
pub use payload::ControlPayload;

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated operation ids.
pub const OPERATION_ID_LEN: usize = 6;

/// Length of generated file keys.
pub const FILE_KEY_LEN: usize = 15;

/// A random alphanumeric string of `len` characters.
pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_ids_are_alphanumeric_and_sized() {
        let id = random_id(OPERATION_ID_LEN);
        assert_eq!(id.len(), 6);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_id(FILE_KEY_LEN), random_id(FILE_KEY_LEN));
    }
}
