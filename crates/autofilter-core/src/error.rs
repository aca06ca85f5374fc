// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the autofilter workspace.

use std::time::Duration;

use thiserror::Error;

use crate::traits::protocol::ProtocolError;

/// The primary error type used across all autofilter crates.
#[derive(Debug, Error)]
pub enum AutofilterError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure, migration failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Bot-facing messaging errors (send, edit, chat lookup).
    #[error("messenger error: {message}")]
    Messenger {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Errors returned by the low-level protocol client.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The store already holds this file (same handle, or same name prefix and size).
    #[error("file already exists: {name}")]
    DuplicateFile { name: String },

    /// No persisted index operation has this id.
    #[error("index operation not found: {id}")]
    OperationNotFound { id: String },

    /// Start of a requested range lies after its end.
    #[error("invalid message range: start {start} is after end {end}")]
    InvalidRange { start: i64, end: i64 },

    /// A new end id does not lie after the operation's checkpoint.
    #[error("new end {end} must be after the current message {current}")]
    InvalidEnd { end: i64, current: i64 },

    /// Shard index outside the configured shard list.
    #[error("shard index {index} out of range ({shards} shards)")]
    ShardOutOfRange { index: usize, shards: usize },

    /// A fan-out write failed on one or more shards. `affected` counts the
    /// rows changed on the shards that succeeded.
    #[error("{} shard(s) failed after affecting {affected} row(s): {}", failures.len(), failures.join("; "))]
    PartialShardFailure { affected: u64, failures: Vec<String> },

    /// Operation timed out (includes prompts nobody answered).
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Malformed operator input or control payload.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AutofilterError {
    /// Returns `true` when the error reports a duplicate file.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, AutofilterError::DuplicateFile { .. })
    }

    /// Returns `true` when the error reports an unanswered prompt or other timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AutofilterError::Timeout { .. })
    }
}
