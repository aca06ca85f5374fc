// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits used by the index engine.

use async_trait::async_trait;

use crate::error::AutofilterError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{File, Operation, OperationUpdate};

/// Persistent table of index operations.
#[async_trait]
pub trait OperationStore: PluginAdapter {
    /// Inserts a new operation. Fails if the id is taken.
    async fn insert(&self, op: &Operation) -> Result<(), AutofilterError>;

    /// Applies a typed partial update. Returns `false` when no record has `id`.
    async fn update(&self, id: &str, update: OperationUpdate) -> Result<bool, AutofilterError>;

    async fn get(&self, id: &str) -> Result<Option<Operation>, AutofilterError>;

    /// Deletes a record. Returns `false` when no record has `id`.
    async fn delete(&self, id: &str) -> Result<bool, AutofilterError>;

    /// Lists operations, optionally filtered by their paused flag.
    async fn list(&self, is_paused: Option<bool>) -> Result<Vec<Operation>, AutofilterError>;
}

/// Write side of the file index, as seen by the classifier.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores a file unless a duplicate exists, in which case
    /// [`AutofilterError::DuplicateFile`] is returned.
    async fn save_file(&self, file: &File) -> Result<(), AutofilterError>;
}
