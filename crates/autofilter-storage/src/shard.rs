// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One backing collection of the sharded file store.

use async_trait::async_trait;

use autofilter_core::{AutofilterError, File};

use crate::database::Database;
use crate::filter::{FileFilter, FileUpdate};
use crate::queries;

/// A single file collection. Shards are otherwise identical; the sharded
/// store decides which one is written.
#[async_trait]
pub trait FileShard: Send + Sync {
    /// Label used in logs and aggregated errors.
    fn label(&self) -> &str;

    async fn insert(&self, file: &File) -> Result<(), AutofilterError>;

    async fn find_one(&self, filter: &FileFilter) -> Result<Option<File>, AutofilterError>;

    /// Matches with a position greater than `after`, in position order,
    /// paired with their position.
    async fn find_page(
        &self,
        filter: &FileFilter,
        after: i64,
        limit: usize,
    ) -> Result<Vec<(i64, File)>, AutofilterError>;

    async fn delete(&self, filter: &FileFilter, only_one: bool) -> Result<u64, AutofilterError>;

    async fn update(
        &self,
        filter: &FileFilter,
        update: &FileUpdate,
        only_one: bool,
    ) -> Result<u64, AutofilterError>;

    /// Approximate number of stored files.
    async fn estimated_count(&self) -> Result<u64, AutofilterError>;
}

/// A shard backed by one SQLite database.
pub struct SqliteShard {
    db: Database,
    label: String,
}

impl SqliteShard {
    pub fn new(db: Database) -> Self {
        let label = db.path().to_string();
        Self { db, label }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl FileShard for SqliteShard {
    fn label(&self) -> &str {
        &self.label
    }

    async fn insert(&self, file: &File) -> Result<(), AutofilterError> {
        queries::files::insert_file(&self.db, file).await
    }

    async fn find_one(&self, filter: &FileFilter) -> Result<Option<File>, AutofilterError> {
        queries::files::find_one_file(&self.db, filter).await
    }

    async fn find_page(
        &self,
        filter: &FileFilter,
        after: i64,
        limit: usize,
    ) -> Result<Vec<(i64, File)>, AutofilterError> {
        queries::files::find_file_page(&self.db, filter, after, limit).await
    }

    async fn delete(&self, filter: &FileFilter, only_one: bool) -> Result<u64, AutofilterError> {
        queries::files::delete_files(&self.db, filter, only_one).await
    }

    async fn update(
        &self,
        filter: &FileFilter,
        update: &FileUpdate,
        only_one: bool,
    ) -> Result<u64, AutofilterError> {
        queries::files::update_files(&self.db, filter, update, only_one).await
    }

    async fn estimated_count(&self) -> Result<u64, AutofilterError> {
        queries::files::count_files(&self.db).await
    }
}
