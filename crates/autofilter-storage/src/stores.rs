// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opens every configured database and wires the stores on top.

use std::sync::Arc;

use tracing::{debug, info};

use autofilter_config::model::StorageConfig;
use autofilter_core::AutofilterError;

use crate::adapter::SqliteOperationStore;
use crate::database::Database;
use crate::shard::{FileShard, SqliteShard};
use crate::sharded::ShardedFileStore;

/// The operation store and the sharded file store of one process.
///
/// The primary database holds the operation table and file shard 0.
pub struct Stores {
    pub operations: Arc<SqliteOperationStore>,
    pub files: Arc<ShardedFileStore>,
    databases: Vec<Database>,
}

impl Stores {
    pub async fn open(config: &StorageConfig) -> Result<Self, AutofilterError> {
        let mut databases = Vec::new();
        for path in config.shard_paths() {
            databases.push(Database::open_with(&path, config.wal_mode).await?);
        }
        let stores = Self::from_databases(databases, config.write_target)?;
        info!(
            shards = stores.databases.len(),
            write_target = config.write_target,
            "storage opened"
        );
        Ok(stores)
    }

    /// Wires stores over already-open databases, primary first.
    pub fn from_databases(
        databases: Vec<Database>,
        write_target: usize,
    ) -> Result<Self, AutofilterError> {
        let primary = databases
            .first()
            .cloned()
            .ok_or_else(|| AutofilterError::Config("no storage database configured".into()))?;
        let shards: Vec<Arc<dyn FileShard>> = databases
            .iter()
            .cloned()
            .map(|db| Arc::new(SqliteShard::new(db)) as Arc<dyn FileShard>)
            .collect();
        Ok(Self {
            operations: Arc::new(SqliteOperationStore::new(primary)),
            files: Arc::new(ShardedFileStore::new(shards, write_target)?),
            databases,
        })
    }

    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    /// Checkpoints every database.
    pub async fn shutdown(&self) -> Result<(), AutofilterError> {
        for db in &self.databases {
            db.checkpoint().await?;
        }
        debug!("storage checkpointed");
        Ok(())
    }
}
