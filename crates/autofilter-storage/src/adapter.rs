// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the OperationStore trait.

use async_trait::async_trait;
use tracing::debug;

use autofilter_core::{
    AdapterType, AutofilterError, HealthStatus, Operation, OperationStore, OperationUpdate,
    PluginAdapter,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// Operation table in the primary database.
pub struct SqliteOperationStore {
    db: Database,
}

impl SqliteOperationStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteOperationStore {
    fn name(&self) -> &str {
        "sqlite-operations"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, AutofilterError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AutofilterError> {
        self.db.checkpoint().await?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl OperationStore for SqliteOperationStore {
    async fn insert(&self, op: &Operation) -> Result<(), AutofilterError> {
        queries::operations::insert_operation(&self.db, op).await
    }

    async fn update(&self, id: &str, update: OperationUpdate) -> Result<bool, AutofilterError> {
        queries::operations::update_operation(&self.db, id, update).await
    }

    async fn get(&self, id: &str) -> Result<Option<Operation>, AutofilterError> {
        queries::operations::get_operation(&self.db, id).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AutofilterError> {
        queries::operations::delete_operation(&self.db, id).await
    }

    async fn list(&self, is_paused: Option<bool>) -> Result<Vec<Operation>, AutofilterError> {
        queries::operations::list_operations(&self.db, is_paused).await
    }
}
