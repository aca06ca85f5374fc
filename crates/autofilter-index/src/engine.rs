// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The index engine: creates operations and owns their runs.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use autofilter_config::model::IndexConfig;
use autofilter_core::traits::protocol::Credentials;
use autofilter_core::{
    AutofilterError, ClientFactory, FileStore, Messenger, Operation, OperationStore,
    OperationUpdate,
};

use crate::registry::{RunHandle, RunRegistry};
use crate::run;
use crate::{OPERATION_ID_LEN, random_id};

/// Tunables of the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Message ids requested per history fetch.
    pub batch_size: usize,
    /// Interval between checkpoint pushes and progress edits.
    pub progress_interval: Duration,
    /// Wait used when a rate-limit error does not say how long.
    pub flood_wait_fallback: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&IndexConfig::default())
    }
}

impl From<&IndexConfig> for EngineSettings {
    fn from(config: &IndexConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            progress_interval: Duration::from_secs(config.progress_interval_secs),
            flood_wait_fallback: Duration::from_secs(config.flood_wait_fallback_secs),
        }
    }
}

pub(crate) struct EngineInner {
    pub operations: Arc<dyn OperationStore>,
    pub files: Arc<dyn FileStore>,
    pub messenger: Arc<dyn Messenger>,
    pub clients: Arc<dyn ClientFactory>,
    pub credentials: Credentials,
    pub settings: EngineSettings,
    pub runs: RunRegistry,
    /// Held by start, pause, modify and cancel so their store writes and run
    /// signals never interleave.
    pub control: tokio::sync::Mutex<()>,
    /// Parent of every run's cancellation token.
    pub root: CancellationToken,
}

/// Creates, runs, pauses, modifies and cancels index operations.
///
/// Cloning is cheap; clones share the same runs.
#[derive(Clone)]
pub struct IndexEngine {
    inner: Arc<EngineInner>,
}

impl IndexEngine {
    pub fn new(
        operations: Arc<dyn OperationStore>,
        files: Arc<dyn FileStore>,
        messenger: Arc<dyn Messenger>,
        clients: Arc<dyn ClientFactory>,
        credentials: Credentials,
        settings: EngineSettings,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                operations,
                files,
                messenger,
                clients,
                credentials,
                settings,
                runs: RunRegistry::default(),
                control: tokio::sync::Mutex::new(()),
                root: CancellationToken::new(),
            }),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Persists a new paused operation over `start_id..=end_id`.
    pub async fn create(
        &self,
        channel_id: i64,
        start_id: i64,
        end_id: i64,
        progress_chat_id: i64,
    ) -> Result<Operation, AutofilterError> {
        if start_id > end_id {
            return Err(AutofilterError::InvalidRange {
                start: start_id,
                end: end_id,
            });
        }
        let op = Operation::new(
            random_id(OPERATION_ID_LEN),
            channel_id,
            start_id,
            end_id,
            progress_chat_id,
        );
        self.inner.operations.insert(&op).await?;
        info!(pid = %op.id, channel_id, start_id, end_id, "index operation created");
        Ok(op)
    }

    pub async fn get(&self, id: &str) -> Result<Operation, AutofilterError> {
        self.inner
            .operations
            .get(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Launches a run from the persisted checkpoint, replacing any local run
    /// of the same operation, and marks the record active.
    pub async fn start_or_resume(&self, id: &str) -> Result<(), AutofilterError> {
        let _control = self.inner.control.lock().await;
        let (handle, previous) = self.inner.runs.register(id, &self.inner.root);
        if let Some(previous) = previous {
            debug!(pid = %id, "superseding active run");
            previous.stop().await;
        }

        let op = match self.inner.operations.get(id).await {
            Ok(Some(op)) => op,
            Ok(None) => {
                self.abandon(id, &handle);
                return Err(not_found(id));
            }
            Err(e) => {
                self.abandon(id, &handle);
                return Err(e);
            }
        };
        match self
            .inner
            .operations
            .update(id, OperationUpdate::Paused(false))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                self.abandon(id, &handle);
                return Err(not_found(id));
            }
            Err(e) => {
                self.abandon(id, &handle);
                return Err(e);
            }
        }

        let mut op = op;
        op.is_paused = false;
        self.spawn(op, handle);
        Ok(())
    }

    /// Signals the local run (if any) and marks the record paused. The run
    /// writes its own final checkpoint as it exits. A start racing this call
    /// waits for it, so the record and the local run always agree.
    pub async fn pause(&self, id: &str) -> Result<(), AutofilterError> {
        let _control = self.inner.control.lock().await;
        match self.inner.runs.get(id) {
            Some(handle) => handle.cancel.cancel(),
            None => debug!(pid = %id, "pause requested with no active run"),
        }
        if !self
            .inner
            .operations
            .update(id, OperationUpdate::Paused(true))
            .await?
        {
            return Err(not_found(id));
        }
        info!(pid = %id, "index operation paused");
        Ok(())
    }

    /// Moves the end of the range. The operation is left paused.
    pub async fn modify(&self, id: &str, new_end_id: i64) -> Result<(), AutofilterError> {
        let _control = self.inner.control.lock().await;
        let op = self.get(id).await?;
        check_end(&op, new_end_id)?;

        self.stop_local(id).await;

        // The run may have advanced past the new end before it stopped.
        let op = self.get(id).await?;
        if let Err(e) = check_end(&op, new_end_id) {
            self.inner
                .operations
                .update(id, OperationUpdate::Paused(true))
                .await?;
            return Err(e);
        }

        let ops = &self.inner.operations;
        if !ops.update(id, OperationUpdate::End { end_id: new_end_id }).await? {
            return Err(not_found(id));
        }
        ops.update(id, OperationUpdate::Paused(true)).await?;
        info!(pid = %id, end = new_end_id, "index operation modified");
        Ok(())
    }

    /// Stops the local run and deletes the record. The run renders a
    /// cancelled state instead of its paused controls.
    pub async fn cancel(&self, id: &str) -> Result<(), AutofilterError> {
        let _control = self.inner.control.lock().await;
        if let Some(handle) = self.inner.runs.take(id) {
            handle.discard().await;
        }
        if !self.inner.operations.delete(id).await? {
            return Err(not_found(id));
        }
        info!(pid = %id, "index operation cancelled");
        Ok(())
    }

    /// Relaunches every record left active by a previous process. Returns how
    /// many runs were started.
    pub async fn restart_all_active(&self) -> Result<usize, AutofilterError> {
        let active = self.inner.operations.list(Some(false)).await?;
        let mut started = 0;
        for op in active {
            match self.start_or_resume(&op.id).await {
                Ok(()) => started += 1,
                Err(e) => warn!(pid = %op.id, error = %e, "failed to restart operation"),
            }
        }
        if started > 0 {
            info!(count = started, "restarted interrupted index operations");
        }
        Ok(started)
    }

    /// Cancels every local run and waits for each to checkpoint. Records keep
    /// their active flag so the next process restarts them.
    pub async fn shutdown(&self) {
        self.inner.root.cancel();
        let runs = self.inner.runs.drain();
        let count = runs.len();
        for (_, handle) in runs {
            handle.done.cancelled().await;
        }
        info!(count, "index engine shut down");
    }

    /// Waits for the local run of `id` to end. Returns at once when none is
    /// active.
    pub async fn join(&self, id: &str) {
        if let Some(handle) = self.inner.runs.get(id) {
            handle.done.cancelled().await;
        }
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.inner.runs.get(id).is_some()
    }

    pub fn running_count(&self) -> usize {
        self.inner.runs.len()
    }

    async fn stop_local(&self, id: &str) {
        if let Some(handle) = self.inner.runs.take(id) {
            handle.stop().await;
        }
    }

    fn abandon(&self, id: &str, handle: &RunHandle) {
        self.inner.runs.finish(id, handle.generation);
        handle.done.cancel();
    }

    fn spawn(&self, op: Operation, handle: RunHandle) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _done = handle.done.clone().drop_guard();
            let id = op.id.clone();
            let outcome = run::execute(&inner, op, &handle).await;
            debug!(pid = %id, ?outcome, "run ended");
            inner.runs.finish(&id, handle.generation);
        });
    }
}

fn check_end(op: &Operation, new_end_id: i64) -> Result<(), AutofilterError> {
    if new_end_id <= op.current_id {
        return Err(AutofilterError::InvalidEnd {
            end: new_end_id,
            current: op.current_id,
        });
    }
    Ok(())
}

fn not_found(id: &str) -> AutofilterError {
    AutofilterError::OperationNotFound { id: id.to_string() }
}
