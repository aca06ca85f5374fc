// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The run loop of one index operation.
//!
//! A run owns an in-memory copy of its operation. It crawls the range in
//! batches, a side task pushes checkpoints and progress edits on a fixed
//! interval, and the loop writes a final checkpoint whatever way it ends.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use autofilter_core::traits::protocol::{ChannelHandle, FetchedMessage, ProtocolClient, ProtocolError};
use autofilter_core::{
    FileStore, MessageRef, Messenger, Operation, OperationStore, OperationUpdate, OutboundMessage,
};

use crate::classify::{classify, message_id};
use crate::engine::EngineInner;
use crate::floodwait::{FetchFailure, classify_fetch_error};
use crate::progress::{RunClock, RunState, render, start_text, stop_notice};
use crate::registry::RunHandle;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// Every message up to `end_id` was processed; the record is gone.
    Completed,
    /// Cancelled by pause, modify, cancel or shutdown.
    Paused,
    /// Stopped on an unrecoverable error; the operator was notified.
    Failed,
}

/// Start of a run's throughput window.
#[derive(Debug, Clone, Copy)]
struct Window {
    run_start_id: i64,
    started: Instant,
}

impl Window {
    fn clock(&self) -> RunClock {
        RunClock {
            run_start_id: self.run_start_id,
            elapsed: self.started.elapsed(),
        }
    }
}

pub(crate) async fn execute(
    inner: &EngineInner,
    mut op: Operation,
    handle: &RunHandle,
) -> RunOutcome {
    let pid = op.id.clone();
    let cancel = &handle.cancel;

    let progress = match inner
        .messenger
        .send(OutboundMessage::new(op.progress_chat_id, start_text(&op)))
        .await
    {
        Ok(progress) => progress,
        Err(e) => {
            error!(pid = %pid, chat_id = op.progress_chat_id, error = %e, "failed to send progress message");
            notify_stopped(inner.messenger.as_ref(), &op, "Update Progress Message").await;
            return RunOutcome::Failed;
        }
    };

    let window = Window {
        run_start_id: op.current_id,
        started: Instant::now(),
    };

    let client = match inner.clients.authenticate(&inner.credentials).await {
        Ok(client) => client,
        Err(e) => {
            error!(pid = %pid, error = %e, "protocol login failed");
            notify_stopped(inner.messenger.as_ref(), &op, "Log In").await;
            return RunOutcome::Failed;
        }
    };

    let channel = match client.resolve_channel(op.protocol_channel_id()).await {
        Ok(channel) => channel,
        Err(e) => {
            error!(pid = %pid, channel_id = op.channel_id, error = %e, "failed to resolve channel");
            notify_stopped(inner.messenger.as_ref(), &op, "Get Chat").await;
            return RunOutcome::Failed;
        }
    };

    info!(
        pid = %pid,
        start = op.start_id,
        current = op.current_id,
        end = op.end_id,
        "index run started"
    );

    let (snapshot, snapshot_rx) = watch::channel(op.clone());
    let ticker_cancel = cancel.child_token();
    let ticker = spawn_ticker(
        Arc::clone(&inner.operations),
        Arc::clone(&inner.messenger),
        progress,
        window,
        inner.settings.progress_interval,
        snapshot_rx,
        ticker_cancel.clone(),
    );

    let batch_size = inner.settings.batch_size.max(1) as i64;
    let mut next_id = op.current_id;
    let outcome = loop {
        if cancel.is_cancelled() {
            break RunOutcome::Paused;
        }
        if next_id > op.end_id {
            break RunOutcome::Completed;
        }

        let last_id = (next_id + batch_size - 1).min(op.end_id);
        let ids: Vec<i64> = (next_id..=last_id).collect();

        let messages = match fetch_batch(inner, client.as_ref(), &channel, &ids, &pid, cancel).await {
            Ok(Some(messages)) => messages,
            Ok(None) => break RunOutcome::Paused,
            Err(e) => {
                error!(pid = %pid, current = op.current_id, error = %e, "failed to fetch messages");
                notify_stopped(inner.messenger.as_ref(), &op, "Get Messages").await;
                break RunOutcome::Failed;
            }
        };
        if cancel.is_cancelled() {
            break RunOutcome::Paused;
        }

        store_batch(inner.files.as_ref(), &mut op, &messages).await;
        op.current_id = last_id;
        next_id = last_id + 1;
        snapshot.send_replace(op.clone());
    };

    ticker_cancel.cancel();
    if let Err(e) = ticker.await {
        warn!(pid = %pid, error = %e, "progress ticker ended abnormally");
    }

    let exists = push_checkpoint(inner.operations.as_ref(), &op).await;
    match outcome {
        RunOutcome::Completed => {
            let done = render(&op, RunState::Completed, window.clock(), Utc::now());
            if let Err(e) = inner.messenger.edit(progress, done).await {
                debug!(pid = %pid, error = %e, "failed to render completion");
            }
            if let Err(e) = inner.operations.delete(&pid).await {
                warn!(pid = %pid, error = %e, "failed to delete completed operation");
            }
            info!(pid = %pid, saved = op.saved, failed = op.failed, "index run completed");
        }
        RunOutcome::Paused => {
            // A discarded run's record is deleted right after it exits.
            if handle.is_discarded() {
                let cancelled = render(&op, RunState::Cancelled, window.clock(), Utc::now());
                if let Err(e) = inner.messenger.edit(progress, cancelled).await {
                    debug!(pid = %pid, error = %e, "failed to render cancellation");
                }
                info!(pid = %pid, current = op.current_id, "index run cancelled");
            } else {
                if exists {
                    let paused = render(&op, RunState::Paused, window.clock(), Utc::now());
                    if let Err(e) = inner.messenger.edit(progress, paused).await {
                        warn!(pid = %pid, error = %e, "failed to render paused progress");
                    }
                }
                info!(pid = %pid, current = op.current_id, "index run paused");
            }
        }
        RunOutcome::Failed => {}
    }
    outcome
}

/// Fetches one batch, sleeping through rate limits. `Ok(None)` when the run
/// was cancelled while waiting.
async fn fetch_batch(
    inner: &EngineInner,
    client: &dyn ProtocolClient,
    channel: &ChannelHandle,
    ids: &[i64],
    pid: &str,
    cancel: &CancellationToken,
) -> Result<Option<Vec<FetchedMessage>>, ProtocolError> {
    loop {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let err = match client.fetch_messages(channel, ids).await {
            Ok(messages) => return Ok(Some(messages)),
            Err(e) => e,
        };
        match classify_fetch_error(&err) {
            FetchFailure::FloodWait { wait } => {
                let wait = wait.unwrap_or(inner.settings.flood_wait_fallback);
                warn!(pid = %pid, ?wait, error = %err, "rate limited, retrying batch");
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(None),
                    _ = tokio::time::sleep(wait) => {}
                }
            }
            FetchFailure::Fatal => return Err(err),
        }
    }
}

/// Classifies and stores every message of a batch, updating the counters.
async fn store_batch(files: &dyn FileStore, op: &mut Operation, messages: &[FetchedMessage]) {
    for msg in messages {
        let file = match classify(msg) {
            Ok(file) => file,
            Err(reason) => {
                debug!(pid = %op.id, message_id = message_id(msg), %reason, "message skipped");
                op.failed += 1;
                continue;
            }
        };
        match files.save_file(&file).await {
            Ok(()) => op.saved += 1,
            Err(e) if e.is_duplicate() => {
                debug!(pid = %op.id, name = %file.name, "duplicate file skipped");
                op.failed += 1;
            }
            Err(e) => {
                warn!(pid = %op.id, name = %file.name, error = %e, "failed to save file");
                op.failed += 1;
            }
        }
    }
}

/// Writes the run's counters. Returns `false` when the record no longer exists.
async fn push_checkpoint(operations: &dyn OperationStore, op: &Operation) -> bool {
    let update = OperationUpdate::Checkpoint {
        current_id: op.current_id,
        saved: op.saved,
        failed: op.failed,
    };
    match operations.update(&op.id, update).await {
        Ok(found) => found,
        Err(e) => {
            error!(pid = %op.id, error = %e, "failed to push checkpoint");
            true
        }
    }
}

async fn notify_stopped(messenger: &dyn Messenger, op: &Operation, step: &str) {
    if let Err(e) = messenger.send(stop_notice(op, step)).await {
        warn!(pid = %op.id, error = %e, "failed to send stop notice");
    }
}

fn spawn_ticker(
    operations: Arc<dyn OperationStore>,
    messenger: Arc<dyn Messenger>,
    progress: MessageRef,
    window: Window,
    period: Duration,
    mut snapshot: watch::Receiver<Operation>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    let op = snapshot.borrow_and_update().clone();
                    push_checkpoint(operations.as_ref(), &op).await;
                    let running = render(&op, RunState::Running, window.clock(), Utc::now());
                    if let Err(e) = messenger.edit(progress, running).await {
                        debug!(pid = %op.id, error = %e, "failed to update progress message");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tracing_test::traced_test;

    use autofilter_core::traits::protocol::{DocumentAttribute, RawDocument, RawMedia, RawMessage};
    use autofilter_core::{AutofilterError, File};

    use super::*;

    /// Rejects `dup.pdf` as a duplicate and fails every `broken.pdf` write.
    #[derive(Default)]
    struct PickyFiles {
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FileStore for PickyFiles {
        async fn save_file(&self, file: &File) -> Result<(), AutofilterError> {
            match file.name.as_str() {
                "dup.pdf" => Err(AutofilterError::DuplicateFile {
                    name: file.name.clone(),
                }),
                "broken.pdf" => Err(AutofilterError::Internal("disk full".into())),
                _ => {
                    self.saved.lock().unwrap().push(file.name.clone());
                    Ok(())
                }
            }
        }
    }

    fn named(id: i64, name: &str) -> FetchedMessage {
        FetchedMessage::Regular(RawMessage {
            id,
            date: 1_700_000_000,
            media: Some(RawMedia::Document(Some(RawDocument {
                id: 500 + id,
                access_hash: 77,
                file_reference: vec![1, 2],
                dc_id: 2,
                size: 4096,
                mime_type: "application/pdf".into(),
                attributes: vec![DocumentAttribute::Filename(name.into())],
            }))),
        })
    }

    #[tokio::test]
    #[traced_test]
    async fn store_batch_counts_every_message_once() {
        let files = PickyFiles::default();
        let mut op = Operation::new("Ab12Cd", -1001, 1, 10, 5);
        let batch = vec![
            named(1, "ok.pdf"),
            named(2, "dup.pdf"),
            named(3, "broken.pdf"),
            FetchedMessage::Service { id: 4 },
            named(5, "also-ok.pdf"),
        ];

        store_batch(&files, &mut op, &batch).await;

        assert_eq!(op.saved, 2);
        assert_eq!(op.failed, 3);
        assert_eq!(*files.saved.lock().unwrap(), ["ok.pdf", "also-ok.pdf"]);
        assert!(logs_contain("failed to save file"));
        assert!(logs_contain("duplicate file skipped"));
    }

    #[test]
    fn window_clock_reports_run_start() {
        let window = Window {
            run_start_id: 42,
            started: Instant::now(),
        };
        assert_eq!(window.clock().run_start_id, 42);
    }
}
