// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locally active runs, keyed by operation id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

/// Control side of one run: `cancel` asks it to stop, `done` fires once it
/// has written its last checkpoint and exited.
#[derive(Debug, Clone)]
pub(crate) struct RunHandle {
    pub cancel: CancellationToken,
    pub done: CancellationToken,
    pub generation: u64,
    discarded: Arc<AtomicBool>,
}

impl RunHandle {
    /// Cancels the run and waits until it has exited.
    pub async fn stop(&self) {
        self.cancel.cancel();
        self.done.cancelled().await;
    }

    /// Like [`stop`](Self::stop), for a run whose record is about to be
    /// deleted. The run renders a cancelled state instead of its paused one.
    pub async fn discard(&self) {
        self.discarded.store(true, Ordering::Release);
        self.stop().await;
    }

    pub fn is_discarded(&self) -> bool {
        self.discarded.load(Ordering::Acquire)
    }
}

#[derive(Default)]
pub(crate) struct RunRegistry {
    runs: Mutex<HashMap<String, RunHandle>>,
    next_generation: AtomicU64,
}

impl RunRegistry {
    /// Installs a fresh handle for `id` derived from `parent`, returning it
    /// together with the handle it superseded.
    pub fn register(&self, id: &str, parent: &CancellationToken) -> (RunHandle, Option<RunHandle>) {
        let handle = RunHandle {
            cancel: parent.child_token(),
            done: CancellationToken::new(),
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            discarded: Arc::default(),
        };
        let previous = self.runs().insert(id.to_string(), handle.clone());
        (handle, previous)
    }

    /// Drops the entry for `id` if it still belongs to `generation`.
    pub fn finish(&self, id: &str, generation: u64) {
        let mut runs = self.runs();
        if runs.get(id).is_some_and(|h| h.generation == generation) {
            runs.remove(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<RunHandle> {
        self.runs().get(id).cloned()
    }

    pub fn take(&self, id: &str) -> Option<RunHandle> {
        self.runs().remove(id)
    }

    pub fn drain(&self) -> Vec<(String, RunHandle)> {
        self.runs().drain().collect()
    }

    pub fn len(&self) -> usize {
        self.runs().len()
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<String, RunHandle>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_supersedes_previous_handle() {
        let registry = RunRegistry::default();
        let root = CancellationToken::new();
        let (first, none) = registry.register("op", &root);
        assert!(none.is_none());
        let (second, previous) = registry.register("op", &root);
        assert_eq!(previous.unwrap().generation, first.generation);
        assert_ne!(first.generation, second.generation);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stale_finish_keeps_newer_run() {
        let registry = RunRegistry::default();
        let root = CancellationToken::new();
        let (first, _) = registry.register("op", &root);
        let (second, _) = registry.register("op", &root);
        registry.finish("op", first.generation);
        assert_eq!(registry.get("op").unwrap().generation, second.generation);
        registry.finish("op", second.generation);
        assert!(registry.get("op").is_none());
    }

    #[test]
    fn parent_cancellation_reaches_runs() {
        let registry = RunRegistry::default();
        let root = CancellationToken::new();
        let (handle, _) = registry.register("op", &root);
        root.cancel();
        assert!(handle.cancel.is_cancelled());
        assert!(!handle.done.is_cancelled());
    }

    #[tokio::test]
    async fn stop_waits_for_done() {
        let registry = RunRegistry::default();
        let root = CancellationToken::new();
        let (handle, _) = registry.register("op", &root);
        let run = handle.clone();
        let task = tokio::spawn(async move {
            let _done = run.done.clone().drop_guard();
            run.cancel.cancelled().await;
        });
        handle.stop().await;
        assert!(handle.done.is_cancelled());
        task.await.unwrap();
        assert!(!handle.is_discarded());
        assert_eq!(registry.drain().len(), 1);
    }

    #[tokio::test]
    async fn discard_is_visible_to_the_run() {
        let registry = RunRegistry::default();
        let root = CancellationToken::new();
        let (handle, _) = registry.register("op", &root);
        let run = handle.clone();
        let task = tokio::spawn(async move {
            let _done = run.done.clone().drop_guard();
            run.cancel.cancelled().await;
            run.is_discarded()
        });
        handle.discard().await;
        assert!(task.await.unwrap());
    }
}
