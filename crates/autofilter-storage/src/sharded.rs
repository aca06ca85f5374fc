// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Virtual file collection spanning several shards.
//!
//! Writes go to the current write target only. Reads probe shards in list
//! order. The write target moves when an operator overrides it or when the
//! rebalancer finds a smaller shard; files never move between shards.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use autofilter_core::{AutofilterError, File, FileStore};

use crate::cursor::{MultiCursor, DEFAULT_PAGE_SIZE};
use crate::filter::{FileFilter, FileUpdate};
use crate::shard::FileShard;

/// Size window, in bytes, within which a same-prefix name counts as a duplicate.
pub const DUPLICATE_SIZE_TOLERANCE: i64 = 100;

pub struct ShardedFileStore {
    shards: Vec<Arc<dyn FileShard>>,
    write_target: AtomicUsize,
    page_size: usize,
}

impl ShardedFileStore {
    /// Builds a store over `shards`, writing to `write_target` first.
    pub fn new(
        shards: Vec<Arc<dyn FileShard>>,
        write_target: usize,
    ) -> Result<Self, AutofilterError> {
        if shards.is_empty() {
            return Err(AutofilterError::Config(
                "sharded file store needs at least one shard".into(),
            ));
        }
        if write_target >= shards.len() {
            return Err(AutofilterError::ShardOutOfRange {
                index: write_target,
                shards: shards.len(),
            });
        }
        Ok(Self {
            shards,
            write_target: AtomicUsize::new(write_target),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Overrides how many rows a cursor fetches per shard round trip.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn write_target(&self) -> usize {
        self.write_target.load(Ordering::Acquire)
    }

    /// Operator override of the write target.
    pub fn set_write_target(&self, index: usize) -> Result<(), AutofilterError> {
        if index >= self.shards.len() {
            return Err(AutofilterError::ShardOutOfRange {
                index,
                shards: self.shards.len(),
            });
        }
        let previous = self.write_target.swap(index, Ordering::AcqRel);
        info!(from = previous, to = index, "write target set");
        Ok(())
    }

    /// Writes to the current target and returns the shard index used.
    pub async fn insert(&self, file: &File) -> Result<usize, AutofilterError> {
        let target = self.write_target();
        self.shards[target].insert(file).await?;
        Ok(target)
    }

    /// First match in shard order.
    pub async fn find_one(&self, filter: &FileFilter) -> Result<Option<File>, AutofilterError> {
        for shard in &self.shards {
            if let Some(file) = shard.find_one(filter).await? {
                return Ok(Some(file));
            }
        }
        Ok(None)
    }

    /// Lazy stream over every shard's matches, shard by shard.
    pub fn find(&self, filter: FileFilter) -> MultiCursor {
        MultiCursor::new(self.shards.clone(), filter, self.page_size)
    }

    /// Deletes the first match, stopping at the first shard that had one.
    pub async fn delete_one(&self, filter: &FileFilter) -> Result<u64, AutofilterError> {
        for shard in &self.shards {
            let n = shard.delete(filter, true).await?;
            if n > 0 {
                return Ok(n);
            }
        }
        Ok(0)
    }

    /// Updates the first match, stopping at the first shard that had one.
    pub async fn update_one(
        &self,
        filter: &FileFilter,
        update: &FileUpdate,
    ) -> Result<u64, AutofilterError> {
        for shard in &self.shards {
            let n = shard.update(filter, update, true).await?;
            if n > 0 {
                return Ok(n);
            }
        }
        Ok(0)
    }

    /// Deletes every match on every shard. Per-shard failures are collected
    /// into [`AutofilterError::PartialShardFailure`] after all shards ran.
    pub async fn delete_many(&self, filter: &FileFilter) -> Result<u64, AutofilterError> {
        let mut affected = 0;
        let mut failures = Vec::new();
        for shard in &self.shards {
            match shard.delete(filter, false).await {
                Ok(n) => affected += n,
                Err(e) => {
                    warn!(shard = shard.label(), error = %e, "delete_many failed on shard");
                    failures.push(format!("{}: {e}", shard.label()));
                }
            }
        }
        finish_fan_out(affected, failures)
    }

    /// Updates every match on every shard, like [`delete_many`](Self::delete_many).
    pub async fn update_many(
        &self,
        filter: &FileFilter,
        update: &FileUpdate,
    ) -> Result<u64, AutofilterError> {
        let mut affected = 0;
        let mut failures = Vec::new();
        for shard in &self.shards {
            match shard.update(filter, update, false).await {
                Ok(n) => affected += n,
                Err(e) => {
                    warn!(shard = shard.label(), error = %e, "update_many failed on shard");
                    failures.push(format!("{}: {e}", shard.label()));
                }
            }
        }
        finish_fan_out(affected, failures)
    }

    /// Approximate file count of every shard, in shard order.
    pub async fn estimated_counts(&self) -> Result<Vec<u64>, AutofilterError> {
        let mut counts = Vec::with_capacity(self.shards.len());
        for shard in &self.shards {
            counts.push(shard.estimated_count().await?);
        }
        Ok(counts)
    }

    pub async fn estimated_total(&self) -> Result<u64, AutofilterError> {
        Ok(self.estimated_counts().await?.iter().sum())
    }

    /// The shard the rebalancer would write to next: the smallest shard whose
    /// count is strictly below the current target's, or the current target.
    pub async fn preferred_target(&self) -> Result<usize, AutofilterError> {
        let current = self.write_target();
        let current_count = self.shards[current].estimated_count().await?;

        let mut best = (current, current_count);
        for (index, shard) in self.shards.iter().enumerate() {
            if index == current {
                continue;
            }
            match shard.estimated_count().await {
                Ok(count) if count < best.1 => best = (index, count),
                Ok(_) => {}
                Err(e) => {
                    warn!(shard = shard.label(), error = %e, "count failed; skipping shard");
                }
            }
        }
        Ok(best.0)
    }

    /// One rebalancer tick. Returns the new target when it changed.
    pub async fn rebalance_once(&self) -> Result<Option<usize>, AutofilterError> {
        let current = self.write_target();
        let preferred = self.preferred_target().await?;
        if preferred == current {
            debug!(target = current, "write target unchanged");
            return Ok(None);
        }
        // An operator override since the count started wins.
        match self.write_target.compare_exchange(
            current,
            preferred,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                info!(from = current, to = preferred, "write target rebalanced");
                Ok(Some(preferred))
            }
            Err(_) => Ok(None),
        }
    }

    /// Runs [`rebalance_once`](Self::rebalance_once) every `interval` until
    /// `cancel` fires.
    pub async fn run_rebalancer(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.rebalance_once().await {
                        warn!(error = %e, "rebalance pass failed");
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("rebalancer stopped");
                    break;
                }
            }
        }
    }

    /// Stores `file` unless a shard already holds the same handle, or a name
    /// starting with `file.name` whose size is within
    /// [`DUPLICATE_SIZE_TOLERANCE`] bytes.
    pub async fn save_file(&self, file: &File) -> Result<(), AutofilterError> {
        if self
            .find_one(&FileFilter::handle(&file.file_handle))
            .await?
            .is_some()
        {
            return Err(AutofilterError::DuplicateFile {
                name: file.name.clone(),
            });
        }

        let similar = FileFilter::all()
            .with_name_prefix(&file.name)
            .with_size_near(file.size, DUPLICATE_SIZE_TOLERANCE);
        if self.find_one(&similar).await?.is_some() {
            return Err(AutofilterError::DuplicateFile {
                name: file.name.clone(),
            });
        }

        let shard = self.insert(file).await?;
        debug!(name = %file.name, shard, "file saved");
        Ok(())
    }

    pub async fn get_file(&self, file_handle: &str) -> Result<Option<File>, AutofilterError> {
        self.find_one(&FileFilter::handle(file_handle)).await
    }

    /// Deletes the file with this handle. Returns `false` when none existed.
    pub async fn delete_file(&self, file_handle: &str) -> Result<bool, AutofilterError> {
        Ok(self.delete_one(&FileFilter::handle(file_handle)).await? > 0)
    }
}

fn finish_fan_out(affected: u64, failures: Vec<String>) -> Result<u64, AutofilterError> {
    if failures.is_empty() {
        Ok(affected)
    } else {
        Err(AutofilterError::PartialShardFailure { affected, failures })
    }
}

#[async_trait]
impl FileStore for ShardedFileStore {
    async fn save_file(&self, file: &File) -> Result<(), AutofilterError> {
        ShardedFileStore::save_file(self, file).await
    }
}
