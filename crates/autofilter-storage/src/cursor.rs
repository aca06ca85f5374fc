// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lazy cursor chaining per-shard result sets.

use std::collections::VecDeque;
use std::sync::Arc;

use autofilter_core::{AutofilterError, File};

use crate::filter::FileFilter;
use crate::shard::FileShard;

/// Rows fetched from one shard per round trip.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A single ordered stream over every shard's matches.
///
/// One shard is drained completely before the next is queried. Once
/// exhausted, the cursor returns `None` without touching any shard again.
pub struct MultiCursor {
    shards: Vec<Arc<dyn FileShard>>,
    filter: FileFilter,
    page_size: usize,
    shard: usize,
    after: i64,
    buffer: VecDeque<File>,
    exhausted: bool,
}

impl MultiCursor {
    pub(crate) fn new(shards: Vec<Arc<dyn FileShard>>, filter: FileFilter, page_size: usize) -> Self {
        Self {
            shards,
            filter,
            page_size: page_size.max(1),
            shard: 0,
            after: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Next matching file, or `None` once every shard is drained.
    pub async fn advance(&mut self) -> Result<Option<File>, AutofilterError> {
        loop {
            if let Some(file) = self.buffer.pop_front() {
                return Ok(Some(file));
            }
            if self.exhausted {
                return Ok(None);
            }
            let Some(shard) = self.shards.get(self.shard) else {
                self.exhausted = true;
                return Ok(None);
            };

            let page = shard
                .find_page(&self.filter, self.after, self.page_size)
                .await?;
            let short = page.len() < self.page_size;
            if let Some((position, _)) = page.last() {
                self.after = *position;
            }
            self.buffer.extend(page.into_iter().map(|(_, file)| file));

            if short {
                self.shard += 1;
                self.after = 0;
            }
        }
    }

    /// Drains the cursor.
    pub async fn collect_all(mut self) -> Result<Vec<File>, AutofilterError> {
        let mut files = Vec::new();
        while let Some(file) = self.advance().await? {
            files.push(file);
        }
        Ok(files)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buffer.is_empty()
    }
}
