// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline CLI reports: `check`, `operations` and `shards`.
//!
//! Each command opens the configured databases (running pending
//! migrations), prints its report and closes them again.

use std::fmt::Write as _;

use autofilter_config::AutofilterConfig;
use autofilter_core::{AutofilterError, Operation, OperationStore};
use autofilter_storage::Stores;

/// `autofilter check`: every database opens and migrates; shard counts.
pub async fn run_check(config: &AutofilterConfig) -> Result<(), AutofilterError> {
    let stores = Stores::open(&config.storage).await?;
    let paths: Vec<String> = stores.databases().iter().map(|db| db.path().to_string()).collect();
    let counts = stores.files.estimated_counts().await?;
    let operations = stores.operations.list(None).await?;
    print!("{}", render_check(&paths, &counts, &operations));
    stores.shutdown().await
}

/// `autofilter operations [--json]`: persisted index operations.
pub async fn run_operations(config: &AutofilterConfig, json: bool) -> Result<(), AutofilterError> {
    let stores = Stores::open(&config.storage).await?;
    let operations = stores.operations.list(None).await?;
    if json {
        println!("{}", render_operations_json(&operations)?);
    } else {
        print!("{}", render_operations(&operations));
    }
    stores.shutdown().await
}

/// `autofilter shards`: per-shard counts, the configured write target and
/// the shard the rebalancer would pick.
pub async fn run_shards(config: &AutofilterConfig) -> Result<(), AutofilterError> {
    let stores = Stores::open(&config.storage).await?;
    let counts = stores.files.estimated_counts().await?;
    let preferred = stores.files.preferred_target().await?;
    print!(
        "{}",
        render_shards(&counts, stores.files.write_target(), preferred)
    );
    stores.shutdown().await
}

pub fn render_check(paths: &[String], counts: &[u64], operations: &[Operation]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  autofilter check");
    let _ = writeln!(out, "  {}", "-".repeat(35));
    for (index, path) in paths.iter().enumerate() {
        let count = counts.get(index).copied().unwrap_or_default();
        let _ = writeln!(out, "    [OK] shard {index}: {path} ({count} files)");
    }
    let paused = operations.iter().filter(|op| op.is_paused).count();
    let _ = writeln!(
        out,
        "    operations: {} active, {paused} paused",
        operations.len() - paused
    );
    out
}

pub fn render_operations(operations: &[Operation]) -> String {
    if operations.is_empty() {
        return "no index operations\n".to_string();
    }
    let mut out = String::new();
    for op in operations {
        let state = if op.is_paused { "paused" } else { "active" };
        let _ = writeln!(
            out,
            "{}  {state:<6}  channel {}  at {} of {}..={}  saved {}  failed {}",
            op.id, op.channel_id, op.current_id, op.start_id, op.end_id, op.saved, op.failed
        );
    }
    out
}

pub fn render_operations_json(operations: &[Operation]) -> Result<String, AutofilterError> {
    serde_json::to_string_pretty(operations)
        .map_err(|e| AutofilterError::Internal(format!("failed to encode operations: {e}")))
}

pub fn render_shards(counts: &[u64], write_target: usize, preferred: usize) -> String {
    let mut out = String::new();
    for (index, count) in counts.iter().enumerate() {
        let marker = if index == write_target { "*" } else { " " };
        let _ = writeln!(out, "{marker} shard {index}: {count} files");
    }
    let _ = writeln!(out, "total: {} files", counts.iter().sum::<u64>());
    if preferred == write_target {
        let _ = writeln!(out, "write target: shard {write_target}");
    } else {
        let _ = writeln!(
            out,
            "write target: shard {write_target} (rebalancer would move to shard {preferred})"
        );
    }
    out
}
