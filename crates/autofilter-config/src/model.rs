// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level autofilter configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections default to usable values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutofilterConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Low-level protocol client credentials.
    #[serde(default)]
    pub protocol: ProtocolConfig,

    /// Operation table and file shard databases.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Index run tuning.
    #[serde(default)]
    pub index: IndexConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "autofilter".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. Also used to log the protocol client in.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user ids allowed to drive index operations.
    #[serde(default)]
    pub admins: Vec<i64>,
}

/// Protocol client credentials. Both fields are set together or not at all;
/// when unset the client falls back to its built-in application.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    #[serde(default)]
    pub app_id: Option<i32>,

    #[serde(default)]
    pub app_hash: Option<String>,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Primary database: operation table and file shard 0.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Additional file shard databases, in shard order (shard 1, 2, ...).
    #[serde(default)]
    pub shards: Vec<String>,

    /// Shard receiving new files at startup.
    #[serde(default)]
    pub write_target: usize,

    /// Seconds between write-target rebalancing passes.
    #[serde(default = "default_rebalance_interval_secs")]
    pub rebalance_interval_secs: u64,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            shards: Vec::new(),
            write_target: 0,
            rebalance_interval_secs: default_rebalance_interval_secs(),
            wal_mode: true,
        }
    }
}

impl StorageConfig {
    /// Every shard database path, primary first.
    pub fn shard_paths(&self) -> Vec<String> {
        std::iter::once(self.database_path.clone())
            .chain(self.shards.iter().cloned())
            .collect()
    }

    pub fn rebalance_interval(&self) -> Duration {
        Duration::from_secs(self.rebalance_interval_secs)
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("autofilter").join("autofilter.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("autofilter.db"))
        .display()
        .to_string()
}

fn default_rebalance_interval_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

/// Index run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Message ids requested per history fetch (1..=200).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Seconds between checkpoint pushes and progress edits.
    #[serde(default = "default_progress_interval_secs")]
    pub progress_interval_secs: u64,

    /// Seconds an operator prompt waits for an answer.
    #[serde(default = "default_prompt_timeout_secs")]
    pub prompt_timeout_secs: u64,

    /// Seconds to wait on a rate-limit error whose wait cannot be parsed.
    #[serde(default = "default_flood_wait_fallback_secs")]
    pub flood_wait_fallback_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_interval_secs: default_progress_interval_secs(),
            prompt_timeout_secs: default_prompt_timeout_secs(),
            flood_wait_fallback_secs: default_flood_wait_fallback_secs(),
        }
    }
}

/// Largest batch the protocol accepts in a single history request.
pub const MAX_BATCH_SIZE: usize = 200;

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_progress_interval_secs() -> u64 {
    10
}

fn default_prompt_timeout_secs() -> u64 {
    300
}

fn default_flood_wait_fallback_secs() -> u64 {
    5
}
