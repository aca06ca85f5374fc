// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{AutofilterConfig, MAX_BATCH_SIZE};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates semantic constraints serde cannot express.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &AutofilterConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "app.log_level `{}` must be one of {}",
            config.app.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "telegram.bot_token must not be empty when set",
        ));
    }

    match (&config.protocol.app_id, &config.protocol.app_hash) {
        (Some(_), None) | (None, Some(_)) => errors.push(ConfigError::validation(
            "protocol.app_id and protocol.app_hash must be set together",
        )),
        (Some(id), Some(_)) if *id <= 0 => errors.push(ConfigError::validation(format!(
            "protocol.app_id must be positive, got {id}"
        ))),
        _ => {}
    }

    let storage = &config.storage;
    let paths = storage.shard_paths();
    if paths.iter().any(|p| p.trim().is_empty()) {
        errors.push(ConfigError::validation(
            "storage.database_path and storage.shards entries must not be empty",
        ));
    }

    let mut seen = HashSet::new();
    for path in &paths {
        if !seen.insert(path.as_str()) {
            errors.push(ConfigError::validation(format!(
                "storage shard path `{path}` is listed more than once"
            )));
        }
    }

    if storage.write_target >= paths.len() {
        errors.push(ConfigError::validation(format!(
            "storage.write_target {} is out of range for {} shard(s)",
            storage.write_target,
            paths.len()
        )));
    }

    if storage.rebalance_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "storage.rebalance_interval_secs must be greater than 0",
        ));
    }

    let index = &config.index;
    if index.batch_size == 0 || index.batch_size > MAX_BATCH_SIZE {
        errors.push(ConfigError::validation(format!(
            "index.batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
            index.batch_size
        )));
    }

    for (key, value) in [
        ("index.progress_interval_secs", index.progress_interval_secs),
        ("index.prompt_timeout_secs", index.prompt_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "{key} must be greater than 0"
            )));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
