// SPDX-FileCopyrightText: 2026 Autofilter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./autofilter.toml` > `~/.config/autofilter/autofilter.toml`
//! > `/etc/autofilter/autofilter.toml`, with `AUTOFILTER_` environment
//! variables overriding all files.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::AutofilterConfig;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AUTOFILTER_";

/// Config sections that environment keys may address.
const SECTIONS: &[&str] = &["app", "telegram", "protocol", "storage", "index"];

/// Candidate config files, lowest precedence first.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("/etc/autofilter/autofilter.toml")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("autofilter").join("autofilter.toml"));
    }
    files.push(PathBuf::from("autofilter.toml"));
    files
}

/// Build the Figment for the standard hierarchy (exposed for diagnostics).
pub fn build_figment() -> Figment {
    config_file_candidates()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(AutofilterConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<AutofilterConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<AutofilterConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutofilterConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AutofilterConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AutofilterConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Maps `AUTOFILTER_STORAGE_DATABASE_PATH` to `storage.database_path`.
///
/// Only the first underscore after a known section name becomes a dot;
/// key names keep their own underscores.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|field| format!("{section}.{field}"))
            })
            .unwrap_or(key_str)
            .into()
    })
}
