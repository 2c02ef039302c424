// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./taskloom.toml` > `~/.config/taskloom/taskloom.toml`
//! > `/etc/taskloom/taskloom.toml` with environment variable overrides via
//! the `TASKLOOM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TaskloomConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/taskloom/taskloom.toml` (system-wide)
/// 3. `~/.config/taskloom/taskloom.toml` (user XDG config)
/// 4. `./taskloom.toml` (local directory)
/// 5. `TASKLOOM_*` environment variables
pub fn load_config() -> Result<TaskloomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskloomConfig::default()))
        .merge(Toml::file("/etc/taskloom/taskloom.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("taskloom/taskloom.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("taskloom.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TaskloomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskloomConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TaskloomConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskloomConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing
/// key names stay intact: `TASKLOOM_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TASKLOOM_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("bot_", "bot.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("mirror_", "mirror.", 1)
            .replacen("archive_", "archive.", 1);
        mapped.into()
    })
}
