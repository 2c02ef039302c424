// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the taskloom task bot.
//!
//! Layered TOML loading with `TASKLOOM_*` environment overrides, strict
//! unknown-key rejection, and startup validation.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TaskloomConfig;

use std::path::Path;

use taskloom_core::TaskloomError;

/// Loads configuration from the standard hierarchy and validates it.
pub fn load_and_validate() -> Result<TaskloomConfig, TaskloomError> {
    let config = load_config().map_err(|e| TaskloomError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from an explicit file (plus env overrides) and
/// validates it. Backs the binary's `--config` flag.
pub fn load_and_validate_from(path: &Path) -> Result<TaskloomConfig, TaskloomError> {
    let config = load_config_from_path(path).map_err(|e| TaskloomError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
