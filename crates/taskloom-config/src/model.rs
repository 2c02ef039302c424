// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};
use taskloom_core::TaskloomError;

/// Top-level taskloom configuration.
///
/// Loaded from TOML files with environment variable overrides. All sections
/// are optional and default to sensible values; the bot token is the only
/// setting `serve` cannot run without.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskloomConfig {
    /// Telegram bot settings and access lists.
    #[serde(default)]
    pub bot: BotConfig,

    /// Durable store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Spreadsheet mirror and sync worker settings.
    #[serde(default)]
    pub mirror: MirrorConfig,

    /// Monthly archive sweep settings.
    #[serde(default)]
    pub archive: ArchiveConfig,
}

impl TaskloomConfig {
    /// Startup validation beyond what serde can express.
    pub fn validate(&self) -> Result<(), TaskloomError> {
        if self.mirror.enabled {
            if self.mirror.spreadsheet_id.as_deref().unwrap_or("").is_empty() {
                return Err(TaskloomError::Config(
                    "mirror.spreadsheet_id is required when mirror.enabled = true".into(),
                ));
            }
            if self.mirror.api_token.as_deref().unwrap_or("").is_empty() {
                return Err(TaskloomError::Config(
                    "mirror.api_token is required when mirror.enabled = true".into(),
                ));
            }
        }
        if self.mirror.sync_interval_secs == 0 {
            return Err(TaskloomError::Config(
                "mirror.sync_interval_secs must be positive".into(),
            ));
        }
        if self.mirror.batch_limit == 0 {
            return Err(TaskloomError::Config(
                "mirror.batch_limit must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Telegram Bot API token. `None` disables the interactive bot.
    #[serde(default)]
    pub token: Option<String>,

    /// Telegram user ids allowed to use the bot. Empty rejects everyone.
    #[serde(default)]
    pub allowed_ids: Vec<i64>,

    /// Telegram user ids allowed to use admin commands. Admins are
    /// implicitly allowed.
    #[serde(default)]
    pub admin_ids: Vec<i64>,
}

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "taskloom.db".to_string()
}

/// Spreadsheet mirror configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    /// Whether the sync worker mirrors into a real spreadsheet. When false
    /// the outbox still accumulates and `serve` drains into an in-memory
    /// workbook (useful for local runs).
    #[serde(default)]
    pub enabled: bool,

    /// Google Sheets spreadsheet id.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// OAuth bearer token with spreadsheets scope. Minting and refreshing
    /// the token is external to the bot.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Seconds between drain passes.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    /// Maximum outbox events replayed per drain pass.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spreadsheet_id: None,
            api_token: None,
            sync_interval_secs: default_sync_interval_secs(),
            batch_limit: default_batch_limit(),
        }
    }
}

fn default_sync_interval_secs() -> u64 {
    60
}

fn default_batch_limit() -> usize {
    200
}

/// Monthly archive sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Cron expression for the sweep schedule (minute hour dom month dow).
    #[serde(default = "default_archive_cron")]
    pub cron: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            cron: default_archive_cron(),
        }
    }
}

fn default_archive_cron() -> String {
    // 05:00 on the first day of every month.
    "0 5 1 * *".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TaskloomConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mirror.sync_interval_secs, 60);
        assert_eq!(config.mirror.batch_limit, 200);
        assert_eq!(config.storage.database_path, "taskloom.db");
        assert!(config.bot.token.is_none());
    }

    #[test]
    fn enabled_mirror_requires_credentials() {
        let mut config = TaskloomConfig::default();
        config.mirror.enabled = true;
        assert!(config.validate().is_err());

        config.mirror.spreadsheet_id = Some("sheet-id".into());
        assert!(config.validate().is_err());

        config.mirror.api_token = Some("token".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = TaskloomConfig::default();
        config.mirror.sync_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
