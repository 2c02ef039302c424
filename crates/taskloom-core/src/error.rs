// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the taskloom task bot.

use thiserror::Error;

/// The primary error type used across all taskloom crates.
#[derive(Debug, Error)]
pub enum TaskloomError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable store errors (database connection, query failure, migration failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Telegram channel errors (connection failure, send failure, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Mirror (spreadsheet) errors. Never authoritative: these are recorded
    /// on the offending outbox event and retried on the next drain.
    #[error("mirror error: {message}")]
    Mirror {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TaskloomError {
    /// Shorthand for a mirror error without an underlying source.
    pub fn mirror(message: impl Into<String>) -> Self {
        TaskloomError::Mirror {
            message: message.into(),
            source: None,
        }
    }
}
