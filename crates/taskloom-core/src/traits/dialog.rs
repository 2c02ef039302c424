// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialog session store seam.
//!
//! Keyed by Telegram user id. The default backend is in-process memory;
//! multi-instance deployments can plug in an external cache without
//! touching the handlers.

use async_trait::async_trait;

use crate::dialog::Dialog;

/// Get/set/clear of per-user dialog state.
#[async_trait]
pub trait DialogStore: Send + Sync {
    /// Current dialog for a user, if any.
    async fn get(&self, user_id: i64) -> Option<Dialog>;

    /// Replaces the user's dialog.
    async fn set(&self, user_id: i64, dialog: Dialog);

    /// Removes and returns the user's dialog atomically. Used by terminal
    /// steps so the side effect behind them fires at most once even under
    /// duplicate inputs.
    async fn take(&self, user_id: i64) -> Option<Dialog>;

    /// Drops the user's dialog, if any.
    async fn clear(&self, user_id: i64);
}
