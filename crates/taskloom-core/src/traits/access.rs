// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access policy seam.
//!
//! Constructed once at process start from configuration and passed
//! explicitly into the command layer. Handlers never consult ambient
//! globals for authorization.

/// Membership checks for the team allow-list and the admin set.
pub trait AccessPolicy: Send + Sync {
    /// Whether this Telegram user may talk to the bot at all.
    fn is_allowed(&self, telegram_id: i64) -> bool;

    /// Whether this Telegram user may use admin commands.
    fn is_admin(&self, telegram_id: i64) -> bool;
}
