// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static access policy built from configuration.
//!
//! Empty allow-list plus empty admin set rejects everyone (secure
//! default). Admins are implicitly allowed.

use std::collections::HashSet;

use taskloom_config::model::BotConfig;
use taskloom_core::AccessPolicy;

/// Allow-list and admin set fixed at process start.
#[derive(Debug, Clone)]
pub struct StaticAccessPolicy {
    allowed: HashSet<i64>,
    admins: HashSet<i64>,
}

impl StaticAccessPolicy {
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            allowed: config.allowed_ids.iter().copied().collect(),
            admins: config.admin_ids.iter().copied().collect(),
        }
    }
}

impl AccessPolicy for StaticAccessPolicy {
    fn is_allowed(&self, telegram_id: i64) -> bool {
        self.allowed.contains(&telegram_id) || self.admins.contains(&telegram_id)
    }

    fn is_admin(&self, telegram_id: i64) -> bool {
        self.admins.contains(&telegram_id)
    }
}
