// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox event payloads as a closed sum type.
//!
//! Every mutating durable-store operation appends exactly one of these
//! events in the same transaction as the row mutation. The sync worker
//! decodes and dispatches them with an exhaustive match, so adding an event
//! type is a compile-time-checked change rather than a string fallthrough.
//!
//! Wire format (stored in the outbox `payload` column):
//! `{"event_type": "TASK_STATUS", "payload": {"sheet": ..., ...}}`

use serde::{Deserialize, Serialize};

use crate::types::TaskStatus;

/// Which table a batch archive sweep covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveScope {
    Personal,
    Common,
}

/// A change event queued for mirror replay.
///
/// Payload fields carry everything the mirror needs to apply the change
/// without re-querying the durable store. `sheet` is the assignee display
/// name (per-user sheets are addressed by name), `due` uses the
/// `YYYY-MM-DD HH:MM` wire format with empty meaning unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "payload")]
pub enum OutboxEvent {
    #[serde(rename = "USER_UPSERT")]
    UserUpsert { name: String, telegram_id: i64 },

    #[serde(rename = "USER_DELETE")]
    UserDelete { name: String, telegram_id: i64 },

    #[serde(rename = "TASK_CREATED")]
    TaskCreated {
        sheet: String,
        task_id: i64,
        task: String,
        from_name: String,
        due: String,
        status: TaskStatus,
    },

    #[serde(rename = "TASK_STATUS")]
    StatusChanged {
        sheet: String,
        task_id: i64,
        status: TaskStatus,
    },

    #[serde(rename = "TASK_TEXT")]
    TextChanged {
        sheet: String,
        task_id: i64,
        task: String,
    },

    #[serde(rename = "TASK_DUE")]
    DueChanged {
        sheet: String,
        task_id: i64,
        due: String,
    },

    #[serde(rename = "TASK_DELETE")]
    TaskDeleted { sheet: String, task_id: i64 },

    #[serde(rename = "COMMON_CREATED")]
    CommonCreated {
        task_id: i64,
        task: String,
        from_name: String,
        due: String,
        status: TaskStatus,
    },

    #[serde(rename = "COMMON_PROGRESS")]
    ProgressSet {
        task_id: i64,
        user: String,
        status: TaskStatus,
    },

    #[serde(rename = "TASK_ARCHIVE_BATCH")]
    ArchiveBatch {
        cutoff: String,
        #[serde(rename = "type")]
        scope: ArchiveScope,
    },
}

impl OutboxEvent {
    /// The wire tag, duplicated into the outbox `event_type` column.
    pub fn event_type(&self) -> &'static str {
        match self {
            OutboxEvent::UserUpsert { .. } => "USER_UPSERT",
            OutboxEvent::UserDelete { .. } => "USER_DELETE",
            OutboxEvent::TaskCreated { .. } => "TASK_CREATED",
            OutboxEvent::StatusChanged { .. } => "TASK_STATUS",
            OutboxEvent::TextChanged { .. } => "TASK_TEXT",
            OutboxEvent::DueChanged { .. } => "TASK_DUE",
            OutboxEvent::TaskDeleted { .. } => "TASK_DELETE",
            OutboxEvent::CommonCreated { .. } => "COMMON_CREATED",
            OutboxEvent::ProgressSet { .. } => "COMMON_PROGRESS",
            OutboxEvent::ArchiveBatch { .. } => "TASK_ARCHIVE_BATCH",
        }
    }

    /// Serializes the tagged envelope for the outbox payload column.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes an outbox payload column back into an event.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
