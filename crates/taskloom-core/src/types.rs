// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types shared across the taskloom crates.
//!
//! The durable store (SQLite) owns the authoritative rows defined here; the
//! spreadsheet mirror only ever receives derived copies through the outbox.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Sheet title for the user index in the mirror.
pub const USERS_SHEET: &str = "Users";
/// Sheet title for shared tasks in the mirror.
pub const COMMON_SHEET: &str = "Common";
/// Sheet title for the per-user completion log of shared tasks.
pub const COMMON_PROGRESS_SHEET: &str = "CommonProgress";

/// Column headers for per-user task sheets and the Common sheet.
pub const TASK_HEADERS: [&str; 6] = ["TaskID", "Task", "From", "Due", "Status", "CreatedAt"];
/// Column headers for the Users sheet.
pub const USERS_HEADERS: [&str; 2] = ["Name", "TelegramID"];
/// Column headers for the CommonProgress sheet.
pub const COMMON_PROGRESS_HEADERS: [&str; 4] = ["TaskID", "Name", "Status", "DoneAt"];

/// Lifecycle status of a task.
///
/// `Archive` is terminal and always wins over per-user completion when
/// computing an effective view (see [`crate::view`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Todo,
    Done,
    Archive,
}

/// Filter mode for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FilterMode {
    /// Active tasks: excludes effective-DONE and ARCHIVE.
    My,
    /// Only effective-DONE tasks.
    Done,
    /// Active tasks with a due date in the past.
    Overdue,
    /// Everything except ARCHIVE.
    All,
}

/// A registered team member. The display name doubles as the mirror sheet
/// title, so it is unique alongside the Telegram id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// A task owned by exactly one user, addressed by display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonalTask {
    pub id: i64,
    pub assignee_name: String,
    pub text: String,
    pub from_name: String,
    pub due_at: Option<NaiveDateTime>,
    pub status: TaskStatus,
    pub created_at: NaiveDateTime,
}

/// A shared task. Exactly one row regardless of how many users it targets;
/// per-user completion lives in [`CommonProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonTask {
    pub id: i64,
    pub text: String,
    pub from_name: String,
    pub due_at: Option<NaiveDateTime>,
    pub status: TaskStatus,
    pub created_at: NaiveDateTime,
}

/// One user's completion state against a shared task.
/// Unique on (task_id, user_name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonProgress {
    pub id: i64,
    pub task_id: i64,
    pub user_name: String,
    pub status: TaskStatus,
    pub updated_at: NaiveDateTime,
}

/// A row of the outbox queue as stored. The payload column holds the
/// serialized [`crate::event::OutboxEvent`]; `event_type` is denormalized
/// for indexing and operator inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRow {
    pub id: i64,
    pub event_type: String,
    pub payload: String,
    pub created_at: NaiveDateTime,
    pub processed_at: Option<NaiveDateTime>,
    pub error: Option<String>,
}

/// A task projected for display: either a personal task or a common task
/// with per-user effective status applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task_id: i64,
    pub text: String,
    pub from_name: String,
    pub due_at: Option<NaiveDateTime>,
    pub status: TaskStatus,
    pub is_common: bool,
}

/// Wire/display format for due timestamps: `YYYY-MM-DD HH:MM`, empty when unset.
pub const DUE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Formats an optional due timestamp for payloads and display.
pub fn due_to_string(due_at: Option<NaiveDateTime>) -> String {
    match due_at {
        Some(due) => due.format(DUE_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Parses a due string produced by [`due_to_string`] or entered as a bare
/// `YYYY-MM-DD` date. Empty input means no due date.
pub fn due_from_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, DUE_FORMAT) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
