// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types and row-mapping helpers for storage entities.
//!
//! The canonical types live in `taskloom-core::types` for use across trait
//! boundaries; this module re-exports them and adds the TEXT-column
//! conversions shared by the query modules.

use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;

pub use taskloom_core::types::{
    CommonProgress, CommonTask, OutboxRow, PersonalTask, TaskStatus, User,
};
use taskloom_core::types::{due_from_string, due_to_string};

/// Storage format for row timestamps (created_at, updated_at, processed_at).
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in storage format.
pub(crate) fn now_string() -> String {
    Utc::now().naive_utc().format(TS_FORMAT).to_string()
}

fn conversion_err(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub(crate) fn parse_ts(idx: usize, s: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_ts_opt(
    idx: usize,
    s: Option<&str>,
) -> Result<Option<NaiveDateTime>, rusqlite::Error> {
    s.map(|s| parse_ts(idx, s)).transpose()
}

pub(crate) fn parse_status(idx: usize, s: &str) -> Result<TaskStatus, rusqlite::Error> {
    TaskStatus::from_str(s).map_err(|e| conversion_err(idx, e))
}

/// Due timestamps use the shorter wire format (`YYYY-MM-DD HH:MM`), NULL
/// when unset.
pub(crate) fn due_to_sql(due_at: Option<NaiveDateTime>) -> Option<String> {
    due_at.map(|d| due_to_string(Some(d)))
}

pub(crate) fn due_from_sql(s: Option<&str>) -> Option<NaiveDateTime> {
    s.and_then(due_from_string)
}
