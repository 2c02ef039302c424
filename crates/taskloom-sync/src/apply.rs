// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies one decoded outbox event to the mirror workbook.
//!
//! Every handler is idempotent: creates find-or-append by key, edits
//! rewrite cells in place, deletes tolerate an already-missing row. An
//! edit whose target row is missing is an error, which leaves the event
//! pending for retry after the mirror heals.

use chrono::NaiveDateTime;
use taskloom_core::types::{
    COMMON_PROGRESS_SHEET, COMMON_SHEET, TASK_HEADERS, USERS_HEADERS, USERS_SHEET, due_from_string,
};
use taskloom_core::{ArchiveScope, OutboxEvent, SheetStore, TaskStatus, TaskloomError};
use taskloom_storage::models::TS_FORMAT;

// 1-based columns of the task sheets (TaskID, Task, From, Due, Status, CreatedAt).
const COL_TASK_ID: usize = 1;
const COL_TASK_TEXT: usize = 2;
const COL_DUE: usize = 4;
const COL_STATUS: usize = 5;

/// Applies `event` to the workbook. `queued_at` fills CreatedAt/DoneAt
/// cells; `user_sheets` names the per-user sheets an archive sweep visits.
pub async fn apply_event(
    sheets: &dyn SheetStore,
    event: &OutboxEvent,
    queued_at: NaiveDateTime,
    user_sheets: &[String],
) -> Result<(), TaskloomError> {
    match event {
        OutboxEvent::UserUpsert { name, telegram_id } => {
            apply_user_upsert(sheets, name, *telegram_id).await
        }
        OutboxEvent::UserDelete { telegram_id, .. } => {
            apply_user_delete(sheets, *telegram_id).await
        }
        OutboxEvent::TaskCreated {
            sheet,
            task_id,
            task,
            from_name,
            due,
            status,
        } => {
            apply_task_created(sheets, sheet, *task_id, task, from_name, due, *status, queued_at)
                .await
        }
        OutboxEvent::StatusChanged {
            sheet,
            task_id,
            status,
        } => update_task_cell(sheets, sheet, *task_id, COL_STATUS, &status.to_string()).await,
        OutboxEvent::TextChanged {
            sheet,
            task_id,
            task,
        } => update_task_cell(sheets, sheet, *task_id, COL_TASK_TEXT, task).await,
        OutboxEvent::DueChanged {
            sheet,
            task_id,
            due,
        } => update_task_cell(sheets, sheet, *task_id, COL_DUE, due).await,
        OutboxEvent::TaskDeleted { sheet, task_id } => {
            apply_task_deleted(sheets, sheet, *task_id).await
        }
        OutboxEvent::CommonCreated {
            task_id,
            task,
            from_name,
            due,
            status,
        } => {
            apply_task_created(
                sheets,
                COMMON_SHEET,
                *task_id,
                task,
                from_name,
                due,
                *status,
                queued_at,
            )
            .await
        }
        OutboxEvent::ProgressSet {
            task_id,
            user,
            status,
        } => apply_progress(sheets, *task_id, user, *status, queued_at).await,
        OutboxEvent::ArchiveBatch { cutoff, scope } => {
            apply_archive_batch(sheets, cutoff, *scope, user_sheets).await
        }
    }
}

/// Finds the 1-based row whose `key_col` cell equals `key`, skipping the
/// header row.
async fn find_row_by_key(
    sheets: &dyn SheetStore,
    title: &str,
    key_col: usize,
    key: &str,
) -> Result<Option<usize>, TaskloomError> {
    let rows = sheets.rows(title).await?;
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.get(key_col - 1).map(String::as_str) == Some(key) {
            return Ok(Some(i + 1));
        }
    }
    Ok(None)
}

async fn apply_user_upsert(
    sheets: &dyn SheetStore,
    name: &str,
    telegram_id: i64,
) -> Result<(), TaskloomError> {
    sheets.ensure_sheet(USERS_SHEET, &USERS_HEADERS).await?;
    let values = vec![name.to_string(), telegram_id.to_string()];
    // Match by telegram id first (rename), then by name (re-bind).
    let row = match find_row_by_key(sheets, USERS_SHEET, 2, &telegram_id.to_string()).await? {
        Some(row) => Some(row),
        None => find_row_by_key(sheets, USERS_SHEET, 1, name).await?,
    };
    match row {
        Some(row) => sheets.update_row(USERS_SHEET, row, &values).await?,
        None => sheets.append_row(USERS_SHEET, &values).await?,
    }
    sheets.ensure_sheet(name, &TASK_HEADERS).await
}

async fn apply_user_delete(sheets: &dyn SheetStore, telegram_id: i64) -> Result<(), TaskloomError> {
    match find_row_by_key(sheets, USERS_SHEET, 2, &telegram_id.to_string()).await? {
        Some(row) => sheets.delete_row(USERS_SHEET, row).await,
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn apply_task_created(
    sheets: &dyn SheetStore,
    sheet: &str,
    task_id: i64,
    task: &str,
    from_name: &str,
    due: &str,
    status: TaskStatus,
    queued_at: NaiveDateTime,
) -> Result<(), TaskloomError> {
    sheets.ensure_sheet(sheet, &TASK_HEADERS).await?;
    let values = vec![
        task_id.to_string(),
        task.to_string(),
        from_name.to_string(),
        due.to_string(),
        status.to_string(),
        queued_at.format(TS_FORMAT).to_string(),
    ];
    match find_row_by_key(sheets, sheet, COL_TASK_ID, &task_id.to_string()).await? {
        Some(row) => sheets.update_row(sheet, row, &values).await,
        None => sheets.append_row(sheet, &values).await,
    }
}

async fn update_task_cell(
    sheets: &dyn SheetStore,
    sheet: &str,
    task_id: i64,
    col: usize,
    value: &str,
) -> Result<(), TaskloomError> {
    let row = find_row_by_key(sheets, sheet, COL_TASK_ID, &task_id.to_string())
        .await?
        .ok_or_else(|| {
            TaskloomError::mirror(format!("task {task_id} not found in sheet {sheet}"))
        })?;
    sheets.update_cell(sheet, row, col, value).await
}

async fn apply_task_deleted(
    sheets: &dyn SheetStore,
    sheet: &str,
    task_id: i64,
) -> Result<(), TaskloomError> {
    match find_row_by_key(sheets, sheet, COL_TASK_ID, &task_id.to_string()).await? {
        Some(row) => sheets.delete_row(sheet, row).await,
        None => Ok(()),
    }
}

async fn apply_progress(
    sheets: &dyn SheetStore,
    task_id: i64,
    user: &str,
    status: TaskStatus,
    queued_at: NaiveDateTime,
) -> Result<(), TaskloomError> {
    let values = vec![
        task_id.to_string(),
        user.to_string(),
        status.to_string(),
        queued_at.format(TS_FORMAT).to_string(),
    ];
    // Composite key (TaskID, Name): re-marking overwrites in place.
    let rows = sheets.rows(COMMON_PROGRESS_SHEET).await?;
    let found = rows.iter().enumerate().skip(1).find(|(_, row)| {
        row.first().map(String::as_str) == Some(values[0].as_str())
            && row.get(1).map(String::as_str) == Some(user)
    });
    match found {
        Some((i, _)) => sheets.update_row(COMMON_PROGRESS_SHEET, i + 1, &values).await,
        None => sheets.append_row(COMMON_PROGRESS_SHEET, &values).await,
    }
}

/// Re-runs the archive decision against the mirror: every DONE row with a
/// due date strictly before the cutoff flips to ARCHIVE.
async fn apply_archive_batch(
    sheets: &dyn SheetStore,
    cutoff: &str,
    scope: ArchiveScope,
    user_sheets: &[String],
) -> Result<(), TaskloomError> {
    let cutoff = due_from_string(cutoff)
        .ok_or_else(|| TaskloomError::mirror(format!("unparsable archive cutoff: {cutoff:?}")))?;
    let common = [COMMON_SHEET.to_string()];
    let targets: &[String] = match scope {
        ArchiveScope::Personal => user_sheets,
        ArchiveScope::Common => &common,
    };
    for sheet in targets {
        let rows = sheets.rows(sheet).await?;
        for (i, row) in rows.iter().enumerate().skip(1) {
            let status = row.get(COL_STATUS - 1).map(String::as_str);
            if status != Some("DONE") {
                continue;
            }
            let due = row
                .get(COL_DUE - 1)
                .map(String::as_str)
                .and_then(due_from_string);
            if due.is_some_and(|d| d < cutoff) {
                sheets
                    .update_cell(sheet, i + 1, COL_STATUS, &TaskStatus::Archive.to_string())
                    .await?;
            }
        }
    }
    Ok(())
}
