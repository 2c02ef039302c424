// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common (shared) task queries.
//!
//! A shared task is exactly one row no matter how many users it targets;
//! per-user completion lives in common_progress, unique on
//! (task_id, user_name). Admin edits reuse the sheet-addressed task events
//! with the Common sheet title.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rusqlite::{OptionalExtension, params};
use taskloom_core::types::{COMMON_SHEET, due_to_string};
use taskloom_core::{ArchiveScope, CommonTask, OutboxEvent, TaskStatus, TaskloomError};

use crate::database::{Database, map_tr_err};
use crate::models::{due_from_sql, due_to_sql, now_string, parse_status, parse_ts};
use crate::queries::outbox;

const COMMON_COLUMNS: &str = "id, task_text, from_name, due_at, status, created_at";

fn common_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommonTask> {
    let due: Option<String> = row.get(3)?;
    let status: String = row.get(4)?;
    let created: String = row.get(5)?;
    Ok(CommonTask {
        id: row.get(0)?,
        text: row.get(1)?,
        from_name: row.get(2)?,
        due_at: due_from_sql(due.as_deref()),
        status: parse_status(4, &status)?,
        created_at: parse_ts(5, &created)?,
    })
}

/// Creates a shared TODO task and queues COMMON_CREATED. Returns the id.
pub async fn create(
    db: &Database,
    text: &str,
    from_name: &str,
    due_at: Option<NaiveDateTime>,
) -> Result<i64, TaskloomError> {
    let text = text.to_string();
    let from_name = from_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO common_tasks (task_text, from_name, due_at, status, created_at)
                 VALUES (?1, ?2, ?3, 'TODO', ?4)",
                params![text, from_name, due_to_sql(due_at), now_string()],
            )?;
            let id = tx.last_insert_rowid();
            outbox::append_tx(
                &tx,
                &OutboxEvent::CommonCreated {
                    task_id: id,
                    task: text.clone(),
                    from_name: from_name.clone(),
                    due: due_to_string(due_at),
                    status: TaskStatus::Todo,
                },
            )?;
            tx.commit()?;
            Ok(id)
        })
        .await
        .map_err(map_tr_err)
}

/// All shared tasks, newest first.
pub async fn list(db: &Database) -> Result<Vec<CommonTask>, TaskloomError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMMON_COLUMNS} FROM common_tasks ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map([], common_from_row)?;
            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row?);
            }
            Ok(tasks)
        })
        .await
        .map_err(map_tr_err)
}

/// One shared task by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<CommonTask>, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let task = conn
                .query_row(
                    &format!("SELECT {COMMON_COLUMNS} FROM common_tasks WHERE id = ?1"),
                    params![id],
                    common_from_row,
                )
                .optional()?;
            Ok(task)
        })
        .await
        .map_err(map_tr_err)
}

/// Marks a shared task DONE for one user and queues COMMON_PROGRESS.
/// Re-marking is an idempotent overwrite, not a second row.
pub async fn progress_set_done(
    db: &Database,
    task_id: i64,
    user_name: &str,
) -> Result<(), TaskloomError> {
    let user_name = user_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO common_progress (task_id, user_name, status, updated_at)
                 VALUES (?1, ?2, 'DONE', ?3)
                 ON CONFLICT (task_id, user_name)
                 DO UPDATE SET status = 'DONE', updated_at = excluded.updated_at",
                params![task_id, user_name, now_string()],
            )?;
            outbox::append_tx(
                &tx,
                &OutboxEvent::ProgressSet {
                    task_id,
                    user: user_name.clone(),
                    status: TaskStatus::Done,
                },
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Per-task progress status for one user, for building effective views.
pub async fn progress_map(
    db: &Database,
    user_name: &str,
) -> Result<HashMap<i64, TaskStatus>, TaskloomError> {
    let user_name = user_name.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT task_id, status FROM common_progress WHERE user_name = ?1",
            )?;
            let rows = stmt.query_map(params![user_name], |row| {
                let status: String = row.get(1)?;
                Ok((row.get::<_, i64>(0)?, parse_status(1, &status)?))
            })?;
            let mut map = HashMap::new();
            for row in rows {
                let (task_id, status) = row?;
                map.insert(task_id, status);
            }
            Ok(map)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of progress rows for one task, for inspection and tests.
pub async fn progress_count(db: &Database, task_id: i64) -> Result<i64, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM common_progress WHERE task_id = ?1",
                params![task_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

/// Changes a shared task's status, queuing TASK_STATUS on the Common sheet.
pub async fn set_status(
    db: &Database,
    id: i64,
    status: TaskStatus,
) -> Result<bool, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE common_tasks SET status = ?1 WHERE id = ?2",
                params![status.to_string(), id],
            )?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::StatusChanged {
                    sheet: COMMON_SHEET.to_string(),
                    task_id: id,
                    status,
                },
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Rewrites a shared task's text, queuing TASK_TEXT on the Common sheet.
pub async fn update_text(db: &Database, id: i64, text: &str) -> Result<bool, TaskloomError> {
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE common_tasks SET task_text = ?1 WHERE id = ?2",
                params![text, id],
            )?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::TextChanged {
                    sheet: COMMON_SHEET.to_string(),
                    task_id: id,
                    task: text.clone(),
                },
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Rewrites a shared task's due date, queuing TASK_DUE on the Common sheet.
pub async fn update_due(
    db: &Database,
    id: i64,
    due_at: Option<NaiveDateTime>,
) -> Result<bool, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE common_tasks SET due_at = ?1 WHERE id = ?2",
                params![due_to_sql(due_at), id],
            )?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::DueChanged {
                    sheet: COMMON_SHEET.to_string(),
                    task_id: id,
                    due: due_to_string(due_at),
                },
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes a shared task (progress rows cascade), queuing TASK_DELETE.
pub async fn delete(db: &Database, id: i64) -> Result<bool, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute("DELETE FROM common_tasks WHERE id = ?1", params![id])?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::TaskDeleted {
                    sheet: COMMON_SHEET.to_string(),
                    task_id: id,
                },
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Archives every DONE shared task with a due date strictly before
/// `cutoff`, queuing one TASK_ARCHIVE_BATCH summary event.
pub async fn archive_done_before(
    db: &Database,
    cutoff: NaiveDateTime,
) -> Result<usize, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let cutoff_str = due_to_string(Some(cutoff));
            let n = tx.execute(
                "UPDATE common_tasks SET status = 'ARCHIVE'
                 WHERE status = 'DONE' AND due_at IS NOT NULL AND due_at < ?1",
                params![cutoff_str],
            )?;
            if n > 0 {
                outbox::append_tx(
                    &tx,
                    &OutboxEvent::ArchiveBatch {
                        cutoff: cutoff_str,
                        scope: ArchiveScope::Common,
                    },
                )?;
            }
            tx.commit()?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}
