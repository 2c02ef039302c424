// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Personal task queries.
//!
//! Tasks are addressed by (assignee display name, id); the name keys the
//! per-user mirror sheet, so it rides along in every event payload.

use chrono::NaiveDateTime;
use rusqlite::{OptionalExtension, params};
use taskloom_core::types::due_to_string;
use taskloom_core::{ArchiveScope, OutboxEvent, PersonalTask, TaskStatus, TaskloomError};

use crate::database::{Database, map_tr_err};
use crate::models::{due_from_sql, due_to_sql, now_string, parse_status, parse_ts};
use crate::queries::outbox;

const TASK_COLUMNS: &str = "id, assignee_name, task_text, from_name, due_at, status, created_at";

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersonalTask> {
    let due: Option<String> = row.get(4)?;
    let status: String = row.get(5)?;
    let created: String = row.get(6)?;
    Ok(PersonalTask {
        id: row.get(0)?,
        assignee_name: row.get(1)?,
        text: row.get(2)?,
        from_name: row.get(3)?,
        due_at: due_from_sql(due.as_deref()),
        status: parse_status(5, &status)?,
        created_at: parse_ts(6, &created)?,
    })
}

/// Creates a TODO task and queues TASK_CREATED. Returns the task id.
pub async fn create(
    db: &Database,
    assignee_name: &str,
    text: &str,
    from_name: &str,
    due_at: Option<NaiveDateTime>,
) -> Result<i64, TaskloomError> {
    let assignee_name = assignee_name.to_string();
    let text = text.to_string();
    let from_name = from_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO tasks (assignee_name, task_text, from_name, due_at, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'TODO', ?5)",
                params![assignee_name, text, from_name, due_to_sql(due_at), now_string()],
            )?;
            let id = tx.last_insert_rowid();
            outbox::append_tx(
                &tx,
                &OutboxEvent::TaskCreated {
                    sheet: assignee_name.clone(),
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

/// All tasks for one assignee, newest first.
pub async fn list(db: &Database, assignee_name: &str) -> Result<Vec<PersonalTask>, TaskloomError> {
    let assignee_name = assignee_name.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE assignee_name = ?1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map(params![assignee_name], task_from_row)?;
            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row?);
            }
            Ok(tasks)
        })
        .await
        .map_err(map_tr_err)
}

/// One task by (assignee, id).
pub async fn get(
    db: &Database,
    assignee_name: &str,
    id: i64,
) -> Result<Option<PersonalTask>, TaskloomError> {
    let assignee_name = assignee_name.to_string();
    db.connection()
        .call(move |conn| {
            let task = conn
                .query_row(
                    &format!(
                        "SELECT {TASK_COLUMNS} FROM tasks WHERE assignee_name = ?1 AND id = ?2"
                    ),
                    params![assignee_name, id],
                    task_from_row,
                )
                .optional()?;
            Ok(task)
        })
        .await
        .map_err(map_tr_err)
}

/// Changes a task's status, queuing TASK_STATUS. False when the task is missing.
pub async fn set_status(
    db: &Database,
    assignee_name: &str,
    id: i64,
    status: TaskStatus,
) -> Result<bool, TaskloomError> {
    let assignee_name = assignee_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE tasks SET status = ?1 WHERE assignee_name = ?2 AND id = ?3",
                params![status.to_string(), assignee_name, id],
            )?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::StatusChanged {
                    sheet: assignee_name.clone(),
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

/// Rewrites a task's text, queuing TASK_TEXT.
pub async fn update_text(
    db: &Database,
    assignee_name: &str,
    id: i64,
    text: &str,
) -> Result<bool, TaskloomError> {
    let assignee_name = assignee_name.to_string();
    let text = text.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE tasks SET task_text = ?1 WHERE assignee_name = ?2 AND id = ?3",
                params![text, assignee_name, id],
            )?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::TextChanged {
                    sheet: assignee_name.clone(),
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

/// Rewrites a task's due date, queuing TASK_DUE.
pub async fn update_due(
    db: &Database,
    assignee_name: &str,
    id: i64,
    due_at: Option<NaiveDateTime>,
) -> Result<bool, TaskloomError> {
    let assignee_name = assignee_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "UPDATE tasks SET due_at = ?1 WHERE assignee_name = ?2 AND id = ?3",
                params![due_to_sql(due_at), assignee_name, id],
            )?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::DueChanged {
                    sheet: assignee_name.clone(),
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

/// Physically deletes a task, queuing TASK_DELETE.
pub async fn delete(db: &Database, assignee_name: &str, id: i64) -> Result<bool, TaskloomError> {
    let assignee_name = assignee_name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let n = tx.execute(
                "DELETE FROM tasks WHERE assignee_name = ?1 AND id = ?2",
                params![assignee_name, id],
            )?;
            if n == 0 {
                return Ok(false);
            }
            outbox::append_tx(
                &tx,
                &OutboxEvent::TaskDeleted {
                    sheet: assignee_name.clone(),
                    task_id: id,
                },
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Archives every DONE task with a due date strictly before `cutoff`,
/// queuing one TASK_ARCHIVE_BATCH summary event for the whole sweep (no
/// event when nothing matched). Returns the number of archived rows.
pub async fn archive_done_before(
    db: &Database,
    cutoff: NaiveDateTime,
) -> Result<usize, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let cutoff_str = due_to_string(Some(cutoff));
            let n = tx.execute(
                "UPDATE tasks SET status = 'ARCHIVE'
                 WHERE status = 'DONE' AND due_at IS NOT NULL AND due_at < ?1",
                params![cutoff_str],
            )?;
            if n > 0 {
                outbox::append_tx(
                    &tx,
                    &OutboxEvent::ArchiveBatch {
                        cutoff: cutoff_str,
                        scope: ArchiveScope::Personal,
                    },
                )?;
            }
            tx.commit()?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::outbox::all_rows;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn create_queues_full_payload() {
        let (db, _dir) = setup_db().await;
        let id = create(&db, "Ana", "write report", "Boris", Some(day(2026, 2, 5)))
            .await
            .unwrap();
        assert_eq!(id, 1);

        let events = all_rows(&db).await.unwrap();
        assert_eq!(events.len(), 1);
        let decoded = OutboxEvent::from_payload(&events[0].payload).unwrap();
        assert_eq!(
            decoded,
            OutboxEvent::TaskCreated {
                sheet: "Ana".into(),
                task_id: 1,
                task: "write report".into(),
                from_name: "Boris".into(),
                due: "2026-02-05 00:00".into(),
                status: TaskStatus::Todo,
            }
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_change_on_missing_task_queues_nothing() {
        let (db, _dir) = setup_db().await;
        let ok = set_status(&db, "Ana", 42, TaskStatus::Done).await.unwrap();
        assert!(!ok);
        assert!(all_rows(&db).await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn edits_queue_one_event_each() {
        let (db, _dir) = setup_db().await;
        let id = create(&db, "Ana", "draft", "Boris", None).await.unwrap();

        assert!(update_text(&db, "Ana", id, "final draft").await.unwrap());
        assert!(update_due(&db, "Ana", id, Some(day(2026, 2, 10))).await.unwrap());
        assert!(set_status(&db, "Ana", id, TaskStatus::Done).await.unwrap());
        assert!(delete(&db, "Ana", id).await.unwrap());

        let types: Vec<String> = all_rows(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            types,
            vec!["TASK_CREATED", "TASK_TEXT", "TASK_DUE", "TASK_STATUS", "TASK_DELETE"]
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn tasks_are_scoped_to_assignee() {
        let (db, _dir) = setup_db().await;
        let id = create(&db, "Ana", "draft", "Boris", None).await.unwrap();
        // Wrong sheet name: no row touched, no event queued.
        assert!(!set_status(&db, "Vera", id, TaskStatus::Done).await.unwrap());
        assert_eq!(list(&db, "Ana").await.unwrap().len(), 1);
        assert!(list(&db, "Vera").await.unwrap().is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn archive_only_touches_done_with_past_due() {
        let (db, _dir) = setup_db().await;
        let cutoff = day(2026, 3, 1);

        let todo = create(&db, "Ana", "still open", "Boris", Some(day(2026, 2, 5)))
            .await
            .unwrap();
        let done_old = create(&db, "Ana", "done long ago", "Boris", Some(day(2026, 2, 28)))
            .await
            .unwrap();
        let done_at_cutoff = create(&db, "Ana", "due on cutoff", "Boris", Some(cutoff))
            .await
            .unwrap();
        let done_undated = create(&db, "Ana", "no due", "Boris", None).await.unwrap();
        for id in [done_old, done_at_cutoff, done_undated] {
            set_status(&db, "Ana", id, TaskStatus::Done).await.unwrap();
        }

        // TODO with the past due stays untouched (archive applies to DONE only).
        let count = archive_done_before(&db, cutoff).await.unwrap();
        assert_eq!(count, 1);

        let tasks = list(&db, "Ana").await.unwrap();
        let status_of = |id: i64| tasks.iter().find(|t| t.id == id).unwrap().status;
        assert_eq!(status_of(todo), TaskStatus::Todo);
        assert_eq!(status_of(done_old), TaskStatus::Archive);
        // Strict `<`: due exactly at cutoff is kept.
        assert_eq!(status_of(done_at_cutoff), TaskStatus::Done);
        assert_eq!(status_of(done_undated), TaskStatus::Done);

        let batch_events: Vec<_> = all_rows(&db)
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.event_type == "TASK_ARCHIVE_BATCH")
            .collect();
        assert_eq!(batch_events.len(), 1);
        let decoded = OutboxEvent::from_payload(&batch_events[0].payload).unwrap();
        assert_eq!(
            decoded,
            OutboxEvent::ArchiveBatch {
                cutoff: "2026-03-01 00:00".into(),
                scope: ArchiveScope::Personal,
            }
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_archive_sweep_queues_no_event() {
        let (db, _dir) = setup_db().await;
        let id = create(&db, "Ana", "open task", "Boris", Some(day(2026, 2, 5)))
            .await
            .unwrap();
        let count = archive_done_before(&db, day(2026, 3, 1)).await.unwrap();
        assert_eq!(count, 0);
        // Only the create event exists.
        assert_eq!(all_rows(&db).await.unwrap().len(), 1);
        assert_eq!(
            get(&db, "Ana", id).await.unwrap().unwrap().status,
            TaskStatus::Todo
        );
        db.close().await.unwrap();
    }
}
