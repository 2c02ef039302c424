// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox queue operations.
//!
//! The producer side is [`append_tx`], called by the other query modules
//! inside their own transactions. The consumer side fetches pending events
//! FIFO by id and marks them processed or errored individually. There is no
//! attempt cap and no dead-letter state: a failing event keeps its error
//! message and stays eligible for the next drain.

use rusqlite::params;
use taskloom_core::{OutboxEvent, OutboxRow, TaskloomError};

use crate::database::{Database, map_tr_err};
use crate::models::{now_string, parse_ts, parse_ts_opt};

/// Appends an event inside an open transaction.
///
/// Sync helper for the mutating query modules, so the append commits or
/// rolls back together with the entity write. Returns the event id.
pub(crate) fn append_tx(
    conn: &rusqlite::Connection,
    event: &OutboxEvent,
) -> Result<i64, tokio_rusqlite::Error> {
    let payload = event
        .to_payload()
        .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
    conn.execute(
        "INSERT INTO outbox (event_type, payload, created_at) VALUES (?1, ?2, ?3)",
        params![event.event_type(), payload, now_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetches up to `limit` unprocessed events, oldest first.
pub async fn fetch_pending(db: &Database, limit: usize) -> Result<Vec<OutboxRow>, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event_type, payload, created_at, processed_at, error
                 FROM outbox
                 WHERE processed_at IS NULL
                 ORDER BY id ASC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit as i64], |row| {
                let created: String = row.get(3)?;
                let processed: Option<String> = row.get(4)?;
                Ok(OutboxRow {
                    id: row.get(0)?,
                    event_type: row.get(1)?,
                    payload: row.get(2)?,
                    created_at: parse_ts(3, &created)?,
                    processed_at: parse_ts_opt(4, processed.as_deref())?,
                    error: row.get(5)?,
                })
            })?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
        .map_err(map_tr_err)
}

/// Marks one event processed and clears any prior error.
pub async fn mark_processed(db: &Database, id: i64) -> Result<(), TaskloomError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE outbox SET processed_at = ?1, error = NULL WHERE id = ?2",
                params![now_string(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Records an error on one event, leaving it unprocessed for retry.
pub async fn mark_error(db: &Database, id: i64, message: &str) -> Result<(), TaskloomError> {
    let message = message.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE outbox SET error = ?1 WHERE id = ?2",
                params![message, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All rows, for inspection and tests.
pub async fn all_rows(db: &Database) -> Result<Vec<OutboxRow>, TaskloomError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, event_type, payload, created_at, processed_at, error
                 FROM outbox ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let created: String = row.get(3)?;
                let processed: Option<String> = row.get(4)?;
                Ok(OutboxRow {
                    id: row.get(0)?,
                    event_type: row.get(1)?,
                    payload: row.get(2)?,
                    created_at: parse_ts(3, &created)?,
                    processed_at: parse_ts_opt(4, processed.as_deref())?,
                    error: row.get(5)?,
                })
            })?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn append(db: &Database, event: OutboxEvent) -> i64 {
        db.connection()
            .call(move |conn| append_tx(conn, &event))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fetch_is_fifo_by_id() {
        let (db, _dir) = setup_db().await;
        for tid in 1..=3 {
            append(
                &db,
                OutboxEvent::UserUpsert {
                    name: format!("user-{tid}"),
                    telegram_id: tid,
                },
            )
            .await;
        }

        let batch = fetch_pending(&db, 10).await.unwrap();
        let ids: Vec<i64> = batch.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(batch.iter().all(|e| e.processed_at.is_none()));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fetch_respects_limit() {
        let (db, _dir) = setup_db().await;
        for tid in 1..=5 {
            append(
                &db,
                OutboxEvent::UserUpsert {
                    name: format!("user-{tid}"),
                    telegram_id: tid,
                },
            )
            .await;
        }
        let batch = fetch_pending(&db, 2).await.unwrap();
        assert_eq!(batch.len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_processed_clears_error_and_hides_event() {
        let (db, _dir) = setup_db().await;
        let id = append(
            &db,
            OutboxEvent::UserUpsert {
                name: "Ana".into(),
                telegram_id: 1,
            },
        )
        .await;

        mark_error(&db, id, "mirror unreachable").await.unwrap();
        let rows = all_rows(&db).await.unwrap();
        assert_eq!(rows[0].error.as_deref(), Some("mirror unreachable"));
        assert!(rows[0].processed_at.is_none());
        // Still pending after an error.
        assert_eq!(fetch_pending(&db, 10).await.unwrap().len(), 1);

        mark_processed(&db, id).await.unwrap();
        let rows = all_rows(&db).await.unwrap();
        assert!(rows[0].processed_at.is_some());
        assert!(rows[0].error.is_none());
        assert!(fetch_pending(&db, 10).await.unwrap().is_empty());

        db.close().await.unwrap();
    }
}
