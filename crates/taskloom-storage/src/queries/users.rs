// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registration queries.
//!
//! Registration is a replace, never a merge: upserting an existing
//! telegram id renames that user, upserting an existing name re-binds it
//! to the new telegram id. Unique constraints reject anything else and the
//! whole transaction (outbox append included) rolls back.

use rusqlite::{OptionalExtension, params};
use taskloom_core::{OutboxEvent, TaskloomError, User};

use crate::database::{Database, map_tr_err};
use crate::models::{now_string, parse_ts};
use crate::queries::outbox;

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        telegram_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_ts(3, &created)?,
    })
}

const USER_COLUMNS: &str = "id, telegram_id, name, created_at";

/// Registers or re-binds a user and queues a USER_UPSERT event.
pub async fn upsert(db: &Database, name: &str, telegram_id: i64) -> Result<(), TaskloomError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let by_tid: Option<i64> = tx
                .query_row(
                    "SELECT id FROM users WHERE telegram_id = ?1",
                    params![telegram_id],
                    |row| row.get(0),
                )
                .optional()?;
            let by_name: Option<i64> = tx
                .query_row(
                    "SELECT id FROM users WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            match (by_tid, by_name) {
                (Some(id), _) => {
                    tx.execute("UPDATE users SET name = ?1 WHERE id = ?2", params![name, id])?;
                }
                (None, Some(id)) => {
                    tx.execute(
                        "UPDATE users SET telegram_id = ?1 WHERE id = ?2",
                        params![telegram_id, id],
                    )?;
                }
                (None, None) => {
                    tx.execute(
                        "INSERT INTO users (telegram_id, name, created_at) VALUES (?1, ?2, ?3)",
                        params![telegram_id, name, now_string()],
                    )?;
                }
            }

            outbox::append_tx(
                &tx,
                &OutboxEvent::UserUpsert {
                    name: name.clone(),
                    telegram_id,
                },
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes a user by telegram id. Returns the removed display name.
pub async fn delete_by_telegram_id(
    db: &Database,
    telegram_id: i64,
) -> Result<Option<String>, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let name: Option<String> = tx
                .query_row(
                    "SELECT name FROM users WHERE telegram_id = ?1",
                    params![telegram_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(name) = name else {
                return Ok(None);
            };
            tx.execute("DELETE FROM users WHERE telegram_id = ?1", params![telegram_id])?;
            outbox::append_tx(
                &tx,
                &OutboxEvent::UserDelete {
                    name: name.clone(),
                    telegram_id,
                },
            )?;
            tx.commit()?;
            Ok(Some(name))
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes a user by display name. Returns the removed telegram id.
pub async fn delete_by_name(db: &Database, name: &str) -> Result<Option<i64>, TaskloomError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let telegram_id: Option<i64> = tx
                .query_row(
                    "SELECT telegram_id FROM users WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(telegram_id) = telegram_id else {
                return Ok(None);
            };
            tx.execute("DELETE FROM users WHERE name = ?1", params![name])?;
            outbox::append_tx(
                &tx,
                &OutboxEvent::UserDelete {
                    name: name.clone(),
                    telegram_id,
                },
            )?;
            tx.commit()?;
            Ok(Some(telegram_id))
        })
        .await
        .map_err(map_tr_err)
}

/// Looks a user up by telegram id.
pub async fn get_by_telegram_id(
    db: &Database,
    telegram_id: i64,
) -> Result<Option<User>, TaskloomError> {
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?1"),
                    params![telegram_id],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Looks a user up by display name.
pub async fn get_by_name(db: &Database, name: &str) -> Result<Option<User>, TaskloomError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?1"),
                    params![name],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// All registered users, ordered by name.
pub async fn list(db: &Database) -> Result<Vec<User>, TaskloomError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY name"))?;
            let rows = stmt.query_map([], user_from_row)?;
            let mut users = Vec::new();
            for row in rows {
                users.push(row?);
            }
            Ok(users)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::outbox::all_rows;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn upsert_creates_and_queues_event() {
        let (db, _dir) = setup_db().await;
        upsert(&db, "Ana", 100).await.unwrap();

        let user = get_by_telegram_id(&db, 100).await.unwrap().unwrap();
        assert_eq!(user.name, "Ana");

        let events = all_rows(&db).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "USER_UPSERT");
        let decoded = OutboxEvent::from_payload(&events[0].payload).unwrap();
        assert_eq!(
            decoded,
            OutboxEvent::UserUpsert {
                name: "Ana".into(),
                telegram_id: 100
            }
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_same_telegram_id_renames() {
        let (db, _dir) = setup_db().await;
        upsert(&db, "Ana", 100).await.unwrap();
        upsert(&db, "Anastasia", 100).await.unwrap();

        assert!(get_by_name(&db, "Ana").await.unwrap().is_none());
        let user = get_by_name(&db, "Anastasia").await.unwrap().unwrap();
        assert_eq!(user.telegram_id, 100);
        assert_eq!(list(&db).await.unwrap().len(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_same_name_rebinds_telegram_id() {
        let (db, _dir) = setup_db().await;
        upsert(&db, "Ana", 100).await.unwrap();
        upsert(&db, "Ana", 200).await.unwrap();

        let user = get_by_name(&db, "Ana").await.unwrap().unwrap();
        assert_eq!(user.telegram_id, 200);
        assert!(get_by_telegram_id(&db, 100).await.unwrap().is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conflicting_rename_rolls_back_without_event() {
        let (db, _dir) = setup_db().await;
        upsert(&db, "Ana", 100).await.unwrap();
        upsert(&db, "Vera", 200).await.unwrap();

        // Renaming telegram id 200 to the taken name "Ana" violates the
        // unique constraint; the mutation and its event must both vanish.
        let result = upsert(&db, "Ana", 200).await;
        assert!(result.is_err());

        let events = all_rows(&db).await.unwrap();
        assert_eq!(events.len(), 2, "failed upsert must not queue an event");
        assert_eq!(get_by_name(&db, "Vera").await.unwrap().unwrap().telegram_id, 200);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_returns_name_and_queues_event() {
        let (db, _dir) = setup_db().await;
        upsert(&db, "Ana", 100).await.unwrap();

        let name = delete_by_telegram_id(&db, 100).await.unwrap();
        assert_eq!(name.as_deref(), Some("Ana"));
        assert!(list(&db).await.unwrap().is_empty());

        let events = all_rows(&db).await.unwrap();
        assert_eq!(events.last().unwrap().event_type, "USER_DELETE");

        // Deleting again is a no-op with no extra event.
        assert!(delete_by_telegram_id(&db, 100).await.unwrap().is_none());
        assert_eq!(all_rows(&db).await.unwrap().len(), 2);

        db.close().await.unwrap();
    }
}
