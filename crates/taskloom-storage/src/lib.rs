// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite durable store for taskloom.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed query
//! modules for users, tasks, common tasks, and the outbox queue.
//!
//! Every mutating query here is also the outbox producer: the entity write
//! and the outbox append happen inside one transaction, so a committed
//! change always has exactly one queued mirror event and a rolled-back
//! change has none.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
