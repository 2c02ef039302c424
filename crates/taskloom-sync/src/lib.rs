// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox consumer: drains queued change events into the spreadsheet
//! mirror, and runs the periodic archive sweep.
//!
//! The mirror is eventually consistent with the durable store. Every drain
//! handles events oldest-first and marks each one processed or errored on
//! its own, so one poisoned event never blocks the rest of the batch and a
//! failing event is simply retried on the next drain, forever.

pub mod apply;
pub mod schema;
pub mod sweep;
pub mod worker;

pub use worker::{DrainReport, SyncWorker};
