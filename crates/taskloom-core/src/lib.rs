// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the taskloom task bot.
//!
//! Defines the domain model (users, personal and common tasks, completion
//! progress), the outbox event sum type used to mirror durable-store
//! mutations into a spreadsheet, the dialog state machines for multi-step
//! Telegram flows, and the trait seams implemented by the adapter crates.

pub mod dialog;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;
pub mod view;

pub use dialog::{AdminDialog, Dialog, NewTaskDialog};
pub use error::TaskloomError;
pub use event::{ArchiveScope, OutboxEvent};
pub use traits::{AccessPolicy, DialogStore, SheetStore};
pub use types::{
    CommonProgress, CommonTask, FilterMode, OutboxRow, PersonalTask, TaskStatus, TaskView, User,
};
