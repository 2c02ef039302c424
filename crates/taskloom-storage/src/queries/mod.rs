// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the durable store.
//!
//! All mutating functions append their outbox event inside the same
//! transaction as the entity write.

pub mod common;
pub mod outbox;
pub mod tasks;
pub mod users;
