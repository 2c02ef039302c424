// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams implemented by the adapter crates.

pub mod access;
pub mod dialog;
pub mod sheet;

pub use access::AccessPolicy;
pub use dialog::DialogStore;
pub use sheet::SheetStore;
