// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spreadsheet mirror backends.
//!
//! Two implementations of [`taskloom_core::SheetStore`]: an in-memory
//! workbook for tests and mirror-disabled runs, and a Google Sheets v4
//! REST client for production.

pub mod memory;
pub mod rest;

pub use memory::MemorySheets;
pub use rest::GoogleSheets;
