// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spreadsheet mirror seam.
//!
//! The minimal surface the mirror-apply step needs: ensure a sheet with
//! headers, read it, append a row, update a row or cell, delete a row.
//! Rows and columns are 1-based, row 1 being the header row. The mirror is
//! never authoritative and never read for bot decisions.

use async_trait::async_trait;

use crate::error::TaskloomError;

/// A workbook of named sheets with header rows.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Creates the sheet if missing and rewrites the header row when it
    /// does not match. Idempotent.
    async fn ensure_sheet(&self, title: &str, headers: &[&str]) -> Result<(), TaskloomError>;

    /// All rows of a sheet including the header row. Missing sheet is an error.
    async fn rows(&self, title: &str) -> Result<Vec<Vec<String>>, TaskloomError>;

    /// Appends a data row.
    async fn append_row(&self, title: &str, values: &[String]) -> Result<(), TaskloomError>;

    /// Overwrites a whole data row in place.
    async fn update_row(
        &self,
        title: &str,
        row: usize,
        values: &[String],
    ) -> Result<(), TaskloomError>;

    /// Overwrites a single cell.
    async fn update_cell(
        &self,
        title: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), TaskloomError>;

    /// Deletes a data row, shifting the rest up.
    async fn delete_row(&self, title: &str, row: usize) -> Result<(), TaskloomError>;
}
