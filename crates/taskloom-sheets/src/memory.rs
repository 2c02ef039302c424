// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory workbook.
//!
//! Backs tests and mirror-disabled runs. Semantics mirror the REST
//! backend: row 1 is the header, updates address existing cells only,
//! reading a missing sheet is an error.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use taskloom_core::{SheetStore, TaskloomError};

/// A workbook held in a process-local map, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct MemorySheets {
    sheets: Arc<Mutex<BTreeMap<String, Vec<Vec<String>>>>>,
}

impl MemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one sheet, header included. For assertions.
    pub fn snapshot(&self, title: &str) -> Option<Vec<Vec<String>>> {
        self.sheets.lock().expect("workbook lock").get(title).cloned()
    }

    /// Titles of every sheet in the workbook.
    pub fn titles(&self) -> Vec<String> {
        self.sheets
            .lock()
            .expect("workbook lock")
            .keys()
            .cloned()
            .collect()
    }
}

fn missing_sheet(title: &str) -> TaskloomError {
    TaskloomError::mirror(format!("sheet not found: {title}"))
}

#[async_trait]
impl SheetStore for MemorySheets {
    async fn ensure_sheet(&self, title: &str, headers: &[&str]) -> Result<(), TaskloomError> {
        let mut sheets = self.sheets.lock().expect("workbook lock");
        let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        match sheets.get_mut(title) {
            Some(rows) => {
                if rows.first() != Some(&header) {
                    if rows.is_empty() {
                        rows.push(header);
                    } else {
                        rows[0] = header;
                    }
                }
            }
            None => {
                sheets.insert(title.to_string(), vec![header]);
            }
        }
        Ok(())
    }

    async fn rows(&self, title: &str) -> Result<Vec<Vec<String>>, TaskloomError> {
        self.snapshot(title).ok_or_else(|| missing_sheet(title))
    }

    async fn append_row(&self, title: &str, values: &[String]) -> Result<(), TaskloomError> {
        let mut sheets = self.sheets.lock().expect("workbook lock");
        let rows = sheets.get_mut(title).ok_or_else(|| missing_sheet(title))?;
        rows.push(values.to_vec());
        Ok(())
    }

    async fn update_row(
        &self,
        title: &str,
        row: usize,
        values: &[String],
    ) -> Result<(), TaskloomError> {
        let mut sheets = self.sheets.lock().expect("workbook lock");
        let rows = sheets.get_mut(title).ok_or_else(|| missing_sheet(title))?;
        let idx = row
            .checked_sub(1)
            .filter(|i| *i < rows.len())
            .ok_or_else(|| {
                TaskloomError::mirror(format!("row {row} out of range in sheet {title}"))
            })?;
        rows[idx] = values.to_vec();
        Ok(())
    }

    async fn update_cell(
        &self,
        title: &str,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), TaskloomError> {
        let mut sheets = self.sheets.lock().expect("workbook lock");
        let rows = sheets.get_mut(title).ok_or_else(|| missing_sheet(title))?;
        let idx = row
            .checked_sub(1)
            .filter(|i| *i < rows.len())
            .ok_or_else(|| {
                TaskloomError::mirror(format!("row {row} out of range in sheet {title}"))
            })?;
        let cells = &mut rows[idx];
        let col_idx = col.checked_sub(1).ok_or_else(|| {
            TaskloomError::mirror(format!("column {col} out of range in sheet {title}"))
        })?;
        if cells.len() <= col_idx {
            cells.resize(col_idx + 1, String::new());
        }
        cells[col_idx] = value.to_string();
        Ok(())
    }

    async fn delete_row(&self, title: &str, row: usize) -> Result<(), TaskloomError> {
        let mut sheets = self.sheets.lock().expect("workbook lock");
        let rows = sheets.get_mut(title).ok_or_else(|| missing_sheet(title))?;
        let idx = row
            .checked_sub(1)
            .filter(|i| *i < rows.len())
            .ok_or_else(|| {
                TaskloomError::mirror(format!("row {row} out of range in sheet {title}"))
            })?;
        rows.remove(idx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_is_idempotent_and_rewrites_headers() {
        let wb = MemorySheets::new();
        wb.ensure_sheet("Users", &["Name", "TelegramID"]).await.unwrap();
        wb.append_row("Users", &["Ana".into(), "100".into()]).await.unwrap();

        // Second ensure with matching headers leaves data alone.
        wb.ensure_sheet("Users", &["Name", "TelegramID"]).await.unwrap();
        assert_eq!(wb.rows("Users").await.unwrap().len(), 2);

        // Header drift gets repaired without touching data rows.
        wb.ensure_sheet("Users", &["Name", "Chat"]).await.unwrap();
        let rows = wb.rows("Users").await.unwrap();
        assert_eq!(rows[0], vec!["Name".to_string(), "Chat".to_string()]);
        assert_eq!(rows[1][0], "Ana");
    }

    #[tokio::test]
    async fn update_cell_extends_short_rows() {
        let wb = MemorySheets::new();
        wb.ensure_sheet("T", &["A", "B", "C"]).await.unwrap();
        wb.append_row("T", &["1".into()]).await.unwrap();
        wb.update_cell("T", 2, 3, "x").await.unwrap();
        assert_eq!(
            wb.rows("T").await.unwrap()[1],
            vec!["1".to_string(), String::new(), "x".to_string()]
        );
    }

    #[tokio::test]
    async fn delete_row_shifts_up() {
        let wb = MemorySheets::new();
        wb.ensure_sheet("T", &["A"]).await.unwrap();
        wb.append_row("T", &["one".into()]).await.unwrap();
        wb.append_row("T", &["two".into()]).await.unwrap();
        wb.delete_row("T", 2).await.unwrap();
        let rows = wb.rows("T").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "two");
    }

    #[tokio::test]
    async fn missing_sheet_is_an_error() {
        let wb = MemorySheets::new();
        assert!(wb.rows("Nope").await.is_err());
        assert!(wb.append_row("Nope", &[]).await.is_err());
    }
}
