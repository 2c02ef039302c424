// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mirror workbook layout.

use taskloom_core::types::{
    COMMON_PROGRESS_HEADERS, COMMON_PROGRESS_SHEET, COMMON_SHEET, TASK_HEADERS, USERS_HEADERS,
    USERS_SHEET,
};
use taskloom_core::{SheetStore, TaskloomError};

/// Makes sure the fixed sheets and one task sheet per registered user
/// exist with their headers. Runs at the start of every drain, so a
/// freshly wiped spreadsheet heals on the next cycle.
pub async fn ensure_base_structure(
    sheets: &dyn SheetStore,
    user_names: &[String],
) -> Result<(), TaskloomError> {
    sheets.ensure_sheet(USERS_SHEET, &USERS_HEADERS).await?;
    sheets.ensure_sheet(COMMON_SHEET, &TASK_HEADERS).await?;
    sheets
        .ensure_sheet(COMMON_PROGRESS_SHEET, &COMMON_PROGRESS_HEADERS)
        .await?;
    for name in user_names {
        sheets.ensure_sheet(name, &TASK_HEADERS).await?;
    }
    Ok(())
}
