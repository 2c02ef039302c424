// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline keyboards and their callback data formats.
//!
//! Callback data is colon-separated: `assignee:<name>`,
//! `due:today|tomorrow|eow|other`, `newtask_back:<state>`, `newtask_cancel`,
//! `done_personal:<sheet>:<id>`, `done_common:<id>`, `admin_user:<sheet>`,
//! `admin_view:<mode>`, `admin_back:<target>`,
//! `admin_edit_text|admin_edit_due|admin_delete:<sheet>:<id>`,
//! `admin_toggle:<sheet>:<id>:<status>`.

use taskloom_core::types::{COMMON_SHEET, TaskStatus};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

fn rows_of_two(buttons: Vec<InlineKeyboardButton>) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> =
        buttons.chunks(2).map(|pair| pair.to_vec()).collect();
    InlineKeyboardMarkup::new(rows)
}

/// Assignee picker: every registered user, the shared collection, cancel.
pub fn assignee_keyboard(user_names: &[String]) -> InlineKeyboardMarkup {
    let mut names: Vec<&str> = user_names.iter().map(String::as_str).collect();
    names.sort_unstable();
    let mut buttons: Vec<InlineKeyboardButton> = names
        .iter()
        .map(|name| InlineKeyboardButton::callback(name.to_string(), format!("assignee:{name}")))
        .collect();
    buttons.push(InlineKeyboardButton::callback(
        "📌 Common",
        format!("assignee:{COMMON_SHEET}"),
    ));
    buttons.push(InlineKeyboardButton::callback("⬅️ Cancel", "newtask_cancel"));
    rows_of_two(buttons)
}

/// Back/cancel while entering the task text.
pub fn text_entry_keyboard() -> InlineKeyboardMarkup {
    rows_of_two(vec![
        InlineKeyboardButton::callback("⬅️ Back", "newtask_back:assignee"),
        InlineKeyboardButton::callback("⬅️ Cancel", "newtask_cancel"),
    ])
}

/// Due presets plus manual entry, back, cancel.
pub fn due_keyboard() -> InlineKeyboardMarkup {
    rows_of_two(vec![
        InlineKeyboardButton::callback("Today", "due:today"),
        InlineKeyboardButton::callback("Tomorrow", "due:tomorrow"),
        InlineKeyboardButton::callback("End of week", "due:eow"),
        InlineKeyboardButton::callback("Other", "due:other"),
        InlineKeyboardButton::callback("⬅️ Back", "newtask_back:text"),
        InlineKeyboardButton::callback("⬅️ Cancel", "newtask_cancel"),
    ])
}

/// Back/cancel while typing a manual due date.
pub fn manual_due_keyboard() -> InlineKeyboardMarkup {
    rows_of_two(vec![
        InlineKeyboardButton::callback("⬅️ Back", "newtask_back:due"),
        InlineKeyboardButton::callback("⬅️ Cancel", "newtask_cancel"),
    ])
}

pub fn done_personal_keyboard(sheet: &str, task_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ Done",
        format!("done_personal:{sheet}:{task_id}"),
    )]])
}

pub fn done_common_keyboard(task_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ Done",
        format!("done_common:{task_id}"),
    )]])
}

/// Admin: pick a user's sheet or the shared collection.
pub fn admin_users_keyboard(user_names: &[String]) -> InlineKeyboardMarkup {
    let mut names: Vec<&str> = user_names.iter().map(String::as_str).collect();
    names.sort_unstable();
    let mut buttons: Vec<InlineKeyboardButton> = names
        .iter()
        .map(|name| InlineKeyboardButton::callback(name.to_string(), format!("admin_user:{name}")))
        .collect();
    buttons.push(InlineKeyboardButton::callback(
        "📌 Common",
        format!("admin_user:{COMMON_SHEET}"),
    ));
    buttons.push(InlineKeyboardButton::callback("⬅️ Exit", "admin_back:exit"));
    rows_of_two(buttons)
}

/// Admin: pick a view mode for the chosen sheet.
pub fn admin_views_keyboard() -> InlineKeyboardMarkup {
    rows_of_two(vec![
        InlineKeyboardButton::callback("Active", "admin_view:my"),
        InlineKeyboardButton::callback("Overdue", "admin_view:overdue"),
        InlineKeyboardButton::callback("Done", "admin_view:done"),
        InlineKeyboardButton::callback("All", "admin_view:all"),
        InlineKeyboardButton::callback("⬅️ Back", "admin_back:users"),
        InlineKeyboardButton::callback("⬅️ Exit", "admin_back:exit"),
    ])
}

/// Admin: navigation after a task listing.
pub fn admin_nav_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "⬅️ Back to views",
            "admin_back:views",
        )],
        vec![InlineKeyboardButton::callback(
            "⬅️ Back to users",
            "admin_back:users",
        )],
        vec![InlineKeyboardButton::callback("⬅️ Exit", "admin_back:exit")],
    ])
}

/// Admin: per-task actions. The toggle flips between TODO and DONE.
pub fn admin_task_actions_keyboard(
    sheet: &str,
    task_id: i64,
    status: TaskStatus,
) -> InlineKeyboardMarkup {
    let toggle_to = match status {
        TaskStatus::Done => TaskStatus::Todo,
        _ => TaskStatus::Done,
    };
    let toggle_label = match toggle_to {
        TaskStatus::Todo => "↩️ Back to TODO",
        _ => "✅ Mark DONE",
    };
    rows_of_two(vec![
        InlineKeyboardButton::callback("✏️ Text", format!("admin_edit_text:{sheet}:{task_id}")),
        InlineKeyboardButton::callback("📅 Due", format!("admin_edit_due:{sheet}:{task_id}")),
        InlineKeyboardButton::callback(
            toggle_label,
            format!("admin_toggle:{sheet}:{task_id}:{toggle_to}"),
        ),
        InlineKeyboardButton::callback("🗑 Delete", format!("admin_delete:{sheet}:{task_id}")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(kb: &InlineKeyboardMarkup) -> Vec<String> {
        kb.inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn assignee_keyboard_sorts_and_appends_common() {
        let kb = assignee_keyboard(&["Vera".into(), "Ana".into()]);
        let data = callback_data(&kb);
        assert_eq!(
            data,
            vec![
                "assignee:Ana",
                "assignee:Vera",
                "assignee:Common",
                "newtask_cancel"
            ]
        );
    }

    #[test]
    fn due_keyboard_covers_all_presets() {
        let data = callback_data(&due_keyboard());
        for expected in ["due:today", "due:tomorrow", "due:eow", "due:other"] {
            assert!(data.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn toggle_flips_done_to_todo() {
        let kb = admin_task_actions_keyboard("Ana", 7, TaskStatus::Done);
        let data = callback_data(&kb);
        assert!(data.contains(&"admin_toggle:Ana:7:TODO".to_string()));

        let kb = admin_task_actions_keyboard("Ana", 7, TaskStatus::Todo);
        let data = callback_data(&kb);
        assert!(data.contains(&"admin_toggle:Ana:7:DONE".to_string()));
    }
}
