// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline button callbacks: dialog transitions, done marks, admin actions.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Local;
use taskloom_core::dialog::{AdminDialog, NewTaskDialog};
use taskloom_core::types::COMMON_SHEET;
use taskloom_core::{Dialog, TaskStatus};
use taskloom_storage::queries::{common, tasks, users};
use teloxide::prelude::*;
use teloxide::types::ChatId;

use crate::dates::{preset_end_of_week, preset_today, preset_tomorrow};
use crate::dialogs::finalize_create;
use crate::format::{chunk_lines, format_task_line};
use crate::keyboards;
use crate::{BotContext, HandlerResult};

pub async fn handle_callback(bot: Bot, q: CallbackQuery, ctx: Arc<BotContext>) -> HandlerResult {
    let user_id = q.from.id.0 as i64;
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user_id));
    let data = q.data.clone().unwrap_or_default();

    // Acknowledge first so the button stops spinning even on slow paths.
    bot.answer_callback_query(q.id.clone()).await?;

    if !ctx.access.is_allowed(user_id) {
        return Ok(());
    }

    if let Some(assignee) = data.strip_prefix("assignee:") {
        pick_assignee(&bot, &ctx, user_id, chat_id, assignee).await?;
    } else if let Some(preset) = data.strip_prefix("due:") {
        pick_due(&bot, &ctx, user_id, chat_id, preset).await?;
    } else if data.strip_prefix("newtask_back:").is_some() {
        newtask_back(&bot, &ctx, user_id, chat_id).await?;
    } else if data == "newtask_cancel" {
        ctx.dialogs.clear(user_id).await;
        bot.send_message(chat_id, "Cancelled.").await?;
    } else if let Some(rest) = data.strip_prefix("done_personal:") {
        done_personal(&bot, &ctx, chat_id, rest).await?;
    } else if let Some(rest) = data.strip_prefix("done_common:") {
        done_common(&bot, &ctx, user_id, chat_id, rest).await?;
    } else if data.starts_with("admin_") {
        if !ctx.access.is_admin(user_id) {
            bot.send_message(chat_id, "Admin buttons are admin-only.").await?;
            return Ok(());
        }
        admin_callback(&bot, &ctx, user_id, chat_id, &data).await?;
    }
    Ok(())
}

async fn pick_assignee(
    bot: &Bot,
    ctx: &BotContext,
    user_id: i64,
    chat_id: ChatId,
    assignee: &str,
) -> HandlerResult {
    let Some(Dialog::NewTask(dialog @ NewTaskDialog::ChoosingAssignee { .. })) =
        ctx.dialogs.get(user_id).await
    else {
        bot.send_message(chat_id, "No task in progress. Start with /newtask.")
            .await?;
        return Ok(());
    };
    ctx.dialogs
        .set(
            user_id,
            Dialog::NewTask(dialog.with_assignee(assignee.to_string())),
        )
        .await;
    bot.send_message(chat_id, format!("OK. Write the task text for: {assignee}"))
        .reply_markup(keyboards::text_entry_keyboard())
        .await?;
    Ok(())
}

async fn pick_due(
    bot: &Bot,
    ctx: &BotContext,
    user_id: i64,
    chat_id: ChatId,
    preset: &str,
) -> HandlerResult {
    if preset == "other" {
        let Some(Dialog::NewTask(dialog @ NewTaskDialog::ChoosingDuePreset { .. })) =
            ctx.dialogs.get(user_id).await
        else {
            bot.send_message(chat_id, "No task in progress. Start with /newtask.")
                .await?;
            return Ok(());
        };
        ctx.dialogs
            .set(user_id, Dialog::NewTask(dialog.manual_due()))
            .await;
        bot.send_message(chat_id, "Type the date: 2026-02-05 or 05.02.2026.")
            .reply_markup(keyboards::manual_due_keyboard())
            .await?;
        return Ok(());
    }

    let today = Local::now().date_naive();
    let due = match preset {
        "today" => preset_today(today),
        "tomorrow" => preset_tomorrow(today),
        "eow" => preset_end_of_week(today),
        _ => return Ok(()),
    };
    finalize_create(bot, ctx, user_id, chat_id, due).await
}

async fn newtask_back(
    bot: &Bot,
    ctx: &BotContext,
    user_id: i64,
    chat_id: ChatId,
) -> HandlerResult {
    let Some(Dialog::NewTask(dialog)) = ctx.dialogs.get(user_id).await else {
        bot.send_message(chat_id, "No task in progress. Start with /newtask.")
            .await?;
        return Ok(());
    };
    let Some(previous) = dialog.back() else {
        ctx.dialogs.clear(user_id).await;
        bot.send_message(chat_id, "Cancelled.").await?;
        return Ok(());
    };

    match &previous {
        NewTaskDialog::ChoosingAssignee { .. } => {
            let names: Vec<String> = users::list(&ctx.db)
                .await?
                .into_iter()
                .map(|u| u.name)
                .collect();
            bot.send_message(chat_id, "Who is the task for?")
                .reply_markup(keyboards::assignee_keyboard(&names))
                .await?;
        }
        NewTaskDialog::EnteringText { assignee, .. } => {
            bot.send_message(chat_id, format!("Write the task text for: {assignee}"))
                .reply_markup(keyboards::text_entry_keyboard())
                .await?;
        }
        NewTaskDialog::ChoosingDuePreset { .. } => {
            bot.send_message(chat_id, "When is it due?")
                .reply_markup(keyboards::due_keyboard())
                .await?;
        }
        NewTaskDialog::EnteringDueManual { .. } => {}
    }
    ctx.dialogs.set(user_id, Dialog::NewTask(previous)).await;
    Ok(())
}

async fn done_personal(bot: &Bot, ctx: &BotContext, chat_id: ChatId, rest: &str) -> HandlerResult {
    // done_personal:<sheet>:<task_id>
    let Some((sheet, id_str)) = rest.rsplit_once(':') else {
        return Ok(());
    };
    let Ok(task_id) = id_str.parse::<i64>() else {
        return Ok(());
    };
    if tasks::set_status(&ctx.db, sheet, task_id, TaskStatus::Done).await? {
        bot.send_message(chat_id, format!("Done ✅ Task [{task_id}] marked DONE."))
            .await?;
    } else {
        bot.send_message(chat_id, "Could not find that task (deleted?).")
            .await?;
    }
    Ok(())
}

async fn done_common(
    bot: &Bot,
    ctx: &BotContext,
    user_id: i64,
    chat_id: ChatId,
    rest: &str,
) -> HandlerResult {
    let Ok(task_id) = rest.parse::<i64>() else {
        return Ok(());
    };
    let Some(user) = users::get_by_telegram_id(&ctx.db, user_id).await? else {
        bot.send_message(chat_id, "You are not registered. Use: /register <Name>")
            .await?;
        return Ok(());
    };
    if common::get(&ctx.db, task_id).await?.is_none() {
        bot.send_message(chat_id, "Could not find that shared task (deleted?).")
            .await?;
        return Ok(());
    }
    // A delete racing this mark surfaces as a storage error, not a
    // silent "not found".
    common::progress_set_done(&ctx.db, task_id, &user.name).await?;
    bot.send_message(
        chat_id,
        format!("Done ✅ Shared task [{task_id}] marked DONE for {}.", user.name),
    )
    .await?;
    Ok(())
}

async fn admin_callback(
    bot: &Bot,
    ctx: &BotContext,
    user_id: i64,
    chat_id: ChatId,
    data: &str,
) -> HandlerResult {
    if let Some(sheet) = data.strip_prefix("admin_user:") {
        let Some(Dialog::Admin(dialog @ AdminDialog::ChoosingUser)) =
            ctx.dialogs.get(user_id).await
        else {
            bot.send_message(chat_id, "Use /admin first.").await?;
            return Ok(());
        };
        ctx.dialogs
            .set(user_id, Dialog::Admin(dialog.with_sheet(sheet.to_string())))
            .await;
        bot.send_message(chat_id, format!("Viewing: {sheet}. Which tasks?"))
            .reply_markup(keyboards::admin_views_keyboard())
            .await?;
    } else if let Some(mode_str) = data.strip_prefix("admin_view:") {
        let Some(mode) = crate::commands::parse_filter_mode(mode_str) else {
            return Ok(());
        };
        let Some(Dialog::Admin(dialog @ AdminDialog::ChoosingView { .. })) =
            ctx.dialogs.get(user_id).await
        else {
            bot.send_message(chat_id, "Use /admin first.").await?;
            return Ok(());
        };
        let browsing = dialog.with_mode(mode);
        let AdminDialog::Browsing { ref sheet, .. } = browsing else {
            return Ok(());
        };
        let sheet = sheet.clone();
        ctx.dialogs.set(user_id, Dialog::Admin(browsing)).await;
        admin_list(bot, ctx, chat_id, &sheet, mode).await?;
    } else if let Some(target) = data.strip_prefix("admin_back:") {
        admin_back(bot, ctx, user_id, chat_id, target).await?;
    } else if let Some(rest) = data.strip_prefix("admin_edit_text:") {
        let Some((sheet, task_id)) = parse_sheet_id(rest) else {
            return Ok(());
        };
        ctx.dialogs
            .set(user_id, Dialog::Admin(AdminDialog::EditingText { sheet, task_id }))
            .await;
        bot.send_message(chat_id, format!("Send the new text for [{task_id}]."))
            .await?;
    } else if let Some(rest) = data.strip_prefix("admin_edit_due:") {
        let Some((sheet, task_id)) = parse_sheet_id(rest) else {
            return Ok(());
        };
        ctx.dialogs
            .set(user_id, Dialog::Admin(AdminDialog::EditingDue { sheet, task_id }))
            .await;
        bot.send_message(
            chat_id,
            format!("Send the new due date for [{task_id}]: 2026-02-05 or 05.02.2026."),
        )
        .await?;
    } else if let Some(rest) = data.strip_prefix("admin_toggle:") {
        // admin_toggle:<sheet>:<task_id>:<status>
        let Some((head, status_str)) = rest.rsplit_once(':') else {
            return Ok(());
        };
        let Some((sheet, task_id)) = parse_sheet_id(head) else {
            return Ok(());
        };
        let Ok(status) = TaskStatus::from_str(status_str) else {
            return Ok(());
        };
        let found = if sheet == COMMON_SHEET {
            common::set_status(&ctx.db, task_id, status).await?
        } else {
            tasks::set_status(&ctx.db, &sheet, task_id, status).await?
        };
        let reply = if found {
            format!("Task [{task_id}] is now {status}.")
        } else {
            format!("Task [{task_id}] no longer exists.")
        };
        bot.send_message(chat_id, reply).await?;
    } else if let Some(rest) = data.strip_prefix("admin_delete:") {
        let Some((sheet, task_id)) = parse_sheet_id(rest) else {
            return Ok(());
        };
        let found = if sheet == COMMON_SHEET {
            common::delete(&ctx.db, task_id).await?
        } else {
            tasks::delete(&ctx.db, &sheet, task_id).await?
        };
        let reply = if found {
            format!("Task [{task_id}] deleted.")
        } else {
            format!("Task [{task_id}] no longer exists.")
        };
        bot.send_message(chat_id, reply).await?;
    }
    Ok(())
}

async fn admin_list(
    bot: &Bot,
    ctx: &BotContext,
    chat_id: ChatId,
    sheet: &str,
    mode: taskloom_core::FilterMode,
) -> HandlerResult {
    let today = Local::now().date_naive();
    let views = crate::commands::sheet_views(&ctx.db, sheet, mode, today).await?;
    if views.is_empty() {
        bot.send_message(chat_id, "No tasks for this filter.")
            .reply_markup(keyboards::admin_nav_keyboard())
            .await?;
        return Ok(());
    }

    let lines: Vec<String> = views.iter().map(|v| format_task_line(v, today)).collect();
    for chunk in chunk_lines(&lines) {
        bot.send_message(chat_id, chunk).await?;
    }
    for view in &views {
        bot.send_message(chat_id, format!("Actions for [{}]:", view.task_id))
            .reply_markup(keyboards::admin_task_actions_keyboard(
                sheet,
                view.task_id,
                view.status,
            ))
            .await?;
    }
    bot.send_message(chat_id, "Navigation:")
        .reply_markup(keyboards::admin_nav_keyboard())
        .await?;
    Ok(())
}

async fn admin_back(
    bot: &Bot,
    ctx: &BotContext,
    user_id: i64,
    chat_id: ChatId,
    target: &str,
) -> HandlerResult {
    match target {
        "exit" => {
            ctx.dialogs.clear(user_id).await;
            bot.send_message(chat_id, "Left admin mode.").await?;
        }
        "users" => {
            let names: Vec<String> = users::list(&ctx.db)
                .await?
                .into_iter()
                .map(|u| u.name)
                .collect();
            ctx.dialogs
                .set(user_id, Dialog::Admin(AdminDialog::ChoosingUser))
                .await;
            bot.send_message(chat_id, "Whose tasks?")
                .reply_markup(keyboards::admin_users_keyboard(&names))
                .await?;
        }
        "views" => {
            let Some(Dialog::Admin(dialog)) = ctx.dialogs.get(user_id).await else {
                bot.send_message(chat_id, "Use /admin first.").await?;
                return Ok(());
            };
            match dialog.back() {
                Some(previous @ AdminDialog::ChoosingView { .. }) => {
                    ctx.dialogs.set(user_id, Dialog::Admin(previous)).await;
                    bot.send_message(chat_id, "Which tasks?")
                        .reply_markup(keyboards::admin_views_keyboard())
                        .await?;
                }
                _ => {
                    ctx.dialogs
                        .set(user_id, Dialog::Admin(AdminDialog::ChoosingUser))
                        .await;
                    let names: Vec<String> = users::list(&ctx.db)
                        .await?
                        .into_iter()
                        .map(|u| u.name)
                        .collect();
                    bot.send_message(chat_id, "Whose tasks?")
                        .reply_markup(keyboards::admin_users_keyboard(&names))
                        .await?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Splits `<sheet>:<task_id>` where the sheet name may not contain ':'.
fn parse_sheet_id(rest: &str) -> Option<(String, i64)> {
    let (sheet, id_str) = rest.rsplit_once(':')?;
    let task_id = id_str.parse::<i64>().ok()?;
    Some((sheet.to_string(), task_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sheet_id_splits_on_last_colon() {
        assert_eq!(parse_sheet_id("Ana:7"), Some(("Ana".into(), 7)));
        assert_eq!(parse_sheet_id("Common:42"), Some(("Common".into(), 42)));
        assert_eq!(parse_sheet_id("Ana"), None);
        assert_eq!(parse_sheet_id("Ana:x"), None);
    }
}
