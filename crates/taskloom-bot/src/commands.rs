// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands: registration, listings, dialog entry points.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use taskloom_core::dialog::{AdminDialog, NewTaskDialog};
use taskloom_core::types::{COMMON_PROGRESS_SHEET, COMMON_SHEET, USERS_SHEET};
use taskloom_core::view::{effective_view, personal_view, sort_views};
use taskloom_core::{Dialog, FilterMode, TaskStatus, TaskView, TaskloomError};
use taskloom_storage::Database;
use taskloom_storage::queries::{common, tasks, users};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::utils::command::BotCommands;
use tracing::warn;

use crate::keyboards;
use crate::{BotContext, HandlerResult};

const REGISTER_HINT: &str = "You are not registered. Use: /register <Name>";

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
    Register(String),
    Newtask,
    My,
    Overdue,
    Done,
    All,
    #[command(rename = "team_overdue")]
    TeamOverdue,
    Admin,
    #[command(rename = "del_user")]
    DelUser(String),
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<BotContext>,
) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    if !ctx.access.is_allowed(user_id) {
        bot.send_message(msg.chat.id, "You are not on the allow-list for this bot.")
            .await?;
        return Ok(());
    }

    match cmd {
        Command::Start => {
            let mut text = String::from(
                "Hi! I track team tasks.\n\n\
                 First, register:\n/register <Name>\n\n\
                 Commands:\n\
                 /newtask — create a task\n\
                 /my — my active tasks (personal + shared)\n\
                 /overdue — my overdue tasks\n\
                 /done — my finished tasks\n\
                 /all — everything of mine\n\
                 /team_overdue — overdue across the team\n",
            );
            if ctx.access.is_admin(user_id) {
                text.push_str("\nAdmin:\n/admin — browse and edit tasks\n/del_user <Name>\n");
            }
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Register(name) => {
            let name = name.trim();
            if name.is_empty() {
                bot.send_message(msg.chat.id, "Usage: /register <Name>\nExample: /register Ana")
                    .await?;
                return Ok(());
            }
            // Display names double as mirror sheet titles.
            if [USERS_SHEET, COMMON_SHEET, COMMON_PROGRESS_SHEET]
                .iter()
                .any(|reserved| reserved.eq_ignore_ascii_case(name))
            {
                bot.send_message(msg.chat.id, format!("'{name}' is a reserved name, pick another."))
                    .await?;
                return Ok(());
            }
            match users::upsert(&ctx.db, name, user_id).await {
                Ok(()) => {
                    bot.send_message(msg.chat.id, format!("Done ✅ You are registered as '{name}'."))
                        .await?;
                }
                Err(e) => {
                    warn!(error = %e, "registration failed");
                    bot.send_message(
                        msg.chat.id,
                        format!("Could not register '{name}' — the name may be taken."),
                    )
                    .await?;
                }
            }
        }

        Command::Newtask => {
            let team = users::list(&ctx.db).await?;
            if team.is_empty() {
                bot.send_message(
                    msg.chat.id,
                    "Nobody is registered yet. Start with /register <Name>.",
                )
                .await?;
                return Ok(());
            }
            let from_name = match users::get_by_telegram_id(&ctx.db, user_id).await? {
                Some(user) => user.name,
                None => from.full_name(),
            };
            ctx.dialogs
                .set(user_id, Dialog::NewTask(NewTaskDialog::start(from_name)))
                .await;
            let names: Vec<String> = team.into_iter().map(|u| u.name).collect();
            bot.send_message(msg.chat.id, "Who is the task for?")
                .reply_markup(keyboards::assignee_keyboard(&names))
                .await?;
        }

        Command::My => show_tasks(&bot, &msg, &ctx, user_id, FilterMode::My).await?,
        Command::Overdue => show_tasks(&bot, &msg, &ctx, user_id, FilterMode::Overdue).await?,
        Command::Done => show_tasks(&bot, &msg, &ctx, user_id, FilterMode::Done).await?,
        Command::All => show_tasks(&bot, &msg, &ctx, user_id, FilterMode::All).await?,

        Command::TeamOverdue => team_overdue(&bot, &msg, &ctx).await?,

        Command::Admin => {
            if !ctx.access.is_admin(user_id) {
                bot.send_message(msg.chat.id, "Admin commands are admin-only.")
                    .await?;
                return Ok(());
            }
            let names: Vec<String> = users::list(&ctx.db)
                .await?
                .into_iter()
                .map(|u| u.name)
                .collect();
            ctx.dialogs
                .set(user_id, Dialog::Admin(AdminDialog::start()))
                .await;
            bot.send_message(msg.chat.id, "Whose tasks?")
                .reply_markup(keyboards::admin_users_keyboard(&names))
                .await?;
        }

        Command::DelUser(name) => {
            if !ctx.access.is_admin(user_id) {
                bot.send_message(msg.chat.id, "Admin commands are admin-only.")
                    .await?;
                return Ok(());
            }
            let name = name.trim();
            if name.is_empty() {
                bot.send_message(msg.chat.id, "Usage: /del_user <Name>").await?;
                return Ok(());
            }
            match users::delete_by_name(&ctx.db, name).await? {
                Some(_) => {
                    bot.send_message(msg.chat.id, format!("User '{name}' deleted.")).await?;
                }
                None => {
                    bot.send_message(msg.chat.id, format!("No user named '{name}'.")).await?;
                }
            }
        }
    }
    Ok(())
}

/// Personal tasks plus per-user effective views of shared tasks, filtered
/// and sorted for one listing.
pub async fn user_views(
    db: &Database,
    name: &str,
    mode: FilterMode,
    today: NaiveDate,
) -> Result<Vec<TaskView>, TaskloomError> {
    let mut views: Vec<TaskView> = tasks::list(db, name)
        .await?
        .iter()
        .map(personal_view)
        .collect();

    let progress = common::progress_map(db, name).await?;
    views.extend(
        common::list(db)
            .await?
            .iter()
            .map(|task| effective_view(task, progress.get(&task.id).copied())),
    );

    views.retain(|v| mode.matches(v, today));
    sort_views(&mut views, today);
    Ok(views)
}

async fn show_tasks(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    user_id: i64,
    mode: FilterMode,
) -> HandlerResult {
    let Some(user) = users::get_by_telegram_id(&ctx.db, user_id).await? else {
        bot.send_message(msg.chat.id, REGISTER_HINT).await?;
        return Ok(());
    };

    let today = Local::now().date_naive();
    let views = user_views(&ctx.db, &user.name, mode, today).await?;
    if views.is_empty() {
        bot.send_message(msg.chat.id, "No tasks for this filter.").await?;
        return Ok(());
    }

    let lines: Vec<String> = views
        .iter()
        .map(|v| crate::format::format_task_line(v, today))
        .collect();
    for chunk in crate::format::chunk_lines(&lines) {
        bot.send_message(msg.chat.id, chunk).await?;
    }

    // Done buttons for whatever is still open.
    for view in views.iter().filter(|v| v.status != TaskStatus::Done) {
        if view.is_common {
            bot.send_message(
                msg.chat.id,
                format!("Mark shared task [{}] done for you?", view.task_id),
            )
            .reply_markup(keyboards::done_common_keyboard(view.task_id))
            .await?;
        } else {
            bot.send_message(msg.chat.id, format!("Mark task [{}] done?", view.task_id))
                .reply_markup(keyboards::done_personal_keyboard(&user.name, view.task_id))
                .await?;
        }
    }
    Ok(())
}

async fn team_overdue(bot: &Bot, msg: &Message, ctx: &BotContext) -> HandlerResult {
    let team = users::list(&ctx.db).await?;
    if team.is_empty() {
        bot.send_message(msg.chat.id, "Nobody is registered yet.").await?;
        return Ok(());
    }

    let today = Local::now().date_naive();
    let mut lines: Vec<String> = Vec::new();
    for user in &team {
        let views = user_views(&ctx.db, &user.name, FilterMode::Overdue, today).await?;
        if views.is_empty() {
            continue;
        }
        lines.push(format!("== {} ==", user.name));
        lines.extend(views.iter().map(|v| crate::format::format_task_line(v, today)));
    }

    if lines.is_empty() {
        bot.send_message(msg.chat.id, "No overdue tasks across the team 🎉")
            .await?;
        return Ok(());
    }
    for chunk in crate::format::chunk_lines(&lines) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}

/// Views of one sheet the way an admin sees it: base statuses only, no
/// per-user progress layer.
pub async fn sheet_views(
    db: &Database,
    sheet: &str,
    mode: FilterMode,
    today: NaiveDate,
) -> Result<Vec<TaskView>, TaskloomError> {
    let mut views: Vec<TaskView> = if sheet == COMMON_SHEET {
        common::list(db)
            .await?
            .iter()
            .map(|task| effective_view(task, None))
            .collect()
    } else {
        tasks::list(db, sheet).await?.iter().map(personal_view).collect()
    };
    views.retain(|v| mode.matches(v, today));
    sort_views(&mut views, today);
    Ok(views)
}

/// Sends the notification a user gets when a task lands on them.
/// Best-effort: failure is logged and never unwinds the creation.
pub async fn notify_assignee(bot: &Bot, ctx: &BotContext, assignee: &str, line: &str) {
    let user = match users::get_by_name(&ctx.db, assignee).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(e) => {
            warn!(error = %e, assignee, "assignee lookup failed, skipping notification");
            return;
        }
    };
    let text = format!("📬 New task!\n\n{line}\n\nSee yours: /my");
    if let Err(e) = bot.send_message(ChatId(user.telegram_id), text).await {
        warn!(error = %e, assignee, "assignment notification failed");
    }
}

pub fn parse_filter_mode(s: &str) -> Option<FilterMode> {
    FilterMode::from_str(s).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    async fn open_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (dir, db)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn listing_merges_personal_and_shared_per_user() {
        let (_dir, db) = open_db().await;
        users::upsert(&db, "Ana", 1).await.unwrap();
        users::upsert(&db, "Boris", 2).await.unwrap();

        let due = day(10).and_hms_opt(0, 0, 0).unwrap();
        tasks::create(&db, "Ana", "write report", "Boris", Some(due))
            .await
            .unwrap();
        let shared = common::create(&db, "clean kitchen", "Ana", Some(due))
            .await
            .unwrap();
        common::progress_set_done(&db, shared, "Ana").await.unwrap();

        let today = day(15);
        // Ana finished her copy of the shared task, so only the personal
        // one is still active for her.
        let ana = user_views(&db, "Ana", FilterMode::My, today).await.unwrap();
        assert_eq!(ana.len(), 1);
        assert_eq!(ana[0].text, "write report");

        // Boris never touched it; he still sees it as active.
        let boris = user_views(&db, "Boris", FilterMode::My, today)
            .await
            .unwrap();
        assert_eq!(boris.len(), 1);
        assert!(boris[0].is_common);

        let ana_done = user_views(&db, "Ana", FilterMode::Done, today)
            .await
            .unwrap();
        assert_eq!(ana_done.len(), 1);
        assert!(ana_done[0].is_common);
    }

    #[tokio::test]
    async fn overdue_sorts_before_upcoming() {
        let (_dir, db) = open_db().await;
        users::upsert(&db, "Ana", 1).await.unwrap();
        let late = day(1).and_hms_opt(0, 0, 0).unwrap();
        let soon = day(20).and_hms_opt(0, 0, 0).unwrap();
        tasks::create(&db, "Ana", "upcoming", "Ana", Some(soon))
            .await
            .unwrap();
        tasks::create(&db, "Ana", "late", "Ana", Some(late))
            .await
            .unwrap();

        let views = user_views(&db, "Ana", FilterMode::All, day(15))
            .await
            .unwrap();
        assert_eq!(views[0].text, "late");
        assert_eq!(views[1].text, "upcoming");
    }

    #[tokio::test]
    async fn admin_sheet_view_ignores_personal_progress() {
        let (_dir, db) = open_db().await;
        users::upsert(&db, "Ana", 1).await.unwrap();
        let due = day(10).and_hms_opt(0, 0, 0).unwrap();
        let shared = common::create(&db, "clean kitchen", "Ana", Some(due))
            .await
            .unwrap();
        common::progress_set_done(&db, shared, "Ana").await.unwrap();

        // The base status is still TODO: one user's DONE is not the team's.
        let views = sheet_views(&db, COMMON_SHEET, FilterMode::My, day(15))
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, TaskStatus::Todo);
    }
}
