// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Free-text input for active dialogs, and the terminal create step.
//!
//! Every branch either advances the state machine on valid input or
//! re-prompts without advancing. The terminal create removes the dialog
//! atomically first, so a duplicate submission finds nothing to act on; on
//! a storage failure the state is put back for retry.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use taskloom_core::dialog::{AdminDialog, NewTaskDialog};
use taskloom_core::types::COMMON_SHEET;
use taskloom_core::view::personal_view;
use taskloom_core::{Dialog, TaskView, TaskloomError};
use taskloom_storage::queries::{common, tasks};
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::warn;

use crate::dates::parse_due_input;
use crate::format::format_task_line;
use crate::keyboards;
use crate::{BotContext, HandlerResult};

pub async fn handle_text(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> HandlerResult {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    if !ctx.access.is_allowed(user_id) {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };

    match ctx.dialogs.get(user_id).await {
        Some(Dialog::NewTask(dialog @ NewTaskDialog::EnteringText { .. })) => {
            let text = text.trim();
            if text.is_empty() {
                bot.send_message(msg.chat.id, "The task text is empty. Write it again.")
                    .reply_markup(keyboards::text_entry_keyboard())
                    .await?;
                return Ok(());
            }
            ctx.dialogs
                .set(user_id, Dialog::NewTask(dialog.with_text(text.to_string())))
                .await;
            bot.send_message(msg.chat.id, "When is it due?")
                .reply_markup(keyboards::due_keyboard())
                .await?;
        }

        Some(Dialog::NewTask(NewTaskDialog::EnteringDueManual { .. })) => {
            let Some(due) = parse_due_input(text) else {
                bot.send_message(
                    msg.chat.id,
                    "Could not read that date. Try 2026-02-05 or 05.02.2026.",
                )
                .reply_markup(keyboards::manual_due_keyboard())
                .await?;
                return Ok(());
            };
            finalize_create(&bot, &ctx, user_id, msg.chat.id, due).await?;
        }

        Some(Dialog::Admin(AdminDialog::EditingText { sheet, task_id })) => {
            let text = text.trim();
            if text.is_empty() {
                bot.send_message(msg.chat.id, "The new text is empty. Write it again.")
                    .await?;
                return Ok(());
            }
            let found = if sheet == COMMON_SHEET {
                common::update_text(&ctx.db, task_id, text).await?
            } else {
                tasks::update_text(&ctx.db, &sheet, task_id, text).await?
            };
            let reply = if found {
                format!("Text of [{task_id}] updated.")
            } else {
                format!("Task [{task_id}] no longer exists.")
            };
            ctx.dialogs
                .set(user_id, Dialog::Admin(AdminDialog::ChoosingView { sheet }))
                .await;
            bot.send_message(msg.chat.id, reply)
                .reply_markup(keyboards::admin_views_keyboard())
                .await?;
        }

        Some(Dialog::Admin(AdminDialog::EditingDue { sheet, task_id })) => {
            let Some(due) = parse_due_input(text) else {
                bot.send_message(
                    msg.chat.id,
                    "Could not read that date. Try 2026-02-05 or 05.02.2026.",
                )
                .await?;
                return Ok(());
            };
            let found = if sheet == COMMON_SHEET {
                common::update_due(&ctx.db, task_id, Some(due)).await?
            } else {
                tasks::update_due(&ctx.db, &sheet, task_id, Some(due)).await?
            };
            let reply = if found {
                format!("Due date of [{task_id}] updated.")
            } else {
                format!("Task [{task_id}] no longer exists.")
            };
            ctx.dialogs
                .set(user_id, Dialog::Admin(AdminDialog::ChoosingView { sheet }))
                .await;
            bot.send_message(msg.chat.id, reply)
                .reply_markup(keyboards::admin_views_keyboard())
                .await?;
        }

        // No dialog, or a state waiting for a button rather than text.
        _ => {}
    }
    Ok(())
}

/// What the terminal create step decided, for the messaging layer to render.
#[derive(Debug)]
pub(crate) enum TerminalCreate {
    /// No dialog existed (duplicate tap, or stray input).
    NoDialog,
    /// Dialog was not at the due step; it was put back untouched.
    NotReady,
    /// Creation failed; the due step was restored for retry.
    Restored,
    Created { view: TaskView, assignee: String },
}

/// The terminal step of the new-task flow. The dialog is removed before
/// the create so a double-tapped preset cannot fire twice; a storage
/// error restores it.
pub(crate) async fn terminal_create(
    ctx: &BotContext,
    user_id: i64,
    due: NaiveDateTime,
) -> TerminalCreate {
    let Some(dialog) = ctx.dialogs.take(user_id).await else {
        return TerminalCreate::NoDialog;
    };

    let (from_name, assignee, text) = match dialog {
        Dialog::NewTask(NewTaskDialog::ChoosingDuePreset {
            from_name,
            assignee,
            text,
        })
        | Dialog::NewTask(NewTaskDialog::EnteringDueManual {
            from_name,
            assignee,
            text,
        }) => (from_name, assignee, text),
        other => {
            ctx.dialogs.set(user_id, other).await;
            return TerminalCreate::NotReady;
        }
    };

    match create_task(ctx, &assignee, &text, &from_name, due).await {
        Ok(view) => TerminalCreate::Created { view, assignee },
        Err(e) => {
            warn!(error = %e, "task creation failed, restoring dialog");
            ctx.dialogs
                .set(
                    user_id,
                    Dialog::NewTask(NewTaskDialog::ChoosingDuePreset {
                        from_name,
                        assignee,
                        text,
                    }),
                )
                .await;
            TerminalCreate::Restored
        }
    }
}

/// Runs the terminal create and reports the outcome to the chat, with a
/// best-effort notification to the assignee.
pub async fn finalize_create(
    bot: &Bot,
    ctx: &BotContext,
    user_id: i64,
    chat_id: ChatId,
    due: NaiveDateTime,
) -> HandlerResult {
    match terminal_create(ctx, user_id, due).await {
        TerminalCreate::NoDialog => {
            bot.send_message(chat_id, "No task in progress. Start with /newtask.")
                .await?;
        }
        TerminalCreate::NotReady => {
            bot.send_message(chat_id, "Finish the earlier steps first.").await?;
        }
        TerminalCreate::Restored => {
            bot.send_message(chat_id, "Could not save the task. Pick the due date again.")
                .reply_markup(keyboards::due_keyboard())
                .await?;
        }
        TerminalCreate::Created { view, assignee } => {
            let today = Local::now().date_naive();
            let line = format_task_line(&view, today);
            if !view.is_common {
                crate::commands::notify_assignee(bot, ctx, &assignee, &line).await;
            }
            bot.send_message(chat_id, format!("Done ✅ Task created.\n\n{line}"))
                .await?;
        }
    }
    Ok(())
}

async fn create_task(
    ctx: &BotContext,
    assignee: &str,
    text: &str,
    from_name: &str,
    due: NaiveDateTime,
) -> Result<TaskView, TaskloomError> {
    if assignee == COMMON_SHEET {
        let id = common::create(&ctx.db, text, from_name, Some(due)).await?;
        let task = common::get(&ctx.db, id)
            .await?
            .ok_or_else(|| TaskloomError::Internal(format!("created common task {id} vanished")))?;
        Ok(taskloom_core::view::effective_view(&task, None))
    } else {
        let id = tasks::create(&ctx.db, assignee, text, from_name, Some(due)).await?;
        let task = tasks::get(&ctx.db, assignee, id)
            .await?
            .ok_or_else(|| TaskloomError::Internal(format!("created task {id} vanished")))?;
        Ok(personal_view(&task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use taskloom_config::model::BotConfig;
    use taskloom_storage::Database;
    use taskloom_storage::queries::{outbox, users};
    use tempfile::TempDir;

    use crate::{MemoryDialogs, StaticAccessPolicy};

    /// Mock private chat message, matching Telegram Bot API structure.
    fn make_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": user_id as i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    async fn make_ctx() -> (TempDir, Arc<BotContext>) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        let ctx = Arc::new(BotContext {
            db,
            dialogs: Arc::new(MemoryDialogs::new()),
            access: Arc::new(StaticAccessPolicy::from_config(&BotConfig {
                token: None,
                allowed_ids: vec![1],
                admin_ids: vec![],
            })),
        });
        (dir, ctx)
    }

    fn due_step(assignee: &str) -> Dialog {
        Dialog::NewTask(NewTaskDialog::ChoosingDuePreset {
            from_name: "Boris".into(),
            assignee: assignee.into(),
            text: "write report".into(),
        })
    }

    fn some_due() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    // The no-send paths of handle_text are driven with a bot that would
    // fail loudly if anything tried the network.
    fn offline_bot() -> Bot {
        Bot::new("0:offline")
    }

    #[tokio::test]
    async fn unlisted_sender_is_ignored() {
        let (_dir, ctx) = make_ctx().await;
        ctx.dialogs.set(99, due_step("Ana")).await;
        handle_text(offline_bot(), make_message(99, "hello"), ctx.clone())
            .await
            .unwrap();
        // Still exactly where it was; nothing reached storage.
        assert_eq!(ctx.dialogs.get(99).await, Some(due_step("Ana")));
        assert!(outbox::fetch_pending(&ctx.db, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn text_while_awaiting_a_button_does_not_advance() {
        let (_dir, ctx) = make_ctx().await;
        ctx.dialogs.set(1, due_step("Ana")).await;
        handle_text(offline_bot(), make_message(1, "tomorrow please"), ctx.clone())
            .await
            .unwrap();
        assert_eq!(ctx.dialogs.get(1).await, Some(due_step("Ana")));
        assert!(outbox::fetch_pending(&ctx.db, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_mid_flow_leaves_no_durable_writes() {
        let (_dir, ctx) = make_ctx().await;
        users::upsert(&ctx.db, "Ana", 1).await.unwrap();
        let baseline = outbox::fetch_pending(&ctx.db, 10).await.unwrap().len();

        // Walk the whole flow up to manual due entry, then cancel.
        let dialog = NewTaskDialog::start("Boris".into())
            .with_assignee("Ana".into())
            .with_text("write report".into())
            .manual_due();
        ctx.dialogs.set(1, Dialog::NewTask(dialog)).await;
        ctx.dialogs.clear(1).await;

        assert_eq!(ctx.dialogs.get(1).await, None);
        assert_eq!(
            outbox::fetch_pending(&ctx.db, 10).await.unwrap().len(),
            baseline
        );
        assert!(tasks::list(&ctx.db, "Ana").await.unwrap().is_empty());
        assert!(common::list(&ctx.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn terminal_create_fires_exactly_once() {
        let (_dir, ctx) = make_ctx().await;
        users::upsert(&ctx.db, "Ana", 1).await.unwrap();
        ctx.dialogs.set(1, due_step("Ana")).await;

        let first = terminal_create(&ctx, 1, some_due()).await;
        assert!(matches!(first, TerminalCreate::Created { .. }));

        // A duplicate tap finds no dialog and creates nothing.
        let second = terminal_create(&ctx, 1, some_due()).await;
        assert!(matches!(second, TerminalCreate::NoDialog));

        assert_eq!(tasks::list(&ctx.db, "Ana").await.unwrap().len(), 1);
        // One USER_UPSERT plus one TASK_CREATED, nothing more.
        assert_eq!(outbox::fetch_pending(&ctx.db, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_create_restores_the_due_step() {
        let (_dir, ctx) = make_ctx().await;
        ctx.dialogs.set(1, due_step("Ana")).await;
        // Kill the shared connection so the create fails.
        ctx.db.clone().close().await.unwrap();

        let outcome = terminal_create(&ctx, 1, some_due()).await;
        assert!(matches!(outcome, TerminalCreate::Restored));
        assert_eq!(ctx.dialogs.get(1).await, Some(due_step("Ana")));
    }

    #[tokio::test]
    async fn premature_due_leaves_the_dialog_in_place() {
        let (_dir, ctx) = make_ctx().await;
        let entering = Dialog::NewTask(
            NewTaskDialog::start("Boris".into()).with_assignee("Ana".into()),
        );
        ctx.dialogs.set(1, entering.clone()).await;

        let outcome = terminal_create(&ctx, 1, some_due()).await;
        assert!(matches!(outcome, TerminalCreate::NotReady));
        assert_eq!(ctx.dialogs.get(1).await, Some(entering));
        assert!(outbox::fetch_pending(&ctx.db, 10).await.unwrap().is_empty());
    }
}
