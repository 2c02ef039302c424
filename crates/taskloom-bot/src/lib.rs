// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram surface for taskloom.
//!
//! Commands and button callbacks dispatch through teloxide into the
//! durable store's query modules; multi-step flows go through the dialog
//! state machines in taskloom-core, with state held in [`MemoryDialogs`].
//! The bot never reads the spreadsheet mirror.

pub mod auth;
pub mod callbacks;
pub mod commands;
pub mod dates;
pub mod dialogs;
pub mod format;
pub mod keyboards;
pub mod session;

use std::sync::Arc;

use taskloom_core::{AccessPolicy, DialogStore};
use taskloom_storage::Database;
use teloxide::prelude::*;
use tracing::info;

pub use auth::StaticAccessPolicy;
pub use session::MemoryDialogs;

/// Everything a handler needs, injected through dptree.
pub struct BotContext {
    pub db: Database,
    pub dialogs: Arc<dyn DialogStore>,
    pub access: Arc<dyn AccessPolicy>,
}

/// Result type for teloxide endpoints.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Starts long polling and dispatches until shutdown.
pub async fn run(token: &str, ctx: Arc<BotContext>) {
    let bot = Bot::new(token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<commands::Command>()
                .endpoint(commands::handle_command),
        )
        .branch(Update::filter_message().endpoint(dialogs::handle_text))
        .branch(Update::filter_callback_query().endpoint(callbacks::handle_callback));

    info!("starting Telegram long polling");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
