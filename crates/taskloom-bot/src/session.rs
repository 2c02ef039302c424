// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process dialog session store.

use async_trait::async_trait;
use dashmap::DashMap;
use taskloom_core::{Dialog, DialogStore};

/// Dialog state keyed by Telegram user id, held in a concurrent map.
///
/// `take` is a single atomic remove, which is what makes the terminal
/// create step fire at most once when a button is double-tapped.
#[derive(Debug, Default)]
pub struct MemoryDialogs {
    dialogs: DashMap<i64, Dialog>,
}

impl MemoryDialogs {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DialogStore for MemoryDialogs {
    async fn get(&self, user_id: i64) -> Option<Dialog> {
        self.dialogs.get(&user_id).map(|d| d.clone())
    }

    async fn set(&self, user_id: i64, dialog: Dialog) {
        self.dialogs.insert(user_id, dialog);
    }

    async fn take(&self, user_id: i64) -> Option<Dialog> {
        self.dialogs.remove(&user_id).map(|(_, d)| d)
    }

    async fn clear(&self, user_id: i64) {
        self.dialogs.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskloom_core::dialog::NewTaskDialog;

    fn dialog() -> Dialog {
        Dialog::NewTask(NewTaskDialog::start("Boris".into()))
    }

    #[tokio::test]
    async fn set_replaces_existing_dialog() {
        let store = MemoryDialogs::new();
        store.set(1, dialog()).await;
        store
            .set(1, Dialog::NewTask(NewTaskDialog::start("Vera".into())))
            .await;
        assert_eq!(
            store.get(1).await,
            Some(Dialog::NewTask(NewTaskDialog::start("Vera".into())))
        );
    }

    #[tokio::test]
    async fn take_yields_at_most_once() {
        let store = MemoryDialogs::new();
        store.set(1, dialog()).await;
        assert!(store.take(1).await.is_some());
        assert!(store.take(1).await.is_none());
        assert!(store.get(1).await.is_none());
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = MemoryDialogs::new();
        store.set(1, dialog()).await;
        assert!(store.get(2).await.is_none());
        store.clear(2).await;
        assert!(store.get(1).await.is_some());
    }
}
