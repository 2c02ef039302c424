// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user dialog state machines.
//!
//! Two multi-step flows exist: task creation and admin task browsing.
//! Each state accepts exactly one kind of input and only moves forward on
//! valid input; handlers re-prompt without advancing otherwise. Every state
//! has a cancel edge (drop the whole dialog) and a back edge that returns
//! to the previous state, discarding the field that state collects.
//!
//! Dialog state lives only in the session store ([`crate::traits::DialogStore`]),
//! keyed by Telegram user id, and is never persisted to the durable store.

use crate::types::FilterMode;

/// All dialog flows a user can be in. At most one per user at a time;
/// starting a new flow replaces the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    NewTask(NewTaskDialog),
    Admin(AdminDialog),
}

/// Task-creation flow:
/// `ChoosingAssignee -> EnteringText -> ChoosingDuePreset (-> EnteringDueManual)`.
///
/// The terminal transition (a resolved due date while in `ChoosingDuePreset`
/// or `EnteringDueManual`) is performed by the handler, which must create
/// the task exactly once and clear the dialog even if the follow-up
/// notification fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewTaskDialog {
    ChoosingAssignee {
        from_name: String,
    },
    EnteringText {
        from_name: String,
        assignee: String,
    },
    ChoosingDuePreset {
        from_name: String,
        assignee: String,
        text: String,
    },
    EnteringDueManual {
        from_name: String,
        assignee: String,
        text: String,
    },
}

impl NewTaskDialog {
    pub fn start(from_name: String) -> Self {
        NewTaskDialog::ChoosingAssignee { from_name }
    }

    /// Assignee picked while choosing one.
    pub fn with_assignee(self, assignee: String) -> Self {
        match self {
            NewTaskDialog::ChoosingAssignee { from_name } => {
                NewTaskDialog::EnteringText { from_name, assignee }
            }
            other => other,
        }
    }

    /// Task text entered while entering text.
    pub fn with_text(self, text: String) -> Self {
        match self {
            NewTaskDialog::EnteringText { from_name, assignee } => {
                NewTaskDialog::ChoosingDuePreset {
                    from_name,
                    assignee,
                    text,
                }
            }
            other => other,
        }
    }

    /// "Other" preset picked: switch to manual date entry.
    pub fn manual_due(self) -> Self {
        match self {
            NewTaskDialog::ChoosingDuePreset {
                from_name,
                assignee,
                text,
            } => NewTaskDialog::EnteringDueManual {
                from_name,
                assignee,
                text,
            },
            other => other,
        }
    }

    /// One step back, discarding the field collected by the state being
    /// left. `None` means there is nowhere to go back to.
    pub fn back(self) -> Option<Self> {
        match self {
            NewTaskDialog::ChoosingAssignee { .. } => None,
            NewTaskDialog::EnteringText { from_name, .. } => {
                Some(NewTaskDialog::ChoosingAssignee { from_name })
            }
            NewTaskDialog::ChoosingDuePreset {
                from_name,
                assignee,
                ..
            } => Some(NewTaskDialog::EnteringText { from_name, assignee }),
            NewTaskDialog::EnteringDueManual {
                from_name,
                assignee,
                text,
            } => Some(NewTaskDialog::ChoosingDuePreset {
                from_name,
                assignee,
                text,
            }),
        }
    }
}

/// Admin browsing/editing flow:
/// `ChoosingUser -> ChoosingView -> {EditingText | EditingDue}`.
///
/// `sheet` is the selected user's display name, or the Common sheet title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminDialog {
    ChoosingUser,
    ChoosingView {
        sheet: String,
    },
    Browsing {
        sheet: String,
        mode: FilterMode,
    },
    EditingText {
        sheet: String,
        task_id: i64,
    },
    EditingDue {
        sheet: String,
        task_id: i64,
    },
}

impl AdminDialog {
    pub fn start() -> Self {
        AdminDialog::ChoosingUser
    }

    pub fn with_sheet(self, sheet: String) -> Self {
        match self {
            AdminDialog::ChoosingUser => AdminDialog::ChoosingView { sheet },
            other => other,
        }
    }

    pub fn with_mode(self, mode: FilterMode) -> Self {
        match self {
            AdminDialog::ChoosingView { sheet } => AdminDialog::Browsing { sheet, mode },
            other => other,
        }
    }

    pub fn back(self) -> Option<Self> {
        match self {
            AdminDialog::ChoosingUser => None,
            AdminDialog::ChoosingView { .. } => Some(AdminDialog::ChoosingUser),
            AdminDialog::Browsing { sheet, .. } => Some(AdminDialog::ChoosingView { sheet }),
            AdminDialog::EditingText { sheet, .. } | AdminDialog::EditingDue { sheet, .. } => {
                Some(AdminDialog::ChoosingView { sheet })
            }
        }
    }
}
