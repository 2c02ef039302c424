// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Effective-status projection and listing filters.
//!
//! A common task has one row but many readers: each user sees it through
//! their own [`CommonProgress`] record. Precedence is strict and
//! order-sensitive: ARCHIVE on the task itself always wins, then a per-user
//! DONE, then the task's own status. Getting this wrong either resurfaces
//! archived tasks or hides tasks that are only done for somebody else.

use chrono::{NaiveDate, NaiveDateTime};

use crate::types::{CommonTask, FilterMode, PersonalTask, TaskStatus, TaskView};

/// Resolves the status a given user sees on a common task.
pub fn effective_status(base: TaskStatus, progress: Option<TaskStatus>) -> TaskStatus {
    match base {
        TaskStatus::Archive => TaskStatus::Archive,
        _ if progress == Some(TaskStatus::Done) => TaskStatus::Done,
        other => other,
    }
}

/// Projects a common task into one user's view of it.
pub fn effective_view(task: &CommonTask, progress: Option<TaskStatus>) -> TaskView {
    TaskView {
        task_id: task.id,
        text: task.text.clone(),
        from_name: task.from_name.clone(),
        due_at: task.due_at,
        status: effective_status(task.status, progress),
        is_common: true,
    }
}

/// Projects a personal task into a view (no per-user layer to apply).
pub fn personal_view(task: &PersonalTask) -> TaskView {
    TaskView {
        task_id: task.id,
        text: task.text.clone(),
        from_name: task.from_name.clone(),
        due_at: task.due_at,
        status: task.status,
        is_common: false,
    }
}

/// True when a due timestamp lies strictly before today.
pub fn is_overdue(due_at: NaiveDateTime, today: NaiveDate) -> bool {
    due_at.date() < today
}

impl FilterMode {
    /// Listing contract: `my` excludes DONE and ARCHIVE, `done` includes
    /// only DONE, `overdue` additionally requires a past due date, `all`
    /// excludes only ARCHIVE.
    pub fn matches(self, view: &TaskView, today: NaiveDate) -> bool {
        if view.status == TaskStatus::Archive {
            return false;
        }
        match self {
            FilterMode::My => view.status != TaskStatus::Done,
            FilterMode::Done => view.status == TaskStatus::Done,
            FilterMode::Overdue => {
                view.status != TaskStatus::Done
                    && view.due_at.is_some_and(|due| is_overdue(due, today))
            }
            FilterMode::All => true,
        }
    }
}

/// Sort key for listings: overdue first, then by due date, undated last.
pub fn sort_views(views: &mut [TaskView], today: NaiveDate) {
    views.sort_by_key(|v| {
        let overdue = v.due_at.is_some_and(|due| is_overdue(due, today))
            && v.status != TaskStatus::Done;
        (
            !overdue,
            v.due_at.unwrap_or(NaiveDateTime::MAX),
            v.task_id,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn common(status: TaskStatus, due: Option<&str>) -> CommonTask {
        CommonTask {
            id: 1,
            text: "ship release".into(),
            from_name: "Boris".into(),
            due_at: due.map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            }),
            status,
            created_at: NaiveDateTime::default(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[test]
    fn archive_wins_over_personal_done() {
        // An archived task a user already completed must stay hidden.
        let status = effective_status(TaskStatus::Archive, Some(TaskStatus::Done));
        assert_eq!(status, TaskStatus::Archive);

        let view = effective_view(&common(TaskStatus::Archive, None), Some(TaskStatus::Done));
        assert!(!FilterMode::My.matches(&view, today()));
        assert!(!FilterMode::Done.matches(&view, today()));
        assert!(!FilterMode::All.matches(&view, today()));
    }

    #[test]
    fn personal_done_wins_over_base_todo() {
        assert_eq!(
            effective_status(TaskStatus::Todo, Some(TaskStatus::Done)),
            TaskStatus::Done
        );
    }

    #[test]
    fn no_progress_inherits_base_status() {
        assert_eq!(effective_status(TaskStatus::Todo, None), TaskStatus::Todo);
        assert_eq!(
            effective_status(TaskStatus::Todo, Some(TaskStatus::Todo)),
            TaskStatus::Todo
        );
    }

    #[test]
    fn filter_my_excludes_done() {
        let view = effective_view(&common(TaskStatus::Todo, None), Some(TaskStatus::Done));
        assert!(!FilterMode::My.matches(&view, today()));
        assert!(FilterMode::Done.matches(&view, today()));
        assert!(FilterMode::All.matches(&view, today()));
    }

    #[test]
    fn filter_overdue_requires_past_due() {
        let past = effective_view(&common(TaskStatus::Todo, Some("2026-03-01")), None);
        let future = effective_view(&common(TaskStatus::Todo, Some("2026-04-01")), None);
        let undated = effective_view(&common(TaskStatus::Todo, None), None);
        assert!(FilterMode::Overdue.matches(&past, today()));
        assert!(!FilterMode::Overdue.matches(&future, today()));
        assert!(!FilterMode::Overdue.matches(&undated, today()));
    }

    #[test]
    fn due_today_is_not_overdue() {
        let due = today().and_hms_opt(0, 0, 0).unwrap();
        assert!(!is_overdue(due, today()));
    }

    #[test]
    fn sort_puts_overdue_first_then_by_due() {
        let mut views = vec![
            effective_view(&common(TaskStatus::Todo, None), None),
            effective_view(&common(TaskStatus::Todo, Some("2026-04-01")), None),
            effective_view(&common(TaskStatus::Todo, Some("2026-03-01")), None),
        ];
        sort_views(&mut views, today());
        assert_eq!(
            views[0].due_at.unwrap().date(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert_eq!(
            views[1].due_at.unwrap().date(),
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
        );
        assert!(views[2].due_at.is_none());
    }
}
