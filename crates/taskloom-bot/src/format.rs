// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task listing text and message chunking.

use chrono::NaiveDate;
use taskloom_core::types::{TaskStatus, TaskView, due_to_string};
use taskloom_core::view::is_overdue;

/// Telegram caps messages at 4096 chars; stay comfortably below.
const MAX_CHUNK_CHARS: usize = 3500;

/// One listing line for a task. Common tasks get a pin marker, overdue
/// active tasks a warning.
pub fn format_task_line(view: &TaskView, today: NaiveDate) -> String {
    let common_prefix = if view.is_common { "📌 " } else { "" };
    let overdue_mark = if view.status != TaskStatus::Done
        && view.due_at.is_some_and(|due| is_overdue(due, today))
    {
        " ⚠️ OVERDUE"
    } else {
        ""
    };
    let due = match view.due_at {
        Some(_) => due_to_string(view.due_at),
        None => "-".to_string(),
    };
    format!(
        "• {common_prefix}[{id}] {text}\n  From: {from} | Due: {due} | Status: {status}{overdue_mark}",
        id = view.task_id,
        text = view.text,
        from = view.from_name,
        status = view.status,
    )
}

/// Packs lines into messages below the Telegram length limit. A single
/// line longer than the limit is hard-split at char boundaries so no
/// chunk can exceed it.
pub fn chunk_lines(lines: &[String]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buf = String::new();
    for line in lines {
        for piece in split_oversized(line) {
            if !buf.is_empty() && buf.len() + piece.len() + 2 > MAX_CHUNK_CHARS {
                chunks.push(buf);
                buf = String::new();
            }
            buf.push_str(piece);
            buf.push_str("\n\n");
        }
    }
    if !buf.trim().is_empty() {
        chunks.push(buf);
    }
    chunks
}

/// Slices a line into pieces that fit the chunk budget on their own.
fn split_oversized(line: &str) -> impl Iterator<Item = &str> {
    let budget = MAX_CHUNK_CHARS - 2;
    let mut rest = line;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let mut end = rest.len().min(budget);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (piece, tail) = rest.split_at(end);
        rest = tail;
        Some(piece)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(due: Option<&str>, status: TaskStatus, is_common: bool) -> TaskView {
        TaskView {
            task_id: 7,
            text: "write report".into(),
            from_name: "Boris".into(),
            due_at: due.map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            }),
            status,
            is_common,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[test]
    fn marks_common_and_overdue() {
        let line = format_task_line(&view(Some("2026-03-01"), TaskStatus::Todo, true), today());
        assert!(line.starts_with("• 📌 [7] write report"));
        assert!(line.contains("OVERDUE"));
        assert!(line.contains("Due: 2026-03-01 00:00"));
    }

    #[test]
    fn done_tasks_are_never_marked_overdue() {
        let line = format_task_line(&view(Some("2026-03-01"), TaskStatus::Done, false), today());
        assert!(!line.contains("OVERDUE"));
        assert!(!line.contains("📌"));
    }

    #[test]
    fn undated_shows_dash() {
        let line = format_task_line(&view(None, TaskStatus::Todo, false), today());
        assert!(line.contains("Due: - |"));
    }

    #[test]
    fn chunking_respects_the_limit() {
        let lines: Vec<String> = (0..200).map(|i| format!("line {i} {}", "x".repeat(90))).collect();
        let chunks = chunk_lines(&lines);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_CHARS + 2));
        // Nothing lost.
        let total: usize = chunks.iter().map(|c| c.matches("line ").count()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_lines(&[]).is_empty());
    }

    #[test]
    fn oversized_line_is_hard_split() {
        // One pathological task text near Telegram's own input limit.
        let lines = vec!["x".repeat(4000), "short".to_string()];
        let chunks = chunk_lines(&lines);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK_CHARS));
        let glued: String = chunks.concat().replace("\n\n", "");
        assert_eq!(glued.matches('x').count(), 4000);
        assert!(glued.ends_with("short"));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let lines = vec!["⚠".repeat(2000)];
        let chunks = chunk_lines(&lines);
        assert!(chunks.len() > 1);
        // Re-parsing would panic on a broken boundary; count survives.
        let total: usize = chunks.iter().map(|c| c.matches('⚠').count()).sum();
        assert_eq!(total, 2000);
    }
}
