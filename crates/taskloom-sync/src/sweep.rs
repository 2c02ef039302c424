// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Monthly archive sweep.
//!
//! Flips DONE tasks with a due date strictly before the first day of the
//! current month to ARCHIVE, in both task tables. Each table that had
//! matches queues a single batch summary event, and the mirror re-runs the
//! same decision against its own rows when it applies that event.

use chrono::{Datelike, Local, NaiveDateTime, Utc};
use croner::Cron;
use taskloom_core::TaskloomError;
use taskloom_storage::Database;
use taskloom_storage::queries::{common, tasks};
use tracing::{error, info};

/// Counts of rows archived by one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub personal: usize,
    pub common: usize,
}

/// Midnight on the first day of the current month.
pub fn current_month_cutoff(now: NaiveDateTime) -> NaiveDateTime {
    now.date()
        .with_day(1)
        .unwrap_or_else(|| now.date())
        .and_hms_opt(0, 0, 0)
        .unwrap_or(now)
}

/// Runs one sweep over both task tables.
pub async fn run_once(db: &Database) -> Result<SweepReport, TaskloomError> {
    let cutoff = current_month_cutoff(Utc::now().naive_utc());
    let report = SweepReport {
        personal: tasks::archive_done_before(db, cutoff).await?,
        common: common::archive_done_before(db, cutoff).await?,
    };
    info!(
        cutoff = %cutoff,
        personal = report.personal,
        common = report.common,
        "archive sweep finished"
    );
    Ok(report)
}

/// Runs sweeps on a cron schedule until the process stops.
pub async fn run_schedule(db: &Database, cron_expr: &str) -> Result<(), TaskloomError> {
    let cron: Cron = cron_expr
        .parse()
        .map_err(|e| TaskloomError::Config(format!("invalid archive cron {cron_expr:?}: {e}")))?;
    info!(cron = cron_expr, "archive scheduler started");
    loop {
        let now = Local::now();
        let next = cron
            .find_next_occurrence(&now, false)
            .map_err(|e| TaskloomError::Internal(format!("cron evaluation failed: {e}")))?;
        let wait = (next - now)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(0));
        info!(next = %next, "next archive sweep scheduled");
        tokio::time::sleep(wait).await;
        if let Err(e) = run_once(db).await {
            error!(error = %e, "archive sweep failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn cutoff_is_first_of_month_midnight() {
        let now = NaiveDate::from_ymd_opt(2026, 3, 17)
            .unwrap()
            .and_hms_opt(14, 45, 9)
            .unwrap();
        let cutoff = current_month_cutoff(now);
        assert_eq!(
            cutoff,
            NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }
}
