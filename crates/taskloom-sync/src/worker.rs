// SPDX-FileCopyrightText: 2026 Taskloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The drain loop.

use std::sync::Arc;
use std::time::Duration;

use taskloom_core::{OutboxEvent, SheetStore, TaskloomError};
use taskloom_storage::Database;
use taskloom_storage::queries::{outbox, users};
use tracing::{debug, error, info, warn};

use crate::apply::apply_event;
use crate::schema::ensure_base_structure;

/// Outcome of one drain cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub processed: usize,
    pub failed: usize,
}

/// Drains pending outbox events into a [`SheetStore`] on an interval.
pub struct SyncWorker {
    db: Database,
    sheets: Arc<dyn SheetStore>,
    interval: Duration,
    batch_limit: usize,
}

impl SyncWorker {
    pub fn new(
        db: Database,
        sheets: Arc<dyn SheetStore>,
        interval: Duration,
        batch_limit: usize,
    ) -> Self {
        Self {
            db,
            sheets,
            interval,
            batch_limit,
        }
    }

    /// Runs drain cycles until the process stops. A failed cycle is logged
    /// and retried on the next tick; the worker itself never gives up.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            batch_limit = self.batch_limit,
            "mirror sync worker started"
        );
        loop {
            match self.drain().await {
                Ok(report) if report.processed > 0 || report.failed > 0 => {
                    info!(
                        processed = report.processed,
                        failed = report.failed,
                        "drain cycle finished"
                    );
                }
                Ok(_) => debug!("drain cycle finished, queue empty"),
                Err(e) => error!(error = %e, "drain cycle failed"),
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One drain cycle: heal the workbook layout, then apply up to
    /// `batch_limit` pending events oldest-first, marking each processed
    /// or errored individually.
    pub async fn drain(&self) -> Result<DrainReport, TaskloomError> {
        let names: Vec<String> = users::list(&self.db)
            .await?
            .into_iter()
            .map(|u| u.name)
            .collect();
        ensure_base_structure(self.sheets.as_ref(), &names).await?;

        let pending = outbox::fetch_pending(&self.db, self.batch_limit).await?;
        let mut report = DrainReport::default();

        for row in pending {
            let outcome = match OutboxEvent::from_payload(&row.payload) {
                Ok(event) => {
                    apply_event(self.sheets.as_ref(), &event, row.created_at, &names).await
                }
                Err(e) => Err(TaskloomError::Internal(format!(
                    "undecodable outbox payload: {e}"
                ))),
            };
            match outcome {
                Ok(()) => {
                    outbox::mark_processed(&self.db, row.id).await?;
                    report.processed += 1;
                }
                Err(e) => {
                    warn!(
                        event_id = row.id,
                        event_type = %row.event_type,
                        error = %e,
                        "event failed to apply, will retry"
                    );
                    outbox::mark_error(&self.db, row.id, &e.to_string()).await?;
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
