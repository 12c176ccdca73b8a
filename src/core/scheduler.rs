//! Background scheduling of the periodic report jobs.
//!
//! [`ReportScheduler`] spawns one tokio task per report kind. Each task sleeps until
//! the next trigger, runs the job, then computes the following trigger from the
//! calendar again instead of repeating a fixed period.

use crate::core::{
    report::ReportKind,
    schedule,
    worker::{self, JobOutcome},
};
use chrono::Local;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Keeps one background task per scheduled report kind.
pub struct ReportScheduler {
    db: DatabaseConnection,
    currency: String,
    tasks: HashMap<ReportKind, JoinHandle<()>>,
}

impl ReportScheduler {
    /// Creates a scheduler with nothing scheduled yet.
    #[must_use]
    pub fn new(db: DatabaseConnection, currency: impl Into<String>) -> Self {
        Self {
            db,
            currency: currency.into(),
            tasks: HashMap::new(),
        }
    }

    /// Schedules the job of `kind`.
    ///
    /// An existing live task for the same kind is kept. Returns `true` when a new task
    /// was spawned.
    pub fn register(&mut self, kind: ReportKind) -> bool {
        if self.is_scheduled(kind) {
            info!("{kind} report already scheduled, keeping it");
            return false;
        }

        let db = self.db.clone();
        let currency = self.currency.clone();
        let handle = tokio::spawn(async move {
            run_forever(db, kind, currency).await;
        });

        info!("Registered {kind} report job");
        self.tasks.insert(kind, handle);
        true
    }

    /// Schedules every report kind.
    pub fn schedule_all(&mut self) {
        for kind in ReportKind::ALL {
            self.register(kind);
        }
    }

    /// True when a live task exists for `kind`.
    #[must_use]
    pub fn is_scheduled(&self, kind: ReportKind) -> bool {
        self.tasks.get(&kind).is_some_and(|h| !h.is_finished())
    }

    /// Number of live tasks.
    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        ReportKind::ALL
            .iter()
            .filter(|&&kind| self.is_scheduled(kind))
            .count()
    }

    /// Aborts every scheduled task.
    pub fn cancel_all(&mut self) {
        for (kind, handle) in self.tasks.drain() {
            handle.abort();
            info!("Cancelled {kind} report job");
        }
    }
}

impl Drop for ReportScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn run_forever(db: DatabaseConnection, kind: ReportKind, currency: String) {
    // Never compute the next trigger from a time before the one that just fired
    let mut earliest = Local::now().naive_local();

    loop {
        let now = Local::now().naive_local().max(earliest);
        let trigger = schedule::next_trigger(kind, now);
        let delay = trigger - Local::now().naive_local();
        info!(
            "Next {kind} report at {} (in {} min)",
            trigger.format("%d/%m/%Y %H:%M"),
            delay.num_minutes()
        );

        tokio::time::sleep(schedule::to_sleep_duration(delay)).await;
        earliest = trigger;

        let run_at = Local::now().naive_local().max(trigger);
        match worker::run_report_job(&db, kind, run_at, &currency).await {
            JobOutcome::Generated(stored) => info!("{kind} report {} stored", stored.id),
            JobOutcome::Skipped => info!("{kind} report skipped"),
            JobOutcome::Failed(message) => error!("{kind} report failed: {message}"),
        }
    }
}
