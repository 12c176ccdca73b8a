//! One run of a periodic report job.
//!
//! The job reads the active monthly budget and generates the report of the requested
//! kind. A missing budget is not an error: the run is skipped. Failures are logged and
//! returned to the caller; there is no retry.

use crate::{
    core::{
        budget,
        report::{self, ReportKind},
    },
    entities::report as report_entity,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

/// Result of one job run.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// A report was generated and stored
    Generated(report_entity::Model),
    /// No monthly budget is set, nothing was generated
    Skipped,
    /// The run failed with this message
    Failed(String),
}

impl JobOutcome {
    /// Generated and skipped runs both count as successful.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Runs the report job of `kind` at `now`.
pub async fn run_report_job(
    db: &DatabaseConnection,
    kind: ReportKind,
    now: NaiveDateTime,
    currency: &str,
) -> JobOutcome {
    let monthly_budget = match budget::get_monthly_budget(db).await {
        Ok(Some(amount)) => amount,
        Ok(None) => {
            warn!("No monthly budget set, skipping {kind} report");
            return JobOutcome::Skipped;
        }
        Err(e) => {
            error!("Failed to read monthly budget for {kind} report: {e}");
            return JobOutcome::Failed(e.to_string());
        }
    };

    match report::generate_report(db, kind, monthly_budget, now, currency).await {
        Ok(stored) => {
            info!("Job \"{kind} report\" finished successfully");
            JobOutcome::Generated(stored)
        }
        Err(e) => {
            error!("Job \"{kind} report\" failed: {e}");
            JobOutcome::Failed(e.to_string())
        }
    }
}
