//! Report commands.

use crate::{
    cli::CliContext,
    core::{
        budget,
        report::{self, ReportKind},
        schedule,
        scheduler::ReportScheduler,
    },
    errors::Result,
};
use chrono::NaiveDateTime;
use tracing::info;

/// Generates and stores a report right away, then prints it.
pub async fn generate(ctx: &CliContext, kind: ReportKind, now: NaiveDateTime) -> Result<String> {
    let monthly_budget = budget::require_monthly_budget(&ctx.database).await?;
    let stored =
        report::generate_report(&ctx.database, kind, monthly_budget, now, ctx.currency()).await?;
    Ok(stored.body)
}

/// Lists stored reports, optionally of one kind only.
pub async fn list(ctx: &CliContext, kind: Option<ReportKind>) -> Result<String> {
    let reports = match kind {
        Some(kind) => report::get_reports_by_kind(&ctx.database, kind).await?,
        None => report::get_all_reports(&ctx.database).await?,
    };
    Ok(report::format_report_index(&reports, ctx.currency()))
}

/// Shows when each report runs next.
#[must_use]
pub fn schedule(now: NaiveDateTime) -> String {
    schedule::format_schedule(now)
}

/// Runs every report job on its schedule until Ctrl-C.
pub async fn run_scheduler(ctx: &CliContext) -> Result<String> {
    let mut scheduler = ReportScheduler::new(ctx.database.clone(), ctx.currency());
    scheduler.schedule_all();
    info!("Report scheduler running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    scheduler.cancel_all();
    Ok("Scheduler stopped".to_string())
}
