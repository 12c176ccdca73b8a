//! Budget and category commands.

use crate::{
    cli::CliContext,
    core::{budget, category, monthly, user},
    errors::Result,
};
use chrono::NaiveDateTime;
use tracing::info;

/// Defines the monthly budget and re-allocates every category.
///
/// When someone is logged in the 30-day lock of their account applies. Spending
/// already logged this month is counted against the new allocations.
pub async fn set_budget(ctx: &CliContext, raw_amount: &str, now: NaiveDateTime) -> Result<String> {
    let amount = budget::parse_amount(raw_amount)?;

    let account = user::active_user(&ctx.database).await?;
    if account.is_none() {
        info!("No user logged in, budget change is not tracked on an account");
    }

    let categories =
        budget::change_monthly_budget(&ctx.database, amount, account.map(|a| a.id), now).await?;

    Ok(format!(
        "\u{2705} Monthly budget set to {amount:.0} {}\n\n{}",
        ctx.currency(),
        category::format_category_overview(&categories, ctx.currency())
    ))
}

/// Shows the overall situation of the current month.
pub async fn situation(ctx: &CliContext, now: NaiveDateTime) -> Result<String> {
    let situation = budget::budget_situation(&ctx.database, now).await?;
    Ok(budget::format_situation(&situation, ctx.currency()))
}

/// Lists every active category.
pub async fn categories(ctx: &CliContext) -> Result<String> {
    let categories = category::get_all_active_categories(&ctx.database).await?;
    if categories.is_empty() {
        return Ok("No categories configured".to_string());
    }
    Ok(category::format_category_overview(&categories, ctx.currency()))
}

/// Resets category spending when a new month started.
pub async fn monthly_reset(ctx: &CliContext, now: NaiveDateTime) -> Result<String> {
    match monthly::process_monthly_reset(&ctx.database, now.date()).await? {
        Some(result) => Ok(monthly::format_monthly_reset_summary(&result, ctx.currency())),
        None => Ok("Categories were already reset this month".to_string()),
    }
}
