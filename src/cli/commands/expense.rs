//! Expense commands.

use crate::{
    cli::CliContext,
    core::{budget, expense},
    errors::Result,
};
use chrono::{Datelike, NaiveDateTime};

/// Logs an expense and reports the category alert.
pub async fn add_expense(
    ctx: &CliContext,
    category_name: &str,
    raw_amount: &str,
    description: &str,
    now: NaiveDateTime,
) -> Result<String> {
    let amount = budget::parse_amount(raw_amount)?;
    let (created, alert) =
        expense::create_expense(&ctx.database, category_name, description, amount, now).await?;

    Ok(format!(
        "{}\n#{} {} | {}",
        alert.message(&created.category, amount, ctx.currency()),
        created.id,
        created.category,
        created.description
    ))
}

/// Lists the expenses of the current month.
pub async fn history(ctx: &CliContext, now: NaiveDateTime) -> Result<String> {
    let date = now.date();
    let expenses =
        expense::get_expenses_for_month(&ctx.database, date.month(), date.year()).await?;
    Ok(expense::format_history(&expenses, ctx.currency()))
}

/// Deletes one expense and gives its amount back to the category.
pub async fn delete_expense(ctx: &CliContext, expense_id: i64) -> Result<String> {
    let deleted = expense::delete_expense(&ctx.database, expense_id).await?;
    Ok(format!(
        "\u{1F5D1} Deleted expense #{}: {:.0} {} from {}",
        deleted.id,
        deleted.amount,
        ctx.currency(),
        deleted.category
    ))
}
