//! Monthly budget business logic.
//!
//! The active monthly budget lives in the preference table. Setting it re-allocates
//! every category in the same database transaction so allocations never disagree with
//! the stored budget.

use crate::{
    core::{category, expense, preferences, user},
    entities::category as category_entity,
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDateTime};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::fmt::Write;
use tracing::{info, instrument};

/// Parses a user-entered amount.
///
/// Rejects empty input, anything that is not a number, and amounts that are not
/// strictly positive and finite.
pub fn parse_amount(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Enter an amount"));
    }

    let amount: f64 = trimmed
        .parse()
        .map_err(|_| Error::validation(format!("Invalid number: {trimmed}")))?;

    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    Ok(amount)
}

/// Stores a new monthly budget and re-allocates all categories.
///
/// Returns the categories with their new allocations.
#[instrument(skip(db))]
pub async fn set_monthly_budget(
    db: &DatabaseConnection,
    amount: f64,
) -> Result<Vec<category_entity::Model>> {
    let txn = db.begin().await?;
    let categories = store_monthly_budget(&txn, amount).await?;
    txn.commit().await?;

    info!("Monthly budget set to {amount}");
    Ok(categories)
}

/// Changes the monthly budget, charging the change to `account_id` when given.
///
/// The account lock, the new allocations and the category spending of the month
/// containing `now` are written in one database transaction. If any step fails
/// nothing is changed, so a failed attempt never locks the account.
///
/// # Errors
/// * [`Error::BudgetLocked`] - The account changed its budget less than 30 days ago
/// * [`Error::UserNotFound`] - `account_id` does not match an active account
#[instrument(skip(db))]
pub async fn change_monthly_budget(
    db: &DatabaseConnection,
    amount: f64,
    account_id: Option<i64>,
    now: NaiveDateTime,
) -> Result<Vec<category_entity::Model>> {
    let txn = db.begin().await?;

    if let Some(user_id) = account_id {
        user::record_budget_change(&txn, user_id, amount, now).await?;
    }
    store_monthly_budget(&txn, amount).await?;
    let date = now.date();
    let categories = category::sync_spent_with_expenses(&txn, date.month(), date.year()).await?;

    txn.commit().await?;

    info!("Monthly budget changed to {amount}");
    Ok(categories)
}

async fn store_monthly_budget<C>(db: &C, amount: f64) -> Result<Vec<category_entity::Model>>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    preferences::set_preference(db, preferences::MONTHLY_BUDGET_KEY, &amount.to_string()).await?;
    category::reallocate_categories(db, amount).await
}

/// Reads the active monthly budget. `None` when it was never set or is not positive.
pub async fn get_monthly_budget(db: &DatabaseConnection) -> Result<Option<f64>> {
    let Some(raw) = preferences::get_preference(db, preferences::MONTHLY_BUDGET_KEY).await?
    else {
        return Ok(None);
    };

    let amount: f64 = raw.parse().map_err(|e| Error::Config {
        message: format!("Stored monthly budget {raw:?} is not a number: {e}"),
    })?;

    Ok((amount > 0.0).then_some(amount))
}

/// Like [`get_monthly_budget`] but fails with [`Error::BudgetNotSet`].
pub async fn require_monthly_budget(db: &DatabaseConnection) -> Result<f64> {
    get_monthly_budget(db).await?.ok_or(Error::BudgetNotSet)
}

/// Snapshot of the month so far.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSituation {
    /// Active monthly budget
    pub monthly_budget: f64,
    /// Spent in the current month
    pub total_spent: f64,
    /// Budget minus spending; negative is a deficit
    pub remaining: f64,
    /// Spending as a percentage of the budget
    pub percent_used: f64,
    /// Expenses logged today
    pub transactions_today: u64,
}

/// Computes the situation of the month containing `now`.
pub async fn budget_situation(
    db: &DatabaseConnection,
    now: NaiveDateTime,
) -> Result<BudgetSituation> {
    let monthly_budget = require_monthly_budget(db).await?;
    let date = now.date();

    let total_spent = expense::total_for_month(db, date.month(), date.year())
        .await?
        .unwrap_or(0.0);
    let transactions_today = expense::count_for_day(db, date).await?;

    Ok(BudgetSituation {
        monthly_budget,
        total_spent,
        remaining: monthly_budget - total_spent,
        percent_used: (total_spent / monthly_budget) * 100.0,
        transactions_today,
    })
}

/// Renders a [`BudgetSituation`] as text.
#[must_use]
pub fn format_situation(situation: &BudgetSituation, currency: &str) -> String {
    let mut text = String::from("OVERALL SITUATION\n========================\n");

    // write! is infallible when writing to String
    let _ = writeln!(
        text,
        "Monthly budget: {:.0} {currency}",
        situation.monthly_budget
    );
    let _ = writeln!(text, "Total spent: {:.0} {currency}", situation.total_spent);
    text.push_str("------------------------\n");

    if situation.remaining < 0.0 {
        let _ = writeln!(
            text,
            "\u{1F6A8} DEFICIT: {:.0} {currency}",
            situation.remaining.abs()
        );
    } else {
        let _ = writeln!(text, "\u{2705} SURPLUS: {:.0} {currency}", situation.remaining);
    }

    let _ = writeln!(text, "Used: {:.1}%", situation.percent_used);
    let _ = write!(text, "Transactions today: {}", situation.transactions_today);
    text
}
