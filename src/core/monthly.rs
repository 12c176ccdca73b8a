//! Monthly reset business logic
//!
//! At the start of each month every active category's spent amount goes back to zero.
//! The date of the last reset is kept in the preference table so the reset happens at
//! most once per calendar month, no matter how often it is requested.

use crate::{
    core::{category, preferences},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::fmt::Write;
use tracing::info;

/// Spending of one category right before the reset.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryResetResult {
    /// Name of the category
    pub category_name: String,
    /// Amount allocated for the month that ended
    pub allocated_amount: f64,
    /// Amount spent before the reset
    pub spent_before: f64,
}

/// Summary of one monthly reset.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyResetResult {
    /// Per-category spending before the reset
    pub categories: Vec<CategoryResetResult>,
    /// Total spent across all categories before the reset
    pub total_spent_before: f64,
    /// Categories that ended the month over their allocation
    pub over_budget_count: usize,
    /// Date the reset was performed on
    pub reset_date: NaiveDate,
}

/// True when no reset was recorded yet or the last one happened in an earlier month.
///
/// # Arguments
/// * `db` - Database connection
/// * `today` - Current local date
pub async fn is_monthly_reset_needed(db: &DatabaseConnection, today: NaiveDate) -> Result<bool> {
    let last_reset = get_last_monthly_reset_date(db).await?;

    Ok(last_reset.is_none_or(|last| {
        (last.year(), last.month()) < (today.year(), today.month())
    }))
}

/// Date of the last monthly reset, stored as `YYYY-MM-DD`.
pub async fn get_last_monthly_reset_date<C>(db: &C) -> Result<Option<NaiveDate>>
where
    C: ConnectionTrait,
{
    let Some(raw) = preferences::get_preference(db, preferences::LAST_MONTHLY_RESET_KEY).await?
    else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse last reset date: {e}"),
        })
}

/// Resets the spent amount of every active category if a new month started.
///
/// The reset and the new reset date are written in one database transaction.
///
/// # Returns
/// * `Ok(Some(result))` - The reset was performed
/// * `Ok(None)` - Already reset this month
pub async fn process_monthly_reset(
    db: &DatabaseConnection,
    today: NaiveDate,
) -> Result<Option<MonthlyResetResult>> {
    if !is_monthly_reset_needed(db, today).await? {
        return Ok(None);
    }

    let txn = db.begin().await?;

    let before = category::get_all_active_categories(&txn).await?;
    category::reset_all_spent(&txn).await?;
    preferences::set_preference(
        &txn,
        preferences::LAST_MONTHLY_RESET_KEY,
        &today.format("%Y-%m-%d").to_string(),
    )
    .await?;

    txn.commit().await?;

    let categories: Vec<CategoryResetResult> = before
        .into_iter()
        .map(|c| CategoryResetResult {
            category_name: c.name,
            allocated_amount: c.allocated_amount,
            spent_before: c.spent_amount,
        })
        .collect();

    let total_spent_before = categories.iter().map(|c| c.spent_before).sum();
    let over_budget_count = categories
        .iter()
        .filter(|c| c.spent_before > c.allocated_amount)
        .count();

    info!(
        "Monthly reset for {}: {} categories cleared",
        today.format("%Y-%m"),
        categories.len()
    );

    Ok(Some(MonthlyResetResult {
        categories,
        total_spent_before,
        over_budget_count,
        reset_date: today,
    }))
}

/// Formats a reset result for display.
#[must_use]
pub fn format_monthly_reset_summary(result: &MonthlyResetResult, currency: &str) -> String {
    let mut summary = format!(
        "Monthly Reset - {} - {} categories\n",
        result.reset_date.format("%B %Y"),
        result.categories.len()
    );

    // write! is infallible when writing to String
    let _ = write!(
        summary,
        "  Spent last month: {:.0} {currency} | Over budget: {}\n\n",
        result.total_spent_before, result.over_budget_count
    );

    for c in &result.categories {
        let _ = writeln!(
            summary,
            "  {} | {:.0} of {:.0} {currency} -> 0",
            c.category_name, c.spent_before, c.allocated_amount
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn test_reset_needed_without_previous_reset() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(is_monthly_reset_needed(&db, date(2026, 5, 1)).await?);
        assert!(get_last_monthly_reset_date(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_process_monthly_reset() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        create_test_expense(&db, "Rent", 25_000.0, test_datetime(2026, 4, 3, 9, 0)).await?;
        create_test_expense(&db, "Health", 1_000.0, test_datetime(2026, 4, 20, 9, 0)).await?;

        let result = process_monthly_reset(&db, date(2026, 5, 1)).await?.unwrap();
        assert_eq!(result.categories.len(), 10);
        assert_eq!(result.total_spent_before, 26_000.0);
        assert_eq!(result.over_budget_count, 1);

        let rent = result
            .categories
            .iter()
            .find(|c| c.category_name == "Rent")
            .unwrap();
        assert_eq!(rent.spent_before, 25_000.0);
        assert_eq!(rent.allocated_amount, 20_000.0);

        let categories = category::get_all_active_categories(&db).await?;
        assert!(categories.iter().all(|c| c.spent_amount == 0.0));
        assert_eq!(get_last_monthly_reset_date(&db).await?, Some(date(2026, 5, 1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_once_per_month() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;

        assert!(process_monthly_reset(&db, date(2026, 5, 1)).await?.is_some());

        create_test_expense(&db, "Rent", 3_000.0, test_datetime(2026, 5, 2, 9, 0)).await?;
        assert!(process_monthly_reset(&db, date(2026, 5, 31)).await?.is_none());

        let rent = category::get_category_by_name(&db, "Rent").await?.unwrap();
        assert_eq!(rent.spent_amount, 3_000.0);

        // New year, new month
        assert!(is_monthly_reset_needed(&db, date(2027, 1, 1)).await?);
        // A date earlier than the last reset never triggers one
        assert!(!is_monthly_reset_needed(&db, date(2026, 4, 30)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_reset_date() -> Result<()> {
        let db = setup_test_db().await?;
        preferences::set_preference(&db, preferences::LAST_MONTHLY_RESET_KEY, "May 2026").await?;

        let result = get_last_monthly_reset_date(&db).await;
        assert!(matches!(result, Err(Error::Config { .. })));
        Ok(())
    }

    #[test]
    fn test_format_monthly_reset_summary() {
        let result = MonthlyResetResult {
            categories: vec![CategoryResetResult {
                category_name: "Rent".to_string(),
                allocated_amount: 20_000.0,
                spent_before: 18_500.0,
            }],
            total_spent_before: 18_500.0,
            over_budget_count: 0,
            reset_date: date(2026, 5, 1),
        };

        let summary = format_monthly_reset_summary(&result, "FCFA");
        assert!(summary.starts_with("Monthly Reset - May 2026 - 1 categories\n"));
        assert!(summary.contains("Spent last month: 18500 FCFA | Over budget: 0"));
        assert!(summary.contains("  Rent | 18500 of 20000 FCFA -> 0"));
    }
}
