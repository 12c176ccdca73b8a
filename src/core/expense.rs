//! Expense business logic - logging expenses and querying them by period.
//!
//! Every expense is charged to a category by name. Creating or deleting an expense
//! adjusts that category's spent amount inside the same database transaction, so the
//! category totals always match the expense table.
//!
//! Period columns (`day`, `week`, `week_year`, `month`, `year`) are derived from the
//! expense timestamp at insert time and are what every period query filters on.

use crate::{
    core::{
        budget,
        category::{self, CategoryBudget, SpendingAlert},
        monthly,
    },
    entities::{Expense, expense},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use sea_orm::{
    QueryOrder, QuerySelect, Select, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use std::fmt::Write;
use tracing::{debug, info, instrument};

/// Calendar fields stored alongside each expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodFields {
    /// Day of month
    pub day: i32,
    /// ISO week number
    pub week: i32,
    /// ISO week-numbering year
    pub week_year: i32,
    /// Month (1-12)
    pub month: i32,
    /// Calendar year
    pub year: i32,
}

impl PeriodFields {
    /// Derives the period fields of a local timestamp.
    pub fn from_datetime(at: NaiveDateTime) -> Result<Self> {
        let date = at.date();
        let iso = date.iso_week();
        Ok(Self {
            day: i32::try_from(date.day())?,
            week: i32::try_from(iso.week())?,
            week_year: iso.year(),
            month: i32::try_from(date.month())?,
            year: date.year(),
        })
    }
}

/// Logs an expense against a category.
///
/// Validates the input, inserts the expense and adds its amount to the category's
/// spent amount in one database transaction. Fails with [`Error::BudgetNotSet`]
/// until a monthly budget is defined.
///
/// # Returns
/// The stored expense and the alert matching the category usage after the expense.
#[instrument(skip(db, description))]
pub async fn create_expense(
    db: &DatabaseConnection,
    category_name: &str,
    description: &str,
    amount: f64,
    at: NaiveDateTime,
) -> Result<(expense::Model, SpendingAlert)> {
    let category_name = category_name.trim();
    let description = description.trim();

    if category_name.is_empty() {
        return Err(Error::validation("Select a category"));
    }
    if description.is_empty() {
        return Err(Error::validation("Enter a description"));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    budget::require_monthly_budget(db).await?;
    let fields = PeriodFields::from_datetime(at)?;

    let txn = db.begin().await?;

    let target = category::get_category_by_name(&txn, category_name)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: category_name.to_string(),
        })?;

    let model = expense::ActiveModel {
        category: Set(target.name.clone()),
        description: Set(description.to_string()),
        amount: Set(amount),
        spent_at: Set(at),
        day: Set(fields.day),
        week: Set(fields.week),
        week_year: Set(fields.week_year),
        month: Set(fields.month),
        year: Set(fields.year),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let updated = category::add_spending_atomic(&txn, target.id, amount).await?;

    txn.commit().await?;

    let alert = CategoryBudget::from(&updated).spending_alert();
    info!(
        "Expense {} of {amount} logged in {} ({alert:?})",
        model.id, updated.name
    );
    Ok((model, alert))
}

/// Retrieves a single expense by id.
pub async fn get_expense_by_id(
    db: &DatabaseConnection,
    expense_id: i64,
) -> Result<Option<expense::Model>> {
    Expense::find_by_id(expense_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// All expenses, newest first.
pub async fn get_all_expenses(db: &DatabaseConnection) -> Result<Vec<expense::Model>> {
    Expense::find()
        .order_by_desc(expense::Column::SpentAt)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Expenses logged on one calendar day, newest first.
pub async fn get_expenses_for_day(
    db: &DatabaseConnection,
    date: NaiveDate,
) -> Result<Vec<expense::Model>> {
    let (day, month, year) = day_keys(date)?;
    Expense::find()
        .filter(expense::Column::Day.eq(day))
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year))
        .order_by_desc(expense::Column::SpentAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Expenses of one ISO week, newest first.
pub async fn get_expenses_for_week(
    db: &DatabaseConnection,
    week: u32,
    week_year: i32,
) -> Result<Vec<expense::Model>> {
    let week = i32::try_from(week)?;
    Expense::find()
        .filter(expense::Column::Week.eq(week))
        .filter(expense::Column::WeekYear.eq(week_year))
        .order_by_desc(expense::Column::SpentAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Expenses of one calendar month, newest first.
pub async fn get_expenses_for_month(
    db: &DatabaseConnection,
    month: u32,
    year: i32,
) -> Result<Vec<expense::Model>> {
    let month = i32::try_from(month)?;
    Expense::find()
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year))
        .order_by_desc(expense::Column::SpentAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Expenses of one calendar year, newest first.
pub async fn get_expenses_for_year(
    db: &DatabaseConnection,
    year: i32,
) -> Result<Vec<expense::Model>> {
    Expense::find()
        .filter(expense::Column::Year.eq(year))
        .order_by_desc(expense::Column::SpentAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every expense of a category, newest first.
pub async fn get_expenses_for_category(
    db: &DatabaseConnection,
    category_name: &str,
) -> Result<Vec<expense::Model>> {
    Expense::find()
        .filter(expense::Column::Category.eq(category_name))
        .order_by_desc(expense::Column::SpentAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Expenses of a category within one month, newest first.
pub async fn get_expenses_for_category_month(
    db: &DatabaseConnection,
    category_name: &str,
    month: u32,
    year: i32,
) -> Result<Vec<expense::Model>> {
    let month = i32::try_from(month)?;
    Expense::find()
        .filter(expense::Column::Category.eq(category_name))
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year))
        .order_by_desc(expense::Column::SpentAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of the amounts matched by `query`. `None` when nothing matches.
async fn sum_amount(db: &DatabaseConnection, query: Select<Expense>) -> Result<Option<f64>> {
    let total: Option<Option<f64>> = query
        .select_only()
        .column_as(Expr::col(expense::Column::Amount).sum(), "total")
        .into_tuple()
        .one(db)
        .await?;
    Ok(total.flatten())
}

/// Total spent on one day.
pub async fn total_for_day(db: &DatabaseConnection, date: NaiveDate) -> Result<Option<f64>> {
    let (day, month, year) = day_keys(date)?;
    let query = Expense::find()
        .filter(expense::Column::Day.eq(day))
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year));
    sum_amount(db, query).await
}

/// Total spent in one ISO week.
pub async fn total_for_week(
    db: &DatabaseConnection,
    week: u32,
    week_year: i32,
) -> Result<Option<f64>> {
    let week = i32::try_from(week)?;
    let query = Expense::find()
        .filter(expense::Column::Week.eq(week))
        .filter(expense::Column::WeekYear.eq(week_year));
    sum_amount(db, query).await
}

/// Total spent in one calendar month.
pub async fn total_for_month(
    db: &DatabaseConnection,
    month: u32,
    year: i32,
) -> Result<Option<f64>> {
    let month = i32::try_from(month)?;
    let query = Expense::find()
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year));
    sum_amount(db, query).await
}

/// Total spent on a category within one month.
pub async fn total_for_category_month(
    db: &DatabaseConnection,
    category_name: &str,
    month: u32,
    year: i32,
) -> Result<Option<f64>> {
    let month = i32::try_from(month)?;
    let query = Expense::find()
        .filter(expense::Column::Category.eq(category_name))
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year));
    sum_amount(db, query).await
}

/// Number of expenses logged on one day.
pub async fn count_for_day(db: &DatabaseConnection, date: NaiveDate) -> Result<u64> {
    let (day, month, year) = day_keys(date)?;
    Expense::find()
        .filter(expense::Column::Day.eq(day))
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Number of expenses ever logged.
pub async fn count_all(db: &DatabaseConnection) -> Result<u64> {
    Expense::find().count(db).await.map_err(Into::into)
}

/// Deletes an expense and takes its amount back off the category.
///
/// Only expenses from the month of the last monthly reset onwards still count in the
/// category's spent amount, so older ones are removed without touching the category.
/// When the category no longer exists only the expense is removed.
#[instrument(skip(db))]
pub async fn delete_expense(db: &DatabaseConnection, expense_id: i64) -> Result<expense::Model> {
    let txn = db.begin().await?;

    let existing = Expense::find_by_id(expense_id)
        .one(&txn)
        .await?
        .ok_or(Error::ExpenseNotFound { id: expense_id })?;

    Expense::delete_by_id(expense_id).exec(&txn).await?;

    let counted_from = match monthly::get_last_monthly_reset_date(&txn).await? {
        Some(reset) => Some((reset.year(), i32::try_from(reset.month())?)),
        None => None,
    };
    let still_counted = counted_from.is_none_or(|start| (existing.year, existing.month) >= start);

    if still_counted {
        if let Some(cat) = category::get_category_by_name(&txn, &existing.category).await? {
            category::add_spending_atomic(&txn, cat.id, -existing.amount).await?;
        }
    } else {
        debug!("Expense {expense_id} predates the last monthly reset, category left as is");
    }

    txn.commit().await?;
    info!("Deleted expense {expense_id}");
    Ok(existing)
}

/// Deletes every expense. Category spent amounts are left untouched.
pub async fn delete_all_expenses(db: &DatabaseConnection) -> Result<u64> {
    let result = Expense::delete_many().exec(db).await?;
    info!("Deleted {} expenses", result.rows_affected);
    Ok(result.rows_affected)
}

/// Deletes the expenses of one month. Category spent amounts are left untouched.
pub async fn delete_expenses_for_month(
    db: &DatabaseConnection,
    month: u32,
    year: i32,
) -> Result<u64> {
    let month = i32::try_from(month)?;
    let result = Expense::delete_many()
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Formats an expense history listing followed by the total and count.
#[must_use]
pub fn format_history(expenses: &[expense::Model], currency: &str) -> String {
    if expenses.is_empty() {
        return "No expenses this month".to_string();
    }

    let mut text = String::from("EXPENSE HISTORY\n========================\n");
    for e in expenses {
        // write! is infallible when writing to String
        let _ = writeln!(
            text,
            "#{} {} | {} | {:.0} {currency} | {}",
            e.id,
            e.spent_at.format("%d/%m/%Y %H:%M"),
            e.category,
            e.amount,
            e.description
        );
    }

    let total: f64 = expenses.iter().map(|e| e.amount).sum();
    let _ = writeln!(text, "------------------------");
    let _ = writeln!(text, "Total: {total:.0} {currency}");
    let _ = write!(text, "{} expense(s)", expenses.len());
    text
}

fn day_keys(date: NaiveDate) -> Result<(i32, i32, i32)> {
    Ok((
        i32::try_from(date.day())?,
        i32::try_from(date.month())?,
        date.year(),
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_period_fields_iso_week_across_year() {
        // 2026-01-01 is a Thursday, ISO week 1 of 2026
        let fields = PeriodFields::from_datetime(test_datetime(2026, 1, 1, 8, 0)).unwrap();
        assert_eq!(fields.week, 1);
        assert_eq!(fields.week_year, 2026);

        // 2027-01-01 is a Friday and still belongs to ISO week 53 of 2026
        let fields = PeriodFields::from_datetime(test_datetime(2027, 1, 1, 8, 0)).unwrap();
        assert_eq!(fields.week, 53);
        assert_eq!(fields.week_year, 2026);
        assert_eq!(fields.year, 2027);
        assert_eq!(fields.month, 1);
        assert_eq!(fields.day, 1);
    }

    #[tokio::test]
    async fn test_create_expense_updates_category() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let at = test_datetime(2026, 4, 14, 12, 30);

        let (expense, alert) =
            create_expense(&db, "Nutrition", "  Groceries ", 6_000.0, at).await?;
        assert_eq!(expense.category, "Nutrition");
        assert_eq!(expense.description, "Groceries");
        assert_eq!(expense.day, 14);
        assert_eq!(expense.month, 4);
        assert_eq!(expense.year, 2026);
        assert_eq!(alert, SpendingAlert::Recorded);

        let nutrition = category::get_category_by_name(&db, "Nutrition").await?.unwrap();
        assert_eq!(nutrition.spent_amount, 6_000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_expense_alerts() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let at = test_datetime(2026, 4, 14, 12, 30);

        // Sport is allocated 5000
        let (_, alert) = create_expense(&db, "Sport", "Gym", 3_600.0, at).await?;
        assert_eq!(alert, SpendingAlert::Threshold { percent_used: 72.0 });

        let (_, alert) = create_expense(&db, "Sport", "Shoes", 2_400.0, at).await?;
        assert_eq!(
            alert,
            SpendingAlert::Overspent {
                percent_used: 120.0
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_expense_requires_budget() -> Result<()> {
        let db = setup_test_db().await?;
        category::seed_categories(&db, &category::default_categories(), None).await?;
        let at = test_datetime(2026, 4, 14, 12, 30);

        assert!(matches!(
            create_expense(&db, "Rent", "April rent", 20_000.0, at).await,
            Err(Error::BudgetNotSet)
        ));
        assert_eq!(count_all(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_expense_validation() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let at = test_datetime(2026, 4, 14, 12, 30);

        assert!(matches!(
            create_expense(&db, "Rent", "x", 0.0, at).await,
            Err(Error::InvalidAmount { amount: 0.0 })
        ));
        assert!(matches!(
            create_expense(&db, "Rent", "x", -5.0, at).await,
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            create_expense(&db, "Rent", "x", f64::INFINITY, at).await,
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            create_expense(&db, " ", "x", 10.0, at).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            create_expense(&db, "Rent", "", 10.0, at).await,
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            create_expense(&db, "Yachts", "x", 10.0, at).await,
            Err(Error::CategoryNotFound { .. })
        ));

        assert_eq!(count_all(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_period_queries() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;

        create_test_expense(&db, "Rent", 1_000.0, test_datetime(2026, 6, 1, 9, 0)).await?;
        create_test_expense(&db, "Rent", 2_000.0, test_datetime(2026, 6, 1, 18, 0)).await?;
        create_test_expense(&db, "Health", 500.0, test_datetime(2026, 6, 3, 9, 0)).await?;
        create_test_expense(&db, "Health", 700.0, test_datetime(2026, 5, 30, 9, 0)).await?;
        create_test_expense(&db, "Family", 300.0, test_datetime(2025, 6, 1, 9, 0)).await?;

        let day = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let today = get_expenses_for_day(&db, day).await?;
        assert_eq!(today.len(), 2);
        assert_eq!(today[0].amount, 2_000.0, "newest first");
        assert_eq!(total_for_day(&db, day).await?, Some(3_000.0));
        assert_eq!(count_for_day(&db, day).await?, 2);

        // 2026-06-01 is a Monday, so 30/05 falls in the previous ISO week
        assert_eq!(get_expenses_for_week(&db, 23, 2026).await?.len(), 3);
        assert_eq!(total_for_week(&db, 23, 2026).await?, Some(3_500.0));

        assert_eq!(get_expenses_for_month(&db, 6, 2026).await?.len(), 3);
        assert_eq!(total_for_month(&db, 6, 2026).await?, Some(3_500.0));
        assert_eq!(get_expenses_for_year(&db, 2026).await?.len(), 4);

        assert_eq!(get_expenses_for_category(&db, "Health").await?.len(), 2);
        assert_eq!(
            get_expenses_for_category_month(&db, "Health", 6, 2026).await?.len(),
            1
        );
        assert_eq!(
            total_for_category_month(&db, "Health", 5, 2026).await?,
            Some(700.0)
        );

        assert_eq!(get_all_expenses(&db).await?.len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_totals_none_when_empty() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let day = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();

        assert_eq!(total_for_day(&db, day).await?, None);
        assert_eq!(total_for_week(&db, 23, 2026).await?, None);
        assert_eq!(total_for_month(&db, 6, 2026).await?, None);
        assert_eq!(total_for_category_month(&db, "Rent", 6, 2026).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_expense_reverses_spending() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let at = test_datetime(2026, 6, 1, 9, 0);

        let first = create_test_expense(&db, "Rent", 1_000.0, at).await?;
        create_test_expense(&db, "Rent", 2_500.0, at).await?;

        let deleted = delete_expense(&db, first.id).await?;
        assert_eq!(deleted.amount, 1_000.0);
        assert!(get_expense_by_id(&db, first.id).await?.is_none());

        let rent = category::get_category_by_name(&db, "Rent").await?.unwrap();
        assert_eq!(rent.spent_amount, 2_500.0);

        assert!(matches!(
            delete_expense(&db, first.id).await,
            Err(Error::ExpenseNotFound { id }) if id == first.id
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_expense_from_before_monthly_reset() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let may_20 = test_datetime(2026, 5, 20, 9, 0);
        let may = create_test_expense(&db, "Rent", 5_000.0, may_20).await?;

        let june_first = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(monthly::process_monthly_reset(&db, june_first).await?.is_some());
        let june_3 = test_datetime(2026, 6, 3, 9, 0);
        let june = create_test_expense(&db, "Rent", 1_000.0, june_3).await?;

        delete_expense(&db, may.id).await?;
        let rent = category::get_category_by_name(&db, "Rent").await?.unwrap();
        assert_eq!(rent.spent_amount, 1_000.0);

        delete_expense(&db, june.id).await?;
        let rent = category::get_category_by_name(&db, "Rent").await?.unwrap();
        assert_eq!(rent.spent_amount, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_bulk_deletes() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        create_test_expense(&db, "Rent", 1_000.0, test_datetime(2026, 6, 1, 9, 0)).await?;
        create_test_expense(&db, "Rent", 1_000.0, test_datetime(2026, 6, 2, 9, 0)).await?;
        create_test_expense(&db, "Rent", 1_000.0, test_datetime(2026, 7, 1, 9, 0)).await?;

        assert_eq!(delete_expenses_for_month(&db, 6, 2026).await?, 2);
        assert_eq!(count_all(&db).await?, 1);

        assert_eq!(delete_all_expenses(&db).await?, 1);
        assert_eq!(count_all(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_format_history() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        assert_eq!(format_history(&[], "FCFA"), "No expenses this month");

        create_test_expense(&db, "Rent", 1_500.0, test_datetime(2026, 6, 1, 9, 5)).await?;
        create_test_expense(&db, "Health", 500.0, test_datetime(2026, 6, 2, 10, 0)).await?;

        let expenses = get_expenses_for_month(&db, 6, 2026).await?;
        let text = format_history(&expenses, "FCFA");
        assert!(text.contains("01/06/2026 09:05 | Rent | 1500 FCFA | Test expense"));
        assert!(text.contains("Total: 2000 FCFA"));
        assert!(text.ends_with("2 expense(s)"));
        Ok(())
    }
}
