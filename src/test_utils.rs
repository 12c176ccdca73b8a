//! Shared test utilities for the budget tracker.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{budget, category, expense},
    entities,
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sets up a database with the default categories and an active monthly budget.
pub async fn setup_with_categories(monthly_budget: f64) -> Result<DatabaseConnection> {
    let db = setup_test_db().await?;
    category::seed_categories(&db, &category::default_categories(), None).await?;
    budget::set_monthly_budget(&db, monthly_budget).await?;
    Ok(db)
}

/// Builds a local wall-clock datetime for tests.
///
/// # Panics
/// Panics on an invalid date or time, which is a bug in the test itself.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn test_datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Creates a test expense with a default description.
///
/// # Defaults
/// * `description`: `"Test expense"`
pub async fn create_test_expense(
    db: &DatabaseConnection,
    category: &str,
    amount: f64,
    at: NaiveDateTime,
) -> Result<entities::expense::Model> {
    let (expense, _alert) =
        expense::create_expense(db, category, "Test expense", amount, at).await?;
    Ok(expense)
}
