//! Category business logic - allocation math and category table operations.
//!
//! [`CategoryBudget`] is the pure in-memory model: it knows how much of the monthly
//! budget a category receives and how much of it has been used. The async functions
//! below keep the `categories` table in step with it.

use crate::{
    entities::{Category, Expense, category, expense},
    errors::{Error, Result},
};
use chrono::Local;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

/// Usage percentage from which a category is flagged as a warning
pub const WARNING_THRESHOLD: f64 = 50.0;
/// Usage percentage from which an expense triggers an alert
pub const ALERT_THRESHOLD: f64 = 70.0;
/// Usage percentage at which the allocation is used up
pub const EXCEEDED_THRESHOLD: f64 = 100.0;

/// Allowed gap between the sum of category percentages and 100
pub const PERCENT_TOLERANCE: f64 = 0.01;

/// A named budget bucket with a fixed share of the monthly budget.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBudget {
    /// Display name
    pub name: String,
    /// Share of the monthly budget, in percent
    pub allocated_percent: f64,
    /// Amount allocated from the monthly budget
    pub allocated_amount: f64,
    /// Amount spent so far this month
    pub spent: f64,
}

/// How much of its allocation a category has consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    /// Below 50%
    Comfortable,
    /// 50% up to 70%
    Warning,
    /// 70% up to 100%
    Critical,
    /// 100% or more
    Exceeded,
}

impl UsageLevel {
    /// Classifies a usage percentage.
    #[must_use]
    pub fn from_percent(percent_used: f64) -> Self {
        if percent_used < WARNING_THRESHOLD {
            Self::Comfortable
        } else if percent_used < ALERT_THRESHOLD {
            Self::Warning
        } else if percent_used < EXCEEDED_THRESHOLD {
            Self::Critical
        } else {
            Self::Exceeded
        }
    }

    /// Symbol printed in front of the category summary.
    #[must_use]
    pub const fn indicator(self) -> &'static str {
        match self {
            Self::Comfortable => "\u{2705}",
            Self::Warning => "\u{26A0}",
            Self::Critical => "\u{1F6A8}",
            Self::Exceeded => "\u{274C}",
        }
    }
}

/// Outcome shown to the user right after an expense is logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpendingAlert {
    /// Category is still below the alert threshold
    Recorded,
    /// Category crossed 70% of its allocation
    Threshold {
        /// Usage after the expense
        percent_used: f64,
    },
    /// Category reached or passed its allocation
    Overspent {
        /// Usage after the expense
        percent_used: f64,
    },
}

impl SpendingAlert {
    /// Picks the alert matching a usage percentage.
    #[must_use]
    pub fn from_percent(percent_used: f64) -> Self {
        if percent_used >= EXCEEDED_THRESHOLD {
            Self::Overspent { percent_used }
        } else if percent_used >= ALERT_THRESHOLD {
            Self::Threshold { percent_used }
        } else {
            Self::Recorded
        }
    }

    /// User-facing notification for an expense of `amount` in `category`.
    #[must_use]
    pub fn message(&self, category: &str, amount: f64, currency: &str) -> String {
        match self {
            Self::Recorded => format!("\u{2705} Expense added: {amount:.0} {currency}"),
            Self::Threshold { percent_used } => {
                format!("\u{1F6A8} ALERT: {category} has reached {percent_used:.1}%!")
            }
            Self::Overspent { percent_used } => {
                format!("\u{274C} OVERSPENT: {category} is at {percent_used:.1}%!")
            }
        }
    }
}

impl CategoryBudget {
    /// Creates a category with nothing allocated or spent yet.
    #[must_use]
    pub fn new(name: impl Into<String>, allocated_percent: f64) -> Self {
        Self {
            name: name.into(),
            allocated_percent,
            allocated_amount: 0.0,
            spent: 0.0,
        }
    }

    /// Sets the allocated amount from the total monthly budget.
    pub fn allocate(&mut self, total_budget: f64) {
        self.allocated_amount = allocation_for(total_budget, self.allocated_percent);
    }

    /// Adds an expense to the spent amount.
    pub fn record_spending(&mut self, amount: f64) {
        self.spent += amount;
    }

    /// Spent amount as a percentage of the allocation; 0 when nothing is allocated.
    #[must_use]
    pub fn percent_used(&self) -> f64 {
        if self.allocated_amount == 0.0 {
            return 0.0;
        }
        (self.spent / self.allocated_amount) * 100.0
    }

    /// Allocation minus spending. Negative once overspent.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.allocated_amount - self.spent
    }

    /// True when more was spent than allocated.
    #[must_use]
    pub fn is_over_budget(&self) -> bool {
        self.spent > self.allocated_amount
    }

    /// Current usage level.
    #[must_use]
    pub fn usage_level(&self) -> UsageLevel {
        UsageLevel::from_percent(self.percent_used())
    }

    /// Alert to show after an expense brought the category to its current state.
    #[must_use]
    pub fn spending_alert(&self) -> SpendingAlert {
        SpendingAlert::from_percent(self.percent_used())
    }

    /// Clears the spent amount, as done at the start of each month.
    pub fn reset(&mut self) {
        self.spent = 0.0;
    }

    /// Multi-line summary of the category state.
    #[must_use]
    pub fn summary(&self, currency: &str) -> String {
        format!(
            "{} {} ({:.0}%)\nAllocated: {:.0} {currency} | Used: {:.0} {currency} | \
             Remaining: {:.0} {currency}\nUsage: {:.1}%",
            self.usage_level().indicator(),
            self.name,
            self.allocated_percent,
            self.allocated_amount,
            self.spent,
            self.remaining(),
            self.percent_used()
        )
    }
}

impl From<&category::Model> for CategoryBudget {
    fn from(model: &category::Model) -> Self {
        Self {
            name: model.name.clone(),
            allocated_percent: model.allocated_percent,
            allocated_amount: model.allocated_amount,
            spent: model.spent_amount,
        }
    }
}

/// `total_budget × percent / 100`
#[must_use]
pub fn allocation_for(total_budget: f64, percent: f64) -> f64 {
    total_budget * (percent / 100.0)
}

/// The ten built-in categories. Their percentages add up to 100.
#[must_use]
pub fn default_categories() -> Vec<CategoryBudget> {
    vec![
        CategoryBudget::new("Projects", 15.0),
        CategoryBudget::new("Health", 5.0),
        CategoryBudget::new("Nutrition", 30.0),
        CategoryBudget::new("Rent", 20.0),
        CategoryBudget::new("Internet", 3.0),
        CategoryBudget::new("Leisure", 8.0),
        CategoryBudget::new("Sport", 5.0),
        CategoryBudget::new("Family", 7.0),
        CategoryBudget::new("Other", 2.0),
        CategoryBudget::new("Transport", 5.0),
    ]
}

/// Checks that the category percentages add up to 100 within [`PERCENT_TOLERANCE`].
/// The check is advisory; nothing refuses a configuration that fails it.
#[must_use]
pub fn verify_total(categories: &[CategoryBudget]) -> bool {
    let total: f64 = categories.iter().map(|c| c.allocated_percent).sum();
    (total - 100.0).abs() < PERCENT_TOLERANCE
}

/// Inserts `categories` when the table is still empty.
///
/// Allocated amounts are computed from `monthly_budget` when one is known.
/// Returns the number of categories inserted (0 when the table was already seeded).
pub async fn seed_categories(
    db: &DatabaseConnection,
    categories: &[CategoryBudget],
    monthly_budget: Option<f64>,
) -> Result<usize> {
    let existing = Category::find().count(db).await?;
    if existing > 0 {
        debug!("Categories already seeded ({existing} rows)");
        return Ok(0);
    }

    let now = Local::now().naive_local();
    for cat in categories {
        let allocated_amount =
            monthly_budget.map_or(0.0, |b| allocation_for(b, cat.allocated_percent));
        category::ActiveModel {
            name: Set(cat.name.trim().to_string()),
            allocated_percent: Set(cat.allocated_percent),
            allocated_amount: Set(allocated_amount),
            spent_amount: Set(0.0),
            created_at: Set(now),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    info!("Seeded {} categories", categories.len());
    Ok(categories.len())
}

/// Retrieves all active categories in creation order.
pub async fn get_all_active_categories<C>(db: &C) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active category by its exact name.
pub async fn get_category_by_name<C>(db: &C, name: &str) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::Name.eq(name))
        .filter(category::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Recomputes every active category's allocated amount for a new monthly budget.
pub async fn reallocate_categories<C>(db: &C, monthly_budget: f64) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    let categories = get_all_active_categories(db).await?;
    let mut updated = Vec::with_capacity(categories.len());

    for cat in categories {
        let allocated = allocation_for(monthly_budget, cat.allocated_percent);
        let mut active_model: category::ActiveModel = cat.into();
        active_model.allocated_amount = Set(allocated);
        updated.push(active_model.update(db).await?);
    }

    debug!("Reallocated {} categories for budget {monthly_budget}", updated.len());
    Ok(updated)
}

/// Adds `amount_delta` to a category's spent amount with a single UPDATE.
///
/// Uses `spent_amount = spent_amount + delta` so concurrent writers cannot lose an update.
/// Pass a negative delta to reverse a deleted expense. The result never goes below zero.
pub async fn add_spending_atomic<C>(
    db: &C,
    category_id: i64,
    amount_delta: f64,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let new_spent = Expr::col(category::Column::SpentAmount).add(amount_delta);
    Category::update_many()
        .col_expr(
            category::Column::SpentAmount,
            Expr::case(Expr::expr(new_spent.clone()).gte(0.0), new_spent).finally(0.0).into(),
        )
        .filter(category::Column::Id.eq(category_id))
        .exec(db)
        .await?;

    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: category_id.to_string(),
        })
}

/// Sets every active category's spent amount back to zero.
///
/// Returns the number of categories reset.
pub async fn reset_all_spent<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let result = Category::update_many()
        .col_expr(category::Column::SpentAmount, Expr::value(0.0))
        .filter(category::Column::IsActive.eq(true))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Rebuilds each active category's spent amount from the expenses of one month.
///
/// Used after the budget is (re)defined so the categories reflect what was already
/// logged this month.
pub async fn sync_spent_with_expenses<C>(
    db: &C,
    month: u32,
    year: i32,
) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    let month = i32::try_from(month)?;
    let expenses = Expense::find()
        .filter(expense::Column::Month.eq(month))
        .filter(expense::Column::Year.eq(year))
        .all(db)
        .await?;

    let categories = get_all_active_categories(db).await?;
    let mut updated = Vec::with_capacity(categories.len());

    for cat in categories {
        let total: f64 = expenses
            .iter()
            .filter(|e| e.category == cat.name)
            .map(|e| e.amount)
            .sum();

        let mut active_model: category::ActiveModel = cat.into();
        active_model.spent_amount = Set(total);
        updated.push(active_model.update(db).await?);
    }

    Ok(updated)
}

/// Formats every category summary, one block per category.
#[must_use]
pub fn format_category_overview(categories: &[category::Model], currency: &str) -> String {
    categories
        .iter()
        .map(|c| CategoryBudget::from(c).summary(currency))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_allocation_sums_to_budget() {
        let budget = 123_457.0;
        let mut categories = default_categories();
        for c in &mut categories {
            c.allocate(budget);
        }
        let total: f64 = categories.iter().map(|c| c.allocated_amount).sum();
        assert!((total - budget).abs() < 0.01);
    }

    #[test]
    fn test_default_categories_total_100() {
        let categories = default_categories();
        assert_eq!(categories.len(), 10);
        assert!(verify_total(&categories));
    }

    #[test]
    fn test_verify_total_detects_gap() {
        let categories = vec![CategoryBudget::new("A", 60.0), CategoryBudget::new("B", 39.0)];
        assert!(!verify_total(&categories));
    }

    #[test]
    fn test_percent_used_zero_allocation() {
        let mut cat = CategoryBudget::new("Nothing", 0.0);
        cat.allocate(100_000.0);
        cat.record_spending(500.0);
        assert_eq!(cat.allocated_amount, 0.0);
        assert_eq!(cat.percent_used(), 0.0);
    }

    #[test]
    fn test_remaining_is_allocated_minus_spent() {
        let mut cat = CategoryBudget::new("Nutrition", 30.0);
        cat.allocate(100_000.0);
        cat.record_spending(12_000.0);
        cat.record_spending(3_000.0);
        assert_eq!(cat.allocated_amount, 30_000.0);
        assert_eq!(cat.spent, 15_000.0);
        assert_eq!(cat.remaining(), 15_000.0);
        assert_eq!(cat.percent_used(), 50.0);
        assert!(!cat.is_over_budget());

        cat.reset();
        assert_eq!(cat.spent, 0.0);
    }

    #[test]
    fn test_usage_levels() {
        assert_eq!(UsageLevel::from_percent(0.0), UsageLevel::Comfortable);
        assert_eq!(UsageLevel::from_percent(49.9), UsageLevel::Comfortable);
        assert_eq!(UsageLevel::from_percent(50.0), UsageLevel::Warning);
        assert_eq!(UsageLevel::from_percent(69.9), UsageLevel::Warning);
        assert_eq!(UsageLevel::from_percent(70.0), UsageLevel::Critical);
        assert_eq!(UsageLevel::from_percent(99.9), UsageLevel::Critical);
        assert_eq!(UsageLevel::from_percent(100.0), UsageLevel::Exceeded);
    }

    #[test]
    fn test_spending_alerts() {
        assert_eq!(SpendingAlert::from_percent(69.0), SpendingAlert::Recorded);
        assert_eq!(
            SpendingAlert::from_percent(70.0),
            SpendingAlert::Threshold { percent_used: 70.0 }
        );
        assert_eq!(
            SpendingAlert::from_percent(120.0),
            SpendingAlert::Overspent {
                percent_used: 120.0
            }
        );
        assert_eq!(
            SpendingAlert::from_percent(85.0).message("Rent", 1000.0, "FCFA"),
            "\u{1F6A8} ALERT: Rent has reached 85.0%!"
        );
    }

    #[test]
    fn test_over_budget() {
        let mut cat = CategoryBudget::new("Sport", 5.0);
        cat.allocate(10_000.0);
        cat.record_spending(600.0);
        assert!(cat.is_over_budget());
        assert_eq!(cat.remaining(), -100.0);
        assert_eq!(cat.usage_level(), UsageLevel::Exceeded);
    }

    #[test]
    fn test_summary_format() {
        let mut cat = CategoryBudget::new("Rent", 20.0);
        cat.allocate(100_000.0);
        cat.record_spending(5_000.0);
        assert_eq!(
            cat.summary("FCFA"),
            "\u{2705} Rent (20%)\nAllocated: 20000 FCFA | Used: 5000 FCFA | \
             Remaining: 15000 FCFA\nUsage: 25.0%"
        );
    }

    #[tokio::test]
    async fn test_seed_categories_once() -> Result<()> {
        let db = setup_test_db().await?;

        let inserted = seed_categories(&db, &default_categories(), Some(100_000.0)).await?;
        assert_eq!(inserted, 10);

        // Second seed is a no-op
        let inserted = seed_categories(&db, &default_categories(), Some(100_000.0)).await?;
        assert_eq!(inserted, 0);

        let categories = get_all_active_categories(&db).await?;
        assert_eq!(categories.len(), 10);
        assert_eq!(categories[0].name, "Projects");
        assert_eq!(categories[2].allocated_amount, 30_000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_without_budget_allocates_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        seed_categories(&db, &default_categories(), None).await?;

        let categories = get_all_active_categories(&db).await?;
        assert!(categories.iter().all(|c| c.allocated_amount == 0.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_category_by_name() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;

        let found = get_category_by_name(&db, "Rent").await?;
        assert_eq!(found.unwrap().allocated_percent, 20.0);

        assert!(get_category_by_name(&db, "Yachts").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_category_hidden() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;

        let rent = get_category_by_name(&db, "Rent").await?.unwrap();
        let mut active_model: category::ActiveModel = rent.into();
        active_model.is_active = Set(false);
        active_model.update(&db).await?;

        assert!(get_category_by_name(&db, "Rent").await?.is_none());
        assert_eq!(get_all_active_categories(&db).await?.len(), 9);
        Ok(())
    }

    #[tokio::test]
    async fn test_reallocate_categories() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;

        let updated = reallocate_categories(&db, 200_000.0).await?;
        let nutrition = updated.iter().find(|c| c.name == "Nutrition").unwrap();
        assert_eq!(nutrition.allocated_amount, 60_000.0);

        let total: f64 = updated.iter().map(|c| c.allocated_amount).sum();
        assert!((total - 200_000.0).abs() < 0.01);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_spending_atomic() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let rent = get_category_by_name(&db, "Rent").await?.unwrap();

        let updated = add_spending_atomic(&db, rent.id, 2_500.0).await?;
        assert_eq!(updated.spent_amount, 2_500.0);

        let updated = add_spending_atomic(&db, rent.id, -500.0).await?;
        assert_eq!(updated.spent_amount, 2_000.0);

        let updated = add_spending_atomic(&db, rent.id, -5_000.0).await?;
        assert_eq!(updated.spent_amount, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_spending_unknown_category() -> Result<()> {
        let db = setup_test_db().await?;
        let result = add_spending_atomic(&db, 999, 10.0).await;
        assert!(matches!(result, Err(Error::CategoryNotFound { name: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_all_spent() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        create_test_expense(&db, "Rent", 4_000.0, test_datetime(2026, 3, 2, 10, 0)).await?;
        create_test_expense(&db, "Health", 900.0, test_datetime(2026, 3, 2, 11, 0)).await?;

        assert_eq!(reset_all_spent(&db).await?, 10);
        let categories = get_all_active_categories(&db).await?;
        assert!(categories.iter().all(|c| c.spent_amount == 0.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_sync_spent_with_expenses() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;

        create_test_expense(&db, "Rent", 10_000.0, test_datetime(2026, 3, 2, 10, 0)).await?;
        create_test_expense(&db, "Rent", 5_000.0, test_datetime(2026, 3, 20, 10, 0)).await?;
        // Previous month, ignored
        create_test_expense(&db, "Rent", 7_000.0, test_datetime(2026, 2, 27, 10, 0)).await?;

        // Drift the stored value, then resync
        let rent = get_category_by_name(&db, "Rent").await?.unwrap();
        add_spending_atomic(&db, rent.id, 123.0).await?;

        let updated = sync_spent_with_expenses(&db, 3, 2026).await?;
        let rent = updated.iter().find(|c| c.name == "Rent").unwrap();
        assert_eq!(rent.spent_amount, 15_000.0);

        let nutrition = updated.iter().find(|c| c.name == "Nutrition").unwrap();
        assert_eq!(nutrition.spent_amount, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_format_category_overview() -> Result<()> {
        let db = setup_with_categories(100_000.0).await?;
        let categories = get_all_active_categories(&db).await?;

        let overview = format_category_overview(&categories, "FCFA");
        assert!(overview.contains("Projects (15%)"));
        assert!(overview.contains("Allocated: 30000 FCFA"));
        assert_eq!(overview.matches("Usage:").count(), 10);
        Ok(())
    }
}
