//! Expense entity - One logged expense.
//!
//! `day`, `week`, `week_year`, `month` and `year` are derived from `spent_at` when the
//! expense is created and only serve as query filters. `week` is the ISO week number
//! and `week_year` the ISO week-numbering year it belongs to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the category the expense is charged to
    pub category: String,
    /// Free-text description
    pub description: String,
    /// Amount spent, always positive
    pub amount: f64,
    /// Local wall-clock time of the expense
    pub spent_at: DateTime,
    /// Day of month (1-31)
    pub day: i32,
    /// ISO week number (1-53)
    pub week: i32,
    /// ISO week-numbering year
    pub week_year: i32,
    /// Month (1-12)
    pub month: i32,
    /// Calendar year
    pub year: i32,
}

/// Expenses reference categories by name only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
