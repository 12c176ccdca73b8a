//! Category entity - A named budget bucket with a fixed percentage allocation.
//!
//! The allocated amount is derived from the active monthly budget and rewritten
//! whenever the budget changes. `spent_amount` grows with each logged expense and
//! is reset at the start of every month.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Nutrition", "Rent")
    pub name: String,
    /// Share of the monthly budget, in percent
    pub allocated_percent: f64,
    /// Monthly budget × percent / 100
    pub allocated_amount: f64,
    /// Amount spent this month
    pub spent_amount: f64,
    /// When the category was created
    pub created_at: DateTime,
    /// Inactive categories are hidden from listings and cannot receive expenses
    pub is_active: bool,
}

/// Categories are referenced by name from expenses, so no relation is declared
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
