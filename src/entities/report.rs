//! Report entity - A persisted spending summary for one period.
//!
//! Reports are snapshots: once inserted they are never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    /// Unique identifier for the report
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Report kind: `"DAILY"`, `"WEEKLY"` or `"MONTHLY"`
    pub kind: String,
    /// When the report was generated (local wall-clock time)
    pub created_at: DateTime,
    /// Day of month the report was generated on
    pub day: i32,
    /// ISO week the report was generated in
    pub week: i32,
    /// ISO week-numbering year `week` belongs to
    pub week_year: i32,
    /// Month the report was generated in
    pub month: i32,
    /// Calendar year the report was generated in
    pub year: i32,
    /// Budget available for the period
    pub period_budget: f64,
    /// Total spent during the period
    pub total_spent: f64,
    /// `period_budget - total_spent`; negative means deficit
    pub surplus: f64,
    /// Number of expenses in the period
    pub expense_count: i32,
    /// Percent change of spending against the previous period
    pub evolution_percent: f64,
    /// Full rendered report text
    pub body: String,
}

/// `Report` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
