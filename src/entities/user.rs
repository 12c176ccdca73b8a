//! User entity - Account credentials and profile fields.
//!
//! The profile is unrelated to the budgeting math except for the 30-day lock on
//! budget changes, tracked through `budget_modified_at`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Login email, unique across accounts
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Profession
    pub profession: String,
    /// City of residence
    pub city: String,
    /// Last monthly budget this user set (0 if never)
    pub monthly_budget: f64,
    /// When the budget was last changed by this user
    pub budget_modified_at: Option<DateTime>,
    /// When the account was created
    pub created_at: DateTime,
    /// Deactivated accounts cannot log in
    pub is_active: bool,
}

/// `User` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
