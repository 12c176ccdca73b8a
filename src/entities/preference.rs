//! Preference entity - Key-value settings that outlive a single command.
//! Holds the active monthly budget, the logged-in user and the date of the
//! last monthly reset.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Preference database model - stores key-value pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "preferences")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Preference key (e.g., `"monthly_budget"`)
    pub key: String,
    /// Value stored as string
    pub value: String,
    /// When this preference was last written
    pub updated_at: DateTime,
}

/// `Preference` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
