//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod expense;
pub mod preference;
pub mod report;
pub mod user;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use preference::{
    Column as PreferenceColumn, Entity as Preference, Model as PreferenceModel,
};
pub use report::{Column as ReportColumn, Entity as Report, Model as ReportModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
