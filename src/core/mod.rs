//! Core business logic - framework-agnostic budget, expense, and reporting operations.
//!
//! Every database-facing function takes a `SeaORM` connection and returns the crate
//! [`Result`](crate::errors::Result). The pure computations (category math, report
//! rendering, schedule delays) live next to them and take plain values.

/// Active monthly budget and its allocation across categories
pub mod budget;
/// Category model, allocation math, and category table operations
pub mod category;
/// Expense logging and period queries
pub mod expense;
/// Monthly reset of category spending
pub mod monthly;
/// Key-value preference storage
pub mod preferences;
/// Report computation, rendering, and persistence
pub mod report;
/// Delay computation until the next report trigger
pub mod schedule;
/// Background tasks that fire report jobs at their trigger times
pub mod scheduler;
/// Account registration, login, and the budget change lock
pub mod user;
/// A single report job run
pub mod worker;
