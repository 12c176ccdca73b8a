//! Command handlers. Each returns the text printed for the user.

/// `register`, `login`, `logout`, `whoami`
pub mod account;
/// `set-budget`, `budget`, `categories`, `monthly-reset`
pub mod budget;
/// `add-expense`, `history`, `delete-expense`
pub mod expense;
/// `report`, `reports`, `schedule`, `run-scheduler`
pub mod report;
