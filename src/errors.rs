//! Unified error type for the budget tracker.
//!
//! Domain failures are struct variants so callers can match on the offending value;
//! infrastructure failures are converted with `#[from]`.

use thiserror::Error;

/// All errors produced by the library and the CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// User input failed a sanity check (empty field, malformed email, ...)
    #[error("{message}")]
    Validation {
        /// Message shown to the user
        message: String,
    },

    /// Amount is zero, negative, or not a finite number
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// No active category carries this name
    #[error("Category not found: {name}")]
    CategoryNotFound {
        /// Requested category name
        name: String,
    },

    /// No expense with this id
    #[error("Expense not found: {id}")]
    ExpenseNotFound {
        /// Requested expense id
        id: i64,
    },

    /// No user with this id, or the account is inactive
    #[error("User not found: {id}")]
    UserNotFound {
        /// Requested user id
        id: i64,
    },

    /// Registration with an email that already has an account
    #[error("Email already in use: {email}")]
    DuplicateEmail {
        /// The duplicated email
        email: String,
    },

    /// Login failed
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// An operation needs a monthly budget and none is set
    #[error("No monthly budget defined")]
    BudgetNotSet,

    /// The user changed the budget less than 30 days ago
    #[error("Budget can be changed again in {days_remaining} day(s)")]
    BudgetLocked {
        /// Whole days until the next change is allowed
        days_remaining: i64,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Password hashing or verification failed
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Integer conversion overflowed
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
