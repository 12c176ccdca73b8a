//! Account business logic - registration, login, session and the budget change lock.
//!
//! Passwords are stored as bcrypt hashes. A user may change their monthly budget once
//! every 30 days; the lock is tracked per account through `budget_modified_at`.
//! The logged-in account is remembered in the preference table.

use crate::{
    core::preferences,
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::{Local, NaiveDateTime, TimeDelta};
use sea_orm::{Set, prelude::*};
use tracing::{info, instrument, warn};

/// Shortest accepted password, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// Days that must pass between two budget changes
pub const BUDGET_LOCK_DAYS: i64 = 30;

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// Full name
    pub name: String,
    /// Login email
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Password typed a second time
    pub confirm_password: String,
    /// Profession
    pub profession: String,
    /// City of residence
    pub city: String,
}

/// Checks a registration form without touching the database.
pub fn validate_registration(form: &Registration) -> Result<()> {
    let required = [
        &form.name,
        &form.email,
        &form.password,
        &form.profession,
        &form.city,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(Error::validation("Fill in every field"));
    }

    let email = form.email.trim();
    if !email.contains('@') || !email.contains('.') {
        return Err(Error::validation(format!("Invalid email address: {email}")));
    }

    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if form.password != form.confirm_password {
        return Err(Error::validation("Passwords do not match"));
    }

    Ok(())
}

/// Creates an account.
///
/// # Errors
/// * [`Error::Validation`] - The form failed [`validate_registration`]
/// * [`Error::DuplicateEmail`] - An account already uses this email
#[instrument(skip(db, form), fields(email = %form.email.trim()))]
pub async fn register(db: &DatabaseConnection, form: &Registration) -> Result<user::Model> {
    validate_registration(form)?;

    let email = form.email.trim();
    if get_user_by_email(db, email).await?.is_some() {
        return Err(Error::DuplicateEmail {
            email: email.to_string(),
        });
    }

    let password_hash = bcrypt::hash(&form.password, HASH_COST)?;

    let created = user::ActiveModel {
        name: Set(form.name.trim().to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        profession: Set(form.profession.trim().to_string()),
        city: Set(form.city.trim().to_string()),
        monthly_budget: Set(0.0),
        budget_modified_at: Set(None),
        created_at: Set(Local::now().naive_local()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Registered user {}", created.id);
    Ok(created)
}

/// Checks credentials and returns the matching active account.
pub async fn login(db: &DatabaseConnection, email: &str, password: &str) -> Result<user::Model> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Error::validation("Enter your email and password"));
    }

    let Some(account) = get_user_by_email(db, email).await? else {
        warn!("Login attempt for unknown email");
        return Err(Error::InvalidCredentials);
    };

    if !account.is_active || !bcrypt::verify(password, &account.password_hash)? {
        warn!("Rejected login for user {}", account.id);
        return Err(Error::InvalidCredentials);
    }

    Ok(account)
}

/// Finds an account by id.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds an account by exact email.
pub async fn get_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whole days left before `account` may change its budget again; 0 when allowed now.
#[must_use]
pub fn days_until_budget_change(account: &user::Model, now: NaiveDateTime) -> i64 {
    let Some(modified_at) = account.budget_modified_at else {
        return 0;
    };

    let remaining = modified_at + TimeDelta::days(BUDGET_LOCK_DAYS) - now;
    if remaining <= TimeDelta::zero() {
        return 0;
    }

    // Round partial days up
    let day_secs = TimeDelta::days(1).num_seconds();
    (remaining.num_seconds() + day_secs - 1) / day_secs
}

/// True when the budget was never changed or the last change is at least 30 days old.
#[must_use]
pub fn can_modify_budget(account: &user::Model, now: NaiveDateTime) -> bool {
    days_until_budget_change(account, now) == 0
}

/// Records a budget change on the account, enforcing the 30-day lock.
///
/// Only the account is updated; the active budget itself is set through
/// [`crate::core::budget::change_monthly_budget`].
#[instrument(skip(db))]
pub async fn record_budget_change<C>(
    db: &C,
    user_id: i64,
    amount: f64,
    now: NaiveDateTime,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }

    let account = get_user_by_id(db, user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(Error::UserNotFound { id: user_id })?;

    let days_remaining = days_until_budget_change(&account, now);
    if days_remaining > 0 {
        return Err(Error::BudgetLocked { days_remaining });
    }

    let mut active_model: user::ActiveModel = account.into();
    active_model.monthly_budget = Set(amount);
    active_model.budget_modified_at = Set(Some(now));
    let updated = active_model.update(db).await?;

    info!("User {user_id} changed budget to {amount}");
    Ok(updated)
}

/// Remembers `user_id` as the logged-in account.
pub async fn set_active_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    preferences::set_preference(db, preferences::ACTIVE_USER_KEY, &user_id.to_string()).await
}

/// The logged-in account, if any.
///
/// A stored id whose account is gone or deactivated counts as logged out.
pub async fn active_user(db: &DatabaseConnection) -> Result<Option<user::Model>> {
    let Some(raw) = preferences::get_preference(db, preferences::ACTIVE_USER_KEY).await? else {
        return Ok(None);
    };

    let user_id: i64 = raw.parse().map_err(|e| Error::Config {
        message: format!("Stored active user {raw:?} is not an id: {e}"),
    })?;

    Ok(get_user_by_id(db, user_id).await?.filter(|u| u.is_active))
}

/// Forgets the logged-in account.
pub async fn clear_active_user(db: &DatabaseConnection) -> Result<()> {
    preferences::remove_preference(db, preferences::ACTIVE_USER_KEY).await
}
