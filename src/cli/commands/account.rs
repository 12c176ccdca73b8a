//! Account commands.

use crate::{
    cli::CliContext,
    core::user::{self, Registration},
    errors::Result,
};
use chrono::NaiveDateTime;

/// Creates an account.
pub async fn register(ctx: &CliContext, form: &Registration) -> Result<String> {
    let created = user::register(&ctx.database, form).await?;
    Ok(format!(
        "\u{2705} Account created for {}. Log in with `login {}`.",
        created.name, created.email
    ))
}

/// Logs in and remembers the account for the next commands.
pub async fn login(ctx: &CliContext, email: &str, password: &str) -> Result<String> {
    let account = user::login(&ctx.database, email, password).await?;
    user::set_active_user(&ctx.database, account.id).await?;
    Ok(format!("\u{1F44B} Welcome, {}!", account.name))
}

/// Forgets the logged-in account.
pub async fn logout(ctx: &CliContext) -> Result<String> {
    user::clear_active_user(&ctx.database).await?;
    Ok("Logged out".to_string())
}

/// Shows the logged-in account and whether it may change the budget.
pub async fn whoami(ctx: &CliContext, now: NaiveDateTime) -> Result<String> {
    let Some(account) = user::active_user(&ctx.database).await? else {
        return Ok("Not logged in".to_string());
    };

    let budget_line = match user::days_until_budget_change(&account, now) {
        0 => "Budget can be changed".to_string(),
        days => format!("Budget can be changed again in {days} day(s)"),
    };

    Ok(format!(
        "{} <{}>\n{} - {}\nMonthly budget: {:.0} {}\n{budget_line}",
        account.name,
        account.email,
        account.profession,
        account.city,
        account.monthly_budget,
        ctx.currency()
    ))
}
