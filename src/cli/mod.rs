//! Command-line interface - argument parsing and command dispatch
//!
//! Each invocation runs one command. Handlers live in [`commands`] and return the text
//! to print, so the whole layer can be driven from tests without a terminal.

/// Command handlers (account, budget, expense, report)
pub mod commands;

use crate::{
    config::settings::Config,
    core::report::ReportKind,
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;

/// Shared data available to every command.
pub struct CliContext {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Loaded application settings
    pub config: Config,
}

impl CliContext {
    /// Creates a context from an initialized database and loaded settings.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: Config) -> Self {
        Self { database, config }
    }

    /// Currency label printed after amounts.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.config.currency
    }
}

/// Usage text printed by `help` and on parse errors.
pub const USAGE: &str = "\
Usage: budget-tracker <command> [arguments]

Account
  register <name> <email> <password> <confirm> <profession> <city>
  login <email> <password>
  logout
  whoami

Budget
  set-budget <amount>
  budget
  categories
  monthly-reset

Expenses
  add-expense <category> <amount> <description...>
  history
  delete-expense <id>

Reports
  report <daily|weekly|monthly>
  reports [daily|weekly|monthly]
  schedule
  run-scheduler";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create an account
    Register {
        /// Full name
        name: String,
        /// Login email
        email: String,
        /// Password
        password: String,
        /// Password confirmation
        confirm_password: String,
        /// Profession
        profession: String,
        /// City
        city: String,
    },
    /// Log in and remember the account
    Login {
        /// Login email
        email: String,
        /// Password
        password: String,
    },
    /// Forget the logged-in account
    Logout,
    /// Show the logged-in account
    WhoAmI,
    /// Define the monthly budget
    SetBudget {
        /// Raw amount as typed
        amount: String,
    },
    /// Show the month's overall situation
    Budget,
    /// Show every category
    Categories,
    /// Log an expense
    AddExpense {
        /// Category name
        category: String,
        /// Raw amount as typed
        amount: String,
        /// Free-text description
        description: String,
    },
    /// List this month's expenses
    History,
    /// Delete one expense
    DeleteExpense {
        /// Expense id
        id: i64,
    },
    /// Generate and store a report now
    Report {
        /// Report kind
        kind: ReportKind,
    },
    /// List stored reports
    Reports {
        /// Only this kind, when given
        kind: Option<ReportKind>,
    },
    /// Reset category spending if a new month started
    MonthlyReset,
    /// Show the next trigger of every report
    Schedule,
    /// Run the report scheduler until interrupted
    RunScheduler,
    /// Print usage
    Help,
}

impl Command {
    /// Parses the arguments following the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Help);
        };

        let command = match (name.as_str(), rest) {
            ("register", [name, email, password, confirm, profession, city]) => Self::Register {
                name: name.clone(),
                email: email.clone(),
                password: password.clone(),
                confirm_password: confirm.clone(),
                profession: profession.clone(),
                city: city.clone(),
            },
            ("login", [email, password]) => Self::Login {
                email: email.clone(),
                password: password.clone(),
            },
            ("logout", []) => Self::Logout,
            ("whoami", []) => Self::WhoAmI,
            ("set-budget", [amount]) => Self::SetBudget {
                amount: amount.clone(),
            },
            ("budget", []) => Self::Budget,
            ("categories", []) => Self::Categories,
            ("add-expense", [category, amount, description @ ..]) if !description.is_empty() => {
                Self::AddExpense {
                    category: category.clone(),
                    amount: amount.clone(),
                    description: description.join(" "),
                }
            }
            ("history", []) => Self::History,
            ("delete-expense", [id]) => Self::DeleteExpense {
                id: id
                    .trim()
                    .parse()
                    .map_err(|_| Error::validation(format!("Invalid expense id: {id}")))?,
            },
            ("report", [kind]) => Self::Report {
                kind: kind.parse()?,
            },
            ("reports", []) => Self::Reports { kind: None },
            ("reports", [kind]) => Self::Reports {
                kind: Some(kind.parse()?),
            },
            ("monthly-reset", []) => Self::MonthlyReset,
            ("schedule", []) => Self::Schedule,
            ("run-scheduler", []) => Self::RunScheduler,
            ("help" | "--help" | "-h", _) => Self::Help,
            (other, _) => {
                return Err(Error::validation(format!(
                    "Unknown command or wrong arguments: {other}\n\n{USAGE}"
                )));
            }
        };

        Ok(command)
    }
}

/// Runs one command and returns the text to print.
///
/// `now` is the local wall-clock time the command runs at.
pub async fn run(ctx: &CliContext, command: Command, now: NaiveDateTime) -> Result<String> {
    match command {
        Command::Register {
            name,
            email,
            password,
            confirm_password,
            profession,
            city,
        } => {
            let form = crate::core::user::Registration {
                name,
                email,
                password,
                confirm_password,
                profession,
                city,
            };
            commands::account::register(ctx, &form).await
        }
        Command::Login { email, password } => {
            commands::account::login(ctx, &email, &password).await
        }
        Command::Logout => commands::account::logout(ctx).await,
        Command::WhoAmI => commands::account::whoami(ctx, now).await,
        Command::SetBudget { amount } => commands::budget::set_budget(ctx, &amount, now).await,
        Command::Budget => commands::budget::situation(ctx, now).await,
        Command::Categories => commands::budget::categories(ctx).await,
        Command::MonthlyReset => commands::budget::monthly_reset(ctx, now).await,
        Command::AddExpense {
            category,
            amount,
            description,
        } => commands::expense::add_expense(ctx, &category, &amount, &description, now).await,
        Command::History => commands::expense::history(ctx, now).await,
        Command::DeleteExpense { id } => commands::expense::delete_expense(ctx, id).await,
        Command::Report { kind } => commands::report::generate(ctx, kind, now).await,
        Command::Reports { kind } => commands::report::list(ctx, kind).await,
        Command::Schedule => Ok(commands::report::schedule(now)),
        Command::RunScheduler => commands::report::run_scheduler(ctx).await,
        Command::Help => Ok(USAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
        assert_eq!(Command::parse(&args("logout")).unwrap(), Command::Logout);
        assert_eq!(
            Command::parse(&args("set-budget 150000")).unwrap(),
            Command::SetBudget {
                amount: "150000".to_string()
            }
        );
        assert_eq!(
            Command::parse(&args("add-expense Nutrition 2500 rice and fish")).unwrap(),
            Command::AddExpense {
                category: "Nutrition".to_string(),
                amount: "2500".to_string(),
                description: "rice and fish".to_string(),
            }
        );
        assert_eq!(
            Command::parse(&args("delete-expense 7")).unwrap(),
            Command::DeleteExpense { id: 7 }
        );
        assert_eq!(
            Command::parse(&args("report weekly")).unwrap(),
            Command::Report {
                kind: ReportKind::Weekly
            }
        );
        assert_eq!(
            Command::parse(&args("reports")).unwrap(),
            Command::Reports { kind: None }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse(&args("add-expense Nutrition 2500")).is_err());
        assert!(Command::parse(&args("delete-expense seven")).is_err());
        assert!(Command::parse(&args("report yearly")).is_err());
        assert!(Command::parse(&args("login only-email")).is_err());
        assert!(matches!(
            Command::parse(&args("fly")),
            Err(Error::Validation { message }) if message.contains("fly")
        ));
    }
}
