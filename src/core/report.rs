//! Report generation business logic.
//!
//! A report summarizes the spending of one period (day, ISO week or month) against
//! the share of the monthly budget available for that period. Computation is split
//! from rendering and persistence: [`compute_report`] is pure, [`render_report`] turns
//! a [`ReportDraft`] into text, and [`generate_report`] queries, computes, renders and
//! stores in one call.

use crate::{
    core::expense,
    entities::{Report, expense as expense_entity, report},
    errors::{Error, Result},
};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::{cmp::Ordering, fmt, fmt::Write, str::FromStr};
use tracing::{debug, info, instrument};

/// Most categories listed in a report breakdown
pub const MAX_BREAKDOWN_CATEGORIES: usize = 10;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Which period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// One calendar day
    Daily,
    /// One ISO week (Monday to Sunday)
    Weekly,
    /// One calendar month
    Monthly,
}

impl ReportKind {
    /// Every kind, in scheduling order.
    pub const ALL: [Self; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    /// Value stored in the `kind` column.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    /// Lowercase name used on the command line and in logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// The monthly budget is divided by this to get the period budget.
    ///
    /// A month counts as 30 days or 4 weeks.
    #[must_use]
    pub const fn budget_divisor(self) -> f64 {
        match self {
            Self::Daily => 30.0,
            Self::Weekly => 4.0,
            Self::Monthly => 1.0,
        }
    }

    /// How the previous period is named in the evolution line.
    #[must_use]
    pub const fn previous_phrase(self) -> &'static str {
        match self {
            Self::Daily => "yesterday",
            Self::Weekly => "previous week",
            Self::Monthly => "previous month",
        }
    }

    /// Parses a stored `kind` column value.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.label() == wanted)
            .ok_or_else(|| {
                Error::validation(format!(
                    "Unknown report kind {s:?} (expected daily, weekly or monthly)"
                ))
            })
    }
}

/// The calendar period a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// A single day
    Day(NaiveDate),
    /// An ISO week of an ISO week-numbering year
    Week {
        /// ISO week number
        week: u32,
        /// ISO week-numbering year
        year: i32,
    },
    /// A calendar month
    Month {
        /// Month (1-12)
        month: u32,
        /// Calendar year
        year: i32,
    },
}

impl ReportPeriod {
    /// The period of `kind` that contains `now`.
    #[must_use]
    pub fn containing(kind: ReportKind, now: NaiveDateTime) -> Self {
        let date = now.date();
        match kind {
            ReportKind::Daily => Self::Day(date),
            ReportKind::Weekly => {
                let iso = date.iso_week();
                Self::Week {
                    week: iso.week(),
                    year: iso.year(),
                }
            }
            ReportKind::Monthly => Self::Month {
                month: date.month(),
                year: date.year(),
            },
        }
    }

    /// The period right before this one.
    ///
    /// Weeks step back seven days from the Monday of the week, so week 1 is
    /// followed backwards by the last ISO week of the prior year.
    #[must_use]
    pub fn previous(self) -> Self {
        match self {
            Self::Day(date) => Self::Day(date.pred_opt().unwrap_or(date)),
            Self::Week { week, year } => NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
                .and_then(|monday| monday.checked_sub_days(Days::new(7)))
                .map_or(self, |earlier| {
                    let iso = earlier.iso_week();
                    Self::Week {
                        week: iso.week(),
                        year: iso.year(),
                    }
                }),
            Self::Month { month: 1, year } => Self::Month {
                month: 12,
                year: year - 1,
            },
            Self::Month { month, year } => Self::Month {
                month: month - 1,
                year,
            },
        }
    }

    /// Expenses logged within the period, newest first.
    pub async fn expenses(self, db: &DatabaseConnection) -> Result<Vec<expense_entity::Model>> {
        match self {
            Self::Day(date) => expense::get_expenses_for_day(db, date).await,
            Self::Week { week, year } => expense::get_expenses_for_week(db, week, year).await,
            Self::Month { month, year } => expense::get_expenses_for_month(db, month, year).await,
        }
    }

    /// Total spent within the period; `None` when nothing was logged.
    pub async fn total(self, db: &DatabaseConnection) -> Result<Option<f64>> {
        match self {
            Self::Day(date) => expense::total_for_day(db, date).await,
            Self::Week { week, year } => expense::total_for_week(db, week, year).await,
            Self::Month { month, year } => expense::total_for_month(db, month, year).await,
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(date) => write!(f, "{}", date.format("%d/%m/%Y")),
            Self::Week { week, year } => write!(f, "Week {week} - {year}"),
            Self::Month { month, year } => {
                let name = month
                    .checked_sub(1)
                    .and_then(|i| usize::try_from(i).ok())
                    .and_then(|i| MONTH_NAMES.get(i))
                    .unwrap_or(&"?");
                write!(f, "{name} {year}")
            }
        }
    }
}

/// Spending of one category within a report.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// Category name
    pub category: String,
    /// Amount spent in the period
    pub total: f64,
}

/// A computed report, not yet rendered or stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDraft {
    /// Report kind
    pub kind: ReportKind,
    /// Period covered
    pub period: ReportPeriod,
    /// Generation time
    pub generated_at: NaiveDateTime,
    /// Budget available for the period
    pub period_budget: f64,
    /// Total spent in the period
    pub total_spent: f64,
    /// `period_budget - total_spent`
    pub surplus: f64,
    /// Total of the previous period, if anything was logged then
    pub previous_total: Option<f64>,
    /// Percent change against the previous period
    pub evolution_percent: f64,
    /// Number of expenses in the period
    pub expense_count: usize,
    /// Spending per category, largest first
    pub breakdown: Vec<CategoryTotal>,
    /// Average spent per day, for weekly and monthly reports
    pub daily_average: Option<f64>,
    /// Share of the monthly budget used, for monthly reports
    pub budget_used_percent: Option<f64>,
}

/// Budget available for one period of `kind`.
#[must_use]
pub fn period_budget(kind: ReportKind, monthly_budget: f64) -> f64 {
    monthly_budget / kind.budget_divisor()
}

/// Percent change from `previous` to `current`.
///
/// Returns 0 when there is no previous total or it is not positive.
#[must_use]
pub fn evolution_percent(current: f64, previous: Option<f64>) -> f64 {
    match previous {
        Some(prev) if prev > 0.0 => ((current - prev) / prev) * 100.0,
        _ => 0.0,
    }
}

/// Groups expenses by category, largest total first.
///
/// At most [`MAX_BREAKDOWN_CATEGORIES`] categories are tracked, in the order they are
/// first seen; expenses of any further category are left out. Categories with equal
/// totals keep their first-seen order.
#[must_use]
pub fn category_breakdown(expenses: &[expense_entity::Model]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::with_capacity(MAX_BREAKDOWN_CATEGORIES);

    for e in expenses {
        if let Some(entry) = totals.iter_mut().find(|t| t.category == e.category) {
            entry.total += e.amount;
        } else if totals.len() < MAX_BREAKDOWN_CATEGORIES {
            totals.push(CategoryTotal {
                category: e.category.clone(),
                total: e.amount,
            });
        }
    }

    // sort_by is stable
    totals.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    totals
}

/// Computes a report from already queried data.
///
/// # Arguments
/// * `kind` - Report kind
/// * `now` - Generation time, also selects the period
/// * `monthly_budget` - Active monthly budget
/// * `expenses` - Expenses of the period
/// * `previous_total` - Total of the previous period, `None` when nothing was logged
#[must_use]
pub fn compute_report(
    kind: ReportKind,
    now: NaiveDateTime,
    monthly_budget: f64,
    expenses: &[expense_entity::Model],
    previous_total: Option<f64>,
) -> ReportDraft {
    let budget = period_budget(kind, monthly_budget);
    let total_spent: f64 = expenses.iter().map(|e| e.amount).sum();

    let daily_average = match kind {
        ReportKind::Daily => None,
        ReportKind::Weekly => Some(total_spent / 7.0),
        ReportKind::Monthly => Some(total_spent / 30.0),
    };

    let budget_used_percent = (kind == ReportKind::Monthly).then(|| {
        if budget > 0.0 {
            (total_spent / budget) * 100.0
        } else {
            0.0
        }
    });

    ReportDraft {
        kind,
        period: ReportPeriod::containing(kind, now),
        generated_at: now,
        period_budget: budget,
        total_spent,
        surplus: budget - total_spent,
        previous_total,
        evolution_percent: evolution_percent(total_spent, previous_total),
        expense_count: expenses.len(),
        breakdown: category_breakdown(expenses),
        daily_average,
        budget_used_percent,
    }
}

/// Renders a report as the text stored in the `body` column.
#[must_use]
pub fn render_report(draft: &ReportDraft, currency: &str) -> String {
    let generated = draft.generated_at.format("%d/%m/%Y %H:%M");
    let mut text = String::new();

    // write! is infallible when writing to String
    let _ = writeln!(
        text,
        "\u{1F4CA} {} REPORT",
        draft.kind.label().to_ascii_uppercase()
    );
    text.push_str("================================\n");
    match draft.kind {
        ReportKind::Daily => {
            let _ = writeln!(text, "\u{1F4C5} Date: {generated}");
        }
        ReportKind::Weekly => {
            let _ = writeln!(text, "\u{1F4C5} {}", draft.period);
            let _ = writeln!(text, "\u{1F4C5} Generated: {generated}");
        }
        ReportKind::Monthly => {
            let _ = writeln!(text, "\u{1F4C5} Month: {}", draft.period);
            let _ = writeln!(text, "\u{1F4C5} Generated: {generated}");
        }
    }

    let (budget_label, spent_label) = match draft.kind {
        ReportKind::Daily => ("Daily budget", "Spent today"),
        ReportKind::Weekly => ("Weekly budget", "Spent this week"),
        ReportKind::Monthly => ("Monthly budget", "Spent this month"),
    };
    text.push_str("\n\u{1F4B0} FINANCIAL SUMMARY\n");
    let _ = writeln!(text, "{budget_label}: {:.0} {currency}", draft.period_budget);
    let _ = writeln!(text, "{spent_label}: {:.0} {currency}", draft.total_spent);
    if draft.surplus >= 0.0 {
        let _ = writeln!(text, "\u{2705} Surplus: {:.0} {currency}", draft.surplus);
    } else {
        let _ = writeln!(
            text,
            "\u{274C} Deficit: {:.0} {currency}",
            draft.surplus.abs()
        );
    }
    if let Some(used) = draft.budget_used_percent {
        let _ = writeln!(text, "Budget used: {used:.1}%");
    }

    if draft.previous_total.is_some() {
        let phrase = draft.kind.previous_phrase();
        text.push_str("\n\u{1F4CA} EVOLUTION\n");
        let evolution = draft.evolution_percent;
        if evolution > 0.0 {
            let _ = writeln!(text, "\u{1F4C8} +{evolution:.1}% vs {phrase}");
        } else if evolution < 0.0 {
            let _ = writeln!(text, "\u{1F4C9} {evolution:.1}% vs {phrase}");
        } else {
            let _ = writeln!(text, "\u{27A1} Same level as {phrase}");
        }
    }

    text.push_str("\n\u{1F4DD} DETAILS\n");
    let _ = writeln!(text, "Transactions: {}", draft.expense_count);
    if let Some(average) = draft.daily_average {
        let _ = writeln!(text, "Daily average: {average:.0} {currency}");
    }

    text.push_str("\n\u{1F4B3} BY CATEGORY\n");
    for entry in &draft.breakdown {
        let _ = writeln!(text, "- {}: {:.0} {currency}", entry.category, entry.total);
    }

    text
}

/// Generates, renders and stores the report of `kind` for the period containing `now`.
///
/// # Arguments
/// * `db` - Database connection
/// * `kind` - Report kind
/// * `monthly_budget` - Active monthly budget the period budget is derived from
/// * `now` - Generation time
/// * `currency` - Currency label used in the rendered text
///
/// # Returns
/// The stored report
#[instrument(skip(db, currency))]
pub async fn generate_report(
    db: &DatabaseConnection,
    kind: ReportKind,
    monthly_budget: f64,
    now: NaiveDateTime,
    currency: &str,
) -> Result<report::Model> {
    let period = ReportPeriod::containing(kind, now);
    let expenses = period.expenses(db).await?;
    let previous_total = period.previous().total(db).await?;
    debug!(
        "{} expenses in {period}, previous total {previous_total:?}",
        expenses.len()
    );

    let draft = compute_report(kind, now, monthly_budget, &expenses, previous_total);
    let body = render_report(&draft, currency);

    let date = now.date();
    let iso = date.iso_week();

    let stored = report::ActiveModel {
        kind: Set(kind.code().to_string()),
        created_at: Set(now),
        day: Set(i32::try_from(date.day())?),
        week: Set(i32::try_from(iso.week())?),
        week_year: Set(iso.year()),
        month: Set(i32::try_from(date.month())?),
        year: Set(date.year()),
        period_budget: Set(draft.period_budget),
        total_spent: Set(draft.total_spent),
        surplus: Set(draft.surplus),
        expense_count: Set(i32::try_from(draft.expense_count)?),
        evolution_percent: Set(draft.evolution_percent),
        body: Set(body),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Stored {kind} report {} for {period}: spent {:.0} of {:.0}",
        stored.id, draft.total_spent, draft.period_budget
    );
    Ok(stored)
}

/// All stored reports, newest first.
pub async fn get_all_reports(db: &DatabaseConnection) -> Result<Vec<report::Model>> {
    Report::find()
        .order_by_desc(report::Column::CreatedAt)
        .order_by_desc(report::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Stored reports of one kind, newest first.
pub async fn get_reports_by_kind(
    db: &DatabaseConnection,
    kind: ReportKind,
) -> Result<Vec<report::Model>> {
    Report::find()
        .filter(report::Column::Kind.eq(kind.code()))
        .order_by_desc(report::Column::CreatedAt)
        .order_by_desc(report::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The most recent report of one kind.
pub async fn get_latest_report(
    db: &DatabaseConnection,
    kind: ReportKind,
) -> Result<Option<report::Model>> {
    Report::find()
        .filter(report::Column::Kind.eq(kind.code()))
        .order_by_desc(report::Column::CreatedAt)
        .order_by_desc(report::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Reports generated in one month, newest first.
pub async fn get_reports_for_month(
    db: &DatabaseConnection,
    month: u32,
    year: i32,
) -> Result<Vec<report::Model>> {
    let month = i32::try_from(month)?;
    Report::find()
        .filter(report::Column::Month.eq(month))
        .filter(report::Column::Year.eq(year))
        .order_by_desc(report::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes every stored report.
pub async fn delete_all_reports(db: &DatabaseConnection) -> Result<u64> {
    let result = Report::delete_many().exec(db).await?;
    Ok(result.rows_affected)
}

/// One line per stored report.
#[must_use]
pub fn format_report_index(reports: &[report::Model], currency: &str) -> String {
    if reports.is_empty() {
        return "No reports yet".to_string();
    }

    reports
        .iter()
        .map(|r| {
            format!(
                "#{} {} {} | spent {:.0} of {:.0} {currency}",
                r.id,
                r.kind,
                r.created_at.format("%d/%m/%Y %H:%M"),
                r.total_spent,
                r.period_budget
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
