//! Trigger computation for the periodic reports.
//!
//! Every report runs at 23:59 local wall-clock time: daily reports every day, weekly
//! reports on Sunday and monthly reports on the last calendar day of the month.
//! A trigger counts as passed once `now` reaches it, after which the next one is used.

use crate::core::report::ReportKind;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::time::Duration;

/// Minutes after midnight at which reports run (23:59)
pub const TRIGGER_MINUTE_OF_DAY: i64 = 23 * 60 + 59;

fn trigger_on(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + TimeDelta::minutes(TRIGGER_MINUTE_OF_DAY)
}

/// Last calendar day of the month containing `date`.
#[must_use]
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Next daily trigger: today at 23:59, or tomorrow once that has passed.
#[must_use]
pub fn next_daily_trigger(now: NaiveDateTime) -> NaiveDateTime {
    let today = trigger_on(now.date());
    if now >= today {
        today + TimeDelta::days(1)
    } else {
        today
    }
}

/// Next weekly trigger: Sunday at 23:59.
///
/// On a Sunday before 23:59 this is the same day.
#[must_use]
pub fn next_weekly_trigger(now: NaiveDateTime) -> NaiveDateTime {
    let days_to_sunday = (7 - now.weekday().num_days_from_sunday()) % 7;
    let sunday = trigger_on(now.date()) + TimeDelta::days(i64::from(days_to_sunday));
    if now >= sunday {
        sunday + TimeDelta::days(7)
    } else {
        sunday
    }
}

/// Next monthly trigger: last day of the month at 23:59.
///
/// Once this month's trigger has passed, the last day of the next month is used.
#[must_use]
pub fn next_monthly_trigger(now: NaiveDateTime) -> NaiveDateTime {
    let this_month = trigger_on(last_day_of_month(now.date()));
    if now < this_month {
        return this_month;
    }

    let first_of_next = this_month.date() + TimeDelta::days(1);
    trigger_on(last_day_of_month(first_of_next))
}

/// Next trigger of `kind` after `now`.
#[must_use]
pub fn next_trigger(kind: ReportKind, now: NaiveDateTime) -> NaiveDateTime {
    match kind {
        ReportKind::Daily => next_daily_trigger(now),
        ReportKind::Weekly => next_weekly_trigger(now),
        ReportKind::Monthly => next_monthly_trigger(now),
    }
}

/// Time left until the next trigger of `kind`. Always positive.
#[must_use]
pub fn delay_until(kind: ReportKind, now: NaiveDateTime) -> TimeDelta {
    next_trigger(kind, now) - now
}

/// [`delay_until`] in milliseconds.
#[must_use]
pub fn delay_millis(kind: ReportKind, now: NaiveDateTime) -> i64 {
    delay_until(kind, now).num_milliseconds()
}

/// Converts a delay for `tokio::time::sleep`. Negative delays become zero.
#[must_use]
pub fn to_sleep_duration(delay: TimeDelta) -> Duration {
    delay.to_std().unwrap_or(Duration::ZERO)
}

/// One line per report kind with its next run and the time left.
#[must_use]
pub fn format_schedule(now: NaiveDateTime) -> String {
    ReportKind::ALL
        .iter()
        .map(|&kind| {
            let delay = delay_until(kind, now);
            format!(
                "{:<8} next run {} (in {}h {:02}m)",
                kind.label(),
                next_trigger(kind, now).format("%d/%m/%Y %H:%M"),
                delay.num_hours(),
                delay.num_minutes() % 60
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
