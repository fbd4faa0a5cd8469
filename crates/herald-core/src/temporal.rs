//! Relative age labels for notifications, toasts and log rows.
//!
//! Labels are computed at render time against an explicit `now`, so the same
//! record reads "Agora" when it arrives and "3m atrás" a few minutes later.

use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

/// Age bucket of a timestamp relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Age {
    /// Less than a minute old (also used for timestamps in the future).
    Now,
    Minutes(i64),
    Hours(i64),
    Days(i64),
    /// A week or older: shown as an absolute date.
    Date(DateTime<Utc>),
}

impl Age {
    /// Classify `then` relative to `now`.
    pub fn between(then: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let secs = (now - then).num_seconds();
        if secs < MINUTE {
            Age::Now
        } else if secs < HOUR {
            Age::Minutes(secs / MINUTE)
        } else if secs < DAY {
            Age::Hours(secs / HOUR)
        } else if secs < WEEK {
            Age::Days(secs / DAY)
        } else {
            Age::Date(then)
        }
    }

    /// Render as the pt-BR label used across the application.
    pub fn label(&self) -> String {
        match self {
            Age::Now => "Agora".to_string(),
            Age::Minutes(m) => format!("{m}m atrás"),
            Age::Hours(h) => format!("{h}h atrás"),
            Age::Days(d) => format!("{d}d atrás"),
            Age::Date(then) => format_date(*then),
        }
    }
}

/// Relative label for `then` as seen at `now`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    Age::between(then, now).label()
}

/// pt-BR short date (`dd/mm/yyyy`).
pub fn format_date(dt: DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y").to_string()
}

/// pt-BR date and time (`dd/mm/yyyy HH:MM:SS`), used by the admin tables.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M:%S").to_string()
}
