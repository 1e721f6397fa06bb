//! Due-date aging classification
//!
//! Callers supply `today`; these functions never read the system clock.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

/// Collections bucket for how overdue a payable is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "1-30")]
    Days1To30,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    Over90,
}

impl AgingBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Days1To30 => "1-30",
            Self::Days31To60 => "31-60",
            Self::Days61To90 => "61-90",
            Self::Over90 => "90+",
        }
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Days a bill is overdue, clamped at zero for future due dates
pub fn calculate_days_overdue(today: Date, due_date: Date) -> i64 {
    (today - due_date).whole_days().max(0)
}

/// Classify a due date into an aging bucket relative to `today`.
/// Calendar-day truncation; business days are not considered.
pub fn calculate_aging_bucket(today: Date, due_date: Date) -> AgingBucket {
    let days_overdue = (today - due_date).whole_days();
    if days_overdue < 0 {
        AgingBucket::Current
    } else if days_overdue <= 30 {
        AgingBucket::Days1To30
    } else if days_overdue <= 60 {
        AgingBucket::Days31To60
    } else if days_overdue <= 90 {
        AgingBucket::Days61To90
    } else {
        AgingBucket::Over90
    }
}
