//! Health-check outcomes and the status categories shown on the dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Threshold under which a day status renders as a failure.
const FAILURE_THRESHOLD: f64 = 0.3;

/// Result of a single health check.
///
/// Variants are declared worst-first so the derived `Ord` puts
/// `Failure < Partial < Success`; "worst of" is `min`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Failure,
    Partial,
    Success,
}

impl Outcome {
    /// Numeric weight used for uptime percentages.
    pub fn value(self) -> f64 {
        match self {
            Outcome::Failure => 0.0,
            Outcome::Partial => 0.5,
            Outcome::Success => 1.0,
        }
    }

    pub fn worst(self, other: Outcome) -> Outcome {
        self.min(other)
    }
}

impl From<&str> for Outcome {
    fn from(token: &str) -> Self {
        // Case-sensitive on purpose: "Success" is not a success.
        match token.trim() {
            "success" => Outcome::Success,
            "warn" => Outcome::Partial,
            _ => Outcome::Failure,
        }
    }
}

/// Reduced status of one day. `None` means no checks were recorded.
pub type DayStatus = Option<Outcome>;

/// Worst of two day statuses; a missing status never wins over a recorded one.
pub fn worst_of(current: DayStatus, incoming: DayStatus) -> DayStatus {
    match (current, incoming) {
        (Some(a), Some(b)) => Some(a.worst(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Numeric form of a day status, as carried in the rendered grid.
pub fn day_value(status: DayStatus) -> Option<f64> {
    status.map(Outcome::value)
}

/// User-facing category of a day status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    NoData,
    Success,
    Failure,
    Partial,
}

impl StatusColor {
    /// Classify a numeric day status.
    pub fn from_value(value: Option<f64>) -> Self {
        match value {
            None => StatusColor::NoData,
            Some(v) if v == 1.0 => StatusColor::Success,
            Some(v) if v < FAILURE_THRESHOLD => StatusColor::Failure,
            Some(_) => StatusColor::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::NoData => "nodata",
            StatusColor::Success => "success",
            StatusColor::Failure => "failure",
            StatusColor::Partial => "partial",
        }
    }

    /// Short status label.
    pub fn label(&self) -> &'static str {
        match self {
            StatusColor::NoData => "No Data Available",
            StatusColor::Success => "Fully Operational",
            StatusColor::Failure => "Major Outage",
            StatusColor::Partial => "Outage Warning",
        }
    }

    /// Sentence describing what the color means for a single day.
    pub fn description(&self) -> &'static str {
        match self {
            StatusColor::NoData => "No Data Available: Health check was not performed.",
            StatusColor::Success => "No downtime recorded on this day.",
            StatusColor::Failure => "Major outages recorded on this day.",
            StatusColor::Partial => "Outage warning recorded on this day.",
        }
    }
}

impl From<DayStatus> for StatusColor {
    fn from(status: DayStatus) -> Self {
        StatusColor::from_value(day_value(status))
    }
}

impl std::fmt::Display for StatusColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tooltip copy for one grid square, e.g. `auth | Mon Jan 01 2024 : Major Outage`.
pub fn tooltip(key: &str, date: NaiveDate, color: StatusColor) -> String {
    format!("{} | {} : {}", key, date.format("%a %b %d %Y"), color.label())
}
