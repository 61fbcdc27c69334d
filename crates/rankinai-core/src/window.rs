use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Look-back window for analytics rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnalyticsWindow {
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "all")]
    AllTime,
}

impl AnalyticsWindow {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AnalyticsWindow::SevenDays => "7d",
            AnalyticsWindow::ThirtyDays => "30d",
            AnalyticsWindow::AllTime => "all",
        }
    }

    /// Earliest timestamp inside the window, or `None` for all time.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            AnalyticsWindow::SevenDays => Some(now - Duration::days(7)),
            AnalyticsWindow::ThirtyDays => Some(now - Duration::days(30)),
            AnalyticsWindow::AllTime => None,
        }
    }
}

impl fmt::Display for AnalyticsWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalyticsWindow {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" | "7" | "week" => Ok(AnalyticsWindow::SevenDays),
            "30d" | "30" | "month" => Ok(AnalyticsWindow::ThirtyDays),
            "all" | "all-time" | "alltime" => Ok(AnalyticsWindow::AllTime),
            _ => Err(CoreError::InvalidWindow(s.to_string())),
        }
    }
}
