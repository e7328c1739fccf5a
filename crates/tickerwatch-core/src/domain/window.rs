use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{Resolution, UtcDateTime, ValidationError};

/// Backward-looking history window, bounded per page.
///
/// Minute windows (1..=1440) are served at one-minute resolution, day windows
/// (1..=30) at daily resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    rename_all = "snake_case",
    tag = "unit",
    content = "length",
    try_from = "RawHistoryWindow"
)]
pub enum HistoryWindow {
    Minutes(u32),
    Days(u32),
}

impl HistoryWindow {
    pub const MAX_MINUTES: u32 = 1440;
    pub const MAX_DAYS: u32 = 30;

    pub fn minutes(length: u32) -> Result<Self, ValidationError> {
        check_range("minutes", length, Self::MAX_MINUTES).map(Self::Minutes)
    }

    pub fn days(length: u32) -> Result<Self, ValidationError> {
        check_range("days", length, Self::MAX_DAYS).map(Self::Days)
    }

    pub const fn resolution(self) -> Resolution {
        match self {
            Self::Minutes(_) => Resolution::OneMinute,
            Self::Days(_) => Resolution::OneDay,
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            Self::Minutes(length) => Duration::minutes(i64::from(length)),
            Self::Days(length) => Duration::days(i64::from(length)),
        }
    }

    /// First instant covered by the window when it ends at `now`.
    pub fn start_from(self, now: UtcDateTime) -> UtcDateTime {
        now.saturating_sub(self.duration())
    }
}

impl Display for HistoryWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minutes(length) => write!(f, "{length}m"),
            Self::Days(length) => write!(f, "{length}d"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case", tag = "unit", content = "length")]
enum RawHistoryWindow {
    Minutes(u32),
    Days(u32),
}

impl TryFrom<RawHistoryWindow> for HistoryWindow {
    type Error = ValidationError;

    fn try_from(value: RawHistoryWindow) -> Result<Self, Self::Error> {
        match value {
            RawHistoryWindow::Minutes(length) => Self::minutes(length),
            RawHistoryWindow::Days(length) => Self::days(length),
        }
    }
}

fn check_range(unit: &'static str, value: u32, max: u32) -> Result<u32, ValidationError> {
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::WindowOutOfRange {
            unit,
            value,
            min: 1,
            max,
        })
    }
}
