use std::time::Duration;

use serde::Serialize;

use crate::cache::DEFAULT_CACHE_TTL;
use crate::chart::SeriesSelector;
use crate::{HistoryWindow, ValidationError};

/// Interval between scheduled refresh cycles, 5..=3600 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshInterval(u64);

impl RefreshInterval {
    pub const MIN_SECS: u64 = 5;
    pub const MAX_SECS: u64 = 3600;
    pub const DEFAULT_SECS: u64 = 15;

    pub fn from_secs(secs: u64) -> Result<Self, ValidationError> {
        if (Self::MIN_SECS..=Self::MAX_SECS).contains(&secs) {
            Ok(Self(secs))
        } else {
            Err(ValidationError::RefreshIntervalOutOfRange {
                value: secs,
                min: Self::MIN_SECS,
                max: Self::MAX_SECS,
            })
        }
    }

    pub const fn as_secs(self) -> u64 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_DETAIL_DAYS: u32 = 7;

/// Knobs of one dashboard instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    /// Zero disables reuse entirely.
    pub cache_ttl: Duration,
    /// Upper bound for each upstream call.
    pub fetch_timeout: Duration,
    /// Tickers fetched at once.
    pub concurrency: usize,
    pub show_chart: bool,
    pub history_window: HistoryWindow,
    pub series: SeriesSelector,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            show_chart: true,
            history_window: HistoryWindow::Minutes(60),
            series: SeriesSelector::Close,
        }
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fetch_timeout.is_zero() {
            return Err(ValidationError::NotPositive {
                field: "fetch_timeout",
            });
        }
        if self.concurrency == 0 {
            return Err(ValidationError::NotPositive {
                field: "concurrency",
            });
        }
        // Windows built through the variants directly skip the range check.
        match self.history_window {
            HistoryWindow::Minutes(length) => HistoryWindow::minutes(length)?,
            HistoryWindow::Days(length) => HistoryWindow::days(length)?,
        };
        Ok(())
    }
}
