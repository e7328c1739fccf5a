//! History series reshaped for line plotting.

use serde::Serialize;

use crate::{HistorySeries, HistoryWindow, TickerSymbol, UtcDateTime};

/// Which price lines to extract from a history series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSelector {
    #[default]
    Close,
    CloseAndOpen,
}

impl SeriesSelector {
    pub fn kinds(self) -> &'static [SeriesKind] {
        match self {
            Self::Close => &[SeriesKind::Close],
            Self::CloseAndOpen => &[SeriesKind::Close, SeriesKind::Open],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Close,
    Open,
}

impl SeriesKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Open => "open",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: UtcDateTime,
    pub value: f64,
}

/// One named line; same length and order as the source series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub kind: SeriesKind,
    pub points: Vec<ChartPoint>,
}

/// Plot data, or a signal that there is nothing to plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "series")]
pub enum ChartData {
    NoData,
    Series(Vec<ChartSeries>),
}

impl ChartData {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Series list; empty for [`ChartData::NoData`].
    pub fn series(&self) -> &[ChartSeries] {
        match self {
            Self::NoData => &[],
            Self::Series(series) => series,
        }
    }
}

/// Extract one line per selected kind. No resampling or smoothing.
pub fn build(history: &HistorySeries, selector: SeriesSelector) -> ChartData {
    if history.is_empty() {
        return ChartData::NoData;
    }

    let series = selector
        .kinds()
        .iter()
        .map(|&kind| ChartSeries {
            kind,
            points: history
                .points()
                .iter()
                .map(|point| ChartPoint {
                    timestamp: point.timestamp,
                    value: match kind {
                        SeriesKind::Close => point.close,
                        SeriesKind::Open => point.open,
                    },
                })
                .collect(),
        })
        .collect();

    ChartData::Series(series)
}

/// Chart panel for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerChart {
    pub ticker: TickerSymbol,
    pub window: HistoryWindow,
    pub data: ChartData,
}
