use super::timeframe::Timeframe;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLC bar. Series are always ordered ascending by `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Live quote fields for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub open: f64,
    pub last: f64,
    pub day_low: f64,
    pub day_high: f64,
}

/// Relative lookback understood by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    OneDay,
    OneMonth,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::OneMonth => "1mo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    Period(Period),
    Since(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: String,
    pub window: HistoryWindow,
    pub timeframe: Timeframe,
}

impl HistoryRequest {
    pub fn period(symbol: &str, period: Period, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.to_string(),
            window: HistoryWindow::Period(period),
            timeframe,
        }
    }

    pub fn since(symbol: &str, start: DateTime<Utc>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.to_string(),
            window: HistoryWindow::Since(start),
            timeframe,
        }
    }
}

/// The three lookback horizons shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    OneDay,
    FiveDay,
    TwentyFourDay,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::TwentyFourDay, Horizon::FiveDay, Horizon::OneDay];

    /// Resolution of the intraday series fetched for this horizon.
    pub fn timeframe(&self) -> Timeframe {
        match self {
            Horizon::OneDay => Timeframe::OneMin,
            Horizon::FiveDay => Timeframe::FiveMin,
            Horizon::TwentyFourDay => Timeframe::ThirtyMin,
        }
    }

    /// How far back from the most recent daily bar the intraday series starts.
    pub fn lookback(&self) -> Duration {
        match self {
            Horizon::OneDay => Duration::hours(24),
            Horizon::FiveDay => Duration::days(5),
            Horizon::TwentyFourDay => Duration::days(24),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::OneDay => "day",
            Horizon::FiveDay => "week (5d)",
            Horizon::TwentyFourDay => "month (24d)",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizon::OneDay => f.write_str("1day"),
            Horizon::FiveDay => f.write_str("5day"),
            Horizon::TwentyFourDay => f.write_str("24day"),
        }
    }
}

/// Everything fetched for the index in one refresh cycle. Replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct RawIndexSnapshot {
    pub symbol: String,
    pub quote: Quote,
    /// One month of daily bars; anchors are taken from here.
    pub daily: Vec<Bar>,
    /// 30-minute bars over the trailing 24 days.
    pub series_24day: Vec<Bar>,
    /// 5-minute bars over the trailing 5 days.
    pub series_5day: Vec<Bar>,
    /// 1-minute bars over the trailing 24 hours.
    pub series_1day: Vec<Bar>,
    pub fetched_at: DateTime<Utc>,
}

impl RawIndexSnapshot {
    pub fn series(&self, horizon: Horizon) -> &[Bar] {
        match horizon {
            Horizon::OneDay => &self.series_1day,
            Horizon::FiveDay => &self.series_5day,
            Horizon::TwentyFourDay => &self.series_24day,
        }
    }

    /// First bar of the horizon's lookback window within the daily history.
    pub fn anchor(&self, horizon: Horizon) -> Option<&Bar> {
        let len = self.daily.len();
        match horizon {
            Horizon::OneDay => self.daily.last(),
            Horizon::FiveDay if len >= 5 => self.daily.get(len - 5),
            Horizon::FiveDay => None,
            Horizon::TwentyFourDay => self.daily.first(),
        }
    }

    pub fn most_recent(&self) -> Option<&Bar> {
        self.daily.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn daily(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 3, 1 + i as u32, 0, 0, 0).unwrap(),
                open: 10.0 + i as f64,
                high: 11.0 + i as f64,
                low: 9.0 + i as f64,
                close: 10.5 + i as f64,
            })
            .collect()
    }

    fn snapshot(daily: Vec<Bar>) -> RawIndexSnapshot {
        RawIndexSnapshot {
            symbol: "^VIX".to_string(),
            quote: Quote {
                open: 1.0,
                last: 1.0,
                day_low: 1.0,
                day_high: 1.0,
            },
            daily,
            series_24day: Vec::new(),
            series_5day: Vec::new(),
            series_1day: Vec::new(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_anchor_positions() {
        let snap = snapshot(daily(20));
        assert_eq!(snap.anchor(Horizon::TwentyFourDay).unwrap().open, 10.0);
        assert_eq!(snap.anchor(Horizon::FiveDay).unwrap().open, 25.0);
        assert_eq!(snap.anchor(Horizon::OneDay).unwrap().open, 29.0);
    }

    #[test]
    fn test_five_day_anchor_needs_five_bars() {
        let snap = snapshot(daily(4));
        assert!(snap.anchor(Horizon::FiveDay).is_none());
        assert!(snap.anchor(Horizon::TwentyFourDay).is_some());
    }

    #[test]
    fn test_horizon_resolutions() {
        assert_eq!(Horizon::OneDay.timeframe(), Timeframe::OneMin);
        assert_eq!(Horizon::FiveDay.timeframe(), Timeframe::FiveMin);
        assert_eq!(Horizon::TwentyFourDay.timeframe(), Timeframe::ThirtyMin);
        assert_eq!(Horizon::TwentyFourDay.lookback(), Duration::days(24));
    }
}
