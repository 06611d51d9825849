use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::market::types::{Bar, Horizon, RawIndexSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived figures for one lookback horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonStats {
    pub horizon: Horizon,
    pub open: f64,
    /// `last - open`
    pub change: f64,
    /// `change / last`. Normalized by the last price, not by the open.
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    /// Position of `last` inside `[low, high]`, scaled to 0..100. Not clamped.
    pub iv_rank: f64,
    /// Closing prices used for the sparkline.
    pub closes: Vec<f64>,
}

/// Immutable stats for the volatility index, one entry per horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub symbol: String,
    pub last: f64,
    pub one_day: HorizonStats,
    pub five_day: HorizonStats,
    pub twenty_four_day: HorizonStats,
    pub as_of: DateTime<Utc>,
}

impl IndexStats {
    pub fn horizon(&self, horizon: Horizon) -> &HorizonStats {
        match horizon {
            Horizon::OneDay => &self.one_day,
            Horizon::FiveDay => &self.five_day,
            Horizon::TwentyFourDay => &self.twenty_four_day,
        }
    }
}

/// `(last - low) / (high - low) * 100`.
///
/// A zero-width (or inverted) range has no defined rank and is reported as
/// `DataUnavailable` instead of producing NaN or infinity.
pub fn iv_rank(last: f64, low: f64, high: f64, horizon: Horizon) -> DashboardResult<f64> {
    if !(high > low) {
        return Err(DashboardError::unavailable(format!(
            "{} rank undefined: high {} <= low {}",
            horizon, high, low
        )));
    }

    let rank = (last - low) / (high - low) * 100.0;
    if !rank.is_finite() {
        return Err(DashboardError::unavailable(format!(
            "{} rank is not finite (last {}, low {}, high {})",
            horizon, last, low, high
        )));
    }
    Ok(rank)
}

/// Max of highs and min of lows over a series.
fn series_range(series: &[Bar], horizon: Horizon) -> DashboardResult<(f64, f64)> {
    if series.is_empty() {
        return Err(DashboardError::unavailable(format!(
            "{} series is empty",
            horizon
        )));
    }

    let high = series
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let low = series.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    Ok((high, low))
}

fn horizon_stats(
    horizon: Horizon,
    last: f64,
    open: f64,
    high: f64,
    low: f64,
    series: &[Bar],
) -> DashboardResult<HorizonStats> {
    let change = last - open;
    Ok(HorizonStats {
        horizon,
        open,
        change,
        change_percent: change / last,
        high,
        low,
        iv_rank: iv_rank(last, low, high, horizon)?,
        closes: series.iter().map(|b| b.close).collect(),
    })
}

/// Derives [`IndexStats`] from a raw snapshot. Pure; the snapshot is not touched.
///
/// The 1-day horizon takes open/high/low from the live quote while its
/// sparkline comes from the 1-minute history, so the two may disagree slightly.
/// The 5-day and 24-day horizons take their open from the anchor daily bar and
/// their high/low from the intraday series. Any missing input fails the whole
/// derivation.
pub fn derive_index_stats(snapshot: &RawIndexSnapshot) -> DashboardResult<IndexStats> {
    let quote = &snapshot.quote;
    let last = quote.last;
    if !last.is_finite() || last == 0.0 {
        return Err(DashboardError::unavailable(format!(
            "{} last price {} cannot normalize changes",
            snapshot.symbol, last
        )));
    }

    if snapshot.series_1day.is_empty() {
        return Err(DashboardError::unavailable(format!(
            "{} series is empty",
            Horizon::OneDay
        )));
    }
    let one_day = horizon_stats(
        Horizon::OneDay,
        last,
        quote.open,
        quote.day_high,
        quote.day_low,
        &snapshot.series_1day,
    )?;

    let ranged = |horizon: Horizon| -> DashboardResult<HorizonStats> {
        let anchor = snapshot.anchor(horizon).ok_or_else(|| {
            DashboardError::unavailable(format!(
                "no anchor bar for {} ({} daily bars)",
                horizon,
                snapshot.daily.len()
            ))
        })?;
        let series = snapshot.series(horizon);
        let (high, low) = series_range(series, horizon)?;
        horizon_stats(horizon, last, anchor.open, high, low, series)
    };
    let five_day = ranged(Horizon::FiveDay)?;
    let twenty_four_day = ranged(Horizon::TwentyFourDay)?;

    Ok(IndexStats {
        symbol: snapshot.symbol.clone(),
        last,
        one_day,
        five_day,
        twenty_four_day,
        as_of: snapshot.fetched_at,
    })
}
