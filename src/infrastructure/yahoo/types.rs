use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::market::{Bar, Quote};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(super) struct YahooChartResponse {
    pub chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct YahooChartData {
    #[serde(default)]
    pub result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    pub error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct YahooChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct YahooChartResult {
    pub meta: YahooChartMeta,
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    pub indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct YahooChartMeta {
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_day_high: Option<f64>,
    #[serde(default)]
    pub regular_market_day_low: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct YahooChartIndicators {
    #[serde(default)]
    pub quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct YahooChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl YahooChartResponse {
    /// The single chart result, or the API-level error as `Remote`.
    pub fn into_result(self, symbol: &str) -> DashboardResult<YahooChartResult> {
        if let Some(error) = self.chart.error {
            return Err(DashboardError::Remote {
                status: 200,
                body: format!("{}: {}", error.code, error.description),
            });
        }
        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| DashboardError::unavailable(format!("no chart data for {}", symbol)))
    }
}

impl YahooChartResult {
    /// Bars with complete OHLC values, ascending by time.
    pub fn bars(&self) -> Vec<Bar> {
        let Some(timestamps) = self.timestamp.as_ref() else {
            return Vec::new();
        };
        let Some(quote) = self.indicators.quote.first() else {
            return Vec::new();
        };

        let mut bars: Vec<Bar> = timestamps
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let timestamp = DateTime::<Utc>::from_timestamp(ts, 0)?;
                Some(Bar {
                    timestamp,
                    open: quote.open.get(i).copied().flatten()?,
                    high: quote.high.get(i).copied().flatten()?,
                    low: quote.low.get(i).copied().flatten()?,
                    close: quote.close.get(i).copied().flatten()?,
                })
            })
            .collect();
        bars.sort_by_key(|bar| bar.timestamp);
        bars
    }

    pub fn quote(&self, symbol: &str) -> DashboardResult<Quote> {
        let missing = |field: &str| {
            DashboardError::unavailable(format!("{} missing from {} quote", field, symbol))
        };
        let open = self
            .bars()
            .first()
            .map(|bar| bar.open)
            .ok_or_else(|| missing("open"))?;

        Ok(Quote {
            open,
            last: self.meta.regular_market_price.ok_or_else(|| missing("regularMarketPrice"))?,
            day_low: self
                .meta
                .regular_market_day_low
                .ok_or_else(|| missing("regularMarketDayLow"))?,
            day_high: self
                .meta
                .regular_market_day_high
                .ok_or_else(|| missing("regularMarketDayHigh"))?,
        })
    }
}
