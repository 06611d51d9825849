use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::market::{HistoryRequest, Horizon, Period, RawIndexSnapshot, Timeframe};
use crate::domain::ports::MarketSeriesService;
use chrono::Utc;

/// Fetches everything needed to derive index stats for `symbol`.
///
/// The quote and one month of daily bars are fetched together; the most recent
/// daily bar then fixes the start of the three intraday series, which are also
/// fetched together.
pub async fn fetch_index_snapshot(
    market: &dyn MarketSeriesService,
    symbol: &str,
) -> DashboardResult<RawIndexSnapshot> {
    let daily_request = HistoryRequest::period(symbol, Period::OneMonth, Timeframe::OneDay);
    let (quote, daily) = tokio::try_join!(
        market.fetch_quote(symbol),
        market.fetch_history(&daily_request)
    )?;

    let most_recent = daily.last().map(|bar| bar.timestamp).ok_or_else(|| {
        DashboardError::unavailable(format!("no daily history for {}", symbol))
    })?;

    let request = |horizon: Horizon| {
        HistoryRequest::since(symbol, most_recent - horizon.lookback(), horizon.timeframe())
    };
    let request_24day = request(Horizon::TwentyFourDay);
    let request_5day = request(Horizon::FiveDay);
    let request_1day = request(Horizon::OneDay);

    let (series_24day, series_5day, series_1day) = tokio::try_join!(
        market.fetch_history(&request_24day),
        market.fetch_history(&request_5day),
        market.fetch_history(&request_1day)
    )?;

    Ok(RawIndexSnapshot {
        symbol: symbol.to_string(),
        quote,
        daily,
        series_24day,
        series_5day,
        series_1day,
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::HistoryWindow;
    use crate::infrastructure::mock::MockMarketSeriesService;
    use chrono::Duration;

    #[tokio::test]
    async fn test_intraday_windows_start_from_most_recent_daily_bar() {
        let market = MockMarketSeriesService::demo();
        let snapshot = fetch_index_snapshot(&market, "^VIX").await.unwrap();

        let most_recent = snapshot.most_recent().unwrap().timestamp;
        let requests = market.requests();
        let since = |tf: Timeframe| {
            requests
                .iter()
                .find(|r| r.timeframe == tf)
                .map(|r| r.window)
                .unwrap()
        };

        assert_eq!(
            since(Timeframe::ThirtyMin),
            HistoryWindow::Since(most_recent - Duration::days(24))
        );
        assert_eq!(
            since(Timeframe::FiveMin),
            HistoryWindow::Since(most_recent - Duration::days(5))
        );
        assert_eq!(
            since(Timeframe::OneMin),
            HistoryWindow::Since(most_recent - Duration::hours(24))
        );
        assert_eq!(
            since(Timeframe::OneDay),
            HistoryWindow::Period(Period::OneMonth)
        );
    }

    #[tokio::test]
    async fn test_empty_daily_history_is_unavailable() {
        let market = MockMarketSeriesService::demo().with_daily(Vec::new());
        let err = fetch_index_snapshot(&market, "^VIX").await.unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_quote_failure_propagates() {
        let market = MockMarketSeriesService::demo().failing(DashboardError::network("down"));
        let err = fetch_index_snapshot(&market, "^VIX").await.unwrap_err();
        assert!(matches!(err, DashboardError::Network { .. }));
    }
}
