use super::types::YahooChartResponse;
use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::market::{Bar, HistoryRequest, HistoryWindow, Period, Quote, Timeframe};
use crate::domain::ports::{LogSink, MarketSeriesService};
use crate::infrastructure::core::http_client_factory::{build_url_with_query, percent_encode};
use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use std::sync::Arc;
use tracing::{debug, error};

const COMPONENT: &str = "yahoo";

/// Index quotes and OHLC history from the Yahoo Finance chart endpoint.
pub struct YahooMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    log: Arc<dyn LogSink>,
}

impl YahooMarketDataService {
    pub fn new(client: ClientWithMiddleware, base_url: &str, log: Arc<dyn LogSink>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            log,
        }
    }

    fn chart_url(&self, symbol: &str, params: &[(&str, String)]) -> String {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, percent_encode(symbol));
        build_url_with_query(&url, params)
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        params: &[(&str, String)],
    ) -> DashboardResult<YahooChartResponse> {
        let url = self.chart_url(symbol, params);
        debug!("YahooMarketDataService: GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            let err = DashboardError::from(e);
            self.log
                .log(COMPONENT, format!("chart request for {} failed: {}", symbol, err));
            err
        })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("YahooMarketDataService: {} returned {}", symbol, status);
            self.log
                .log(COMPONENT, format!("chart for {} returned {}", symbol, status));
            return Err(DashboardError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            self.log
                .log(COMPONENT, format!("chart for {} is malformed: {}", symbol, e));
            DashboardError::from(e)
        })
    }
}

#[async_trait]
impl MarketSeriesService for YahooMarketDataService {
    async fn fetch_quote(&self, symbol: &str) -> DashboardResult<Quote> {
        let params = [
            ("range", Period::OneDay.as_str().to_string()),
            ("interval", Timeframe::OneDay.to_yahoo_string().to_string()),
        ];
        self.fetch_chart(symbol, &params)
            .await?
            .into_result(symbol)?
            .quote(symbol)
    }

    async fn fetch_history(&self, request: &HistoryRequest) -> DashboardResult<Vec<Bar>> {
        let mut params = match request.window {
            HistoryWindow::Period(period) => vec![("range", period.as_str().to_string())],
            HistoryWindow::Since(start) => vec![
                ("period1", start.timestamp().to_string()),
                ("period2", Utc::now().timestamp().to_string()),
            ],
        };
        params.push(("interval", request.timeframe.to_yahoo_string().to_string()));

        let bars = self
            .fetch_chart(&request.symbol, &params)
            .await?
            .into_result(&request.symbol)?
            .bars();
        debug!(
            "YahooMarketDataService: {} {} -> {} bars",
            request.symbol,
            request.timeframe,
            bars.len()
        );
        Ok(bars)
    }
}
