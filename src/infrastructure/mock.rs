//! Deterministic in-memory adapters.
//!
//! They back the `mock` run mode and double as the test fixtures for the
//! orchestrator and refresh loop.

use crate::domain::account::{AccountRecord, Balance};
use crate::domain::errors::{DashboardError, DashboardResult};
use crate::domain::market::{Bar, HistoryRequest, HistoryWindow, Horizon, Quote, Timeframe};
use crate::domain::ports::{AccountService, LogSink, MarketSeriesService};
use crate::infrastructure::logging::format_line;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

/// Start of the day of the most recent daily bar in the demo data.
fn demo_session() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 13, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Smooth oscillation around `base`, so every window has a real range.
fn wave(base: f64, amplitude: f64, i: usize) -> f64 {
    base + amplitude * (i as f64 * 0.15).sin()
}

fn synthetic_bars(end: DateTime<Utc>, lookback: Duration, step: Duration) -> Vec<Bar> {
    let count = (lookback.num_minutes() / step.num_minutes().max(1)).max(1) as usize;
    let start = end - lookback;
    (0..count)
        .map(|i| {
            let close = wave(19.0, 2.5, i);
            let open = wave(19.0, 2.5, i.saturating_sub(1));
            Bar {
                timestamp: start + step * i as i32,
                open,
                high: open.max(close) + 0.2,
                low: open.min(close) - 0.2,
                close,
            }
        })
        .collect()
}

pub struct MockMarketSeriesService {
    quote: Quote,
    daily: Vec<Bar>,
    intraday: HashMap<Timeframe, Vec<Bar>>,
    failure: Option<DashboardError>,
    latency: StdDuration,
    requests: Mutex<Vec<HistoryRequest>>,
}

impl MockMarketSeriesService {
    /// Index at 20.0 after opening at 18.0, with 22 daily bars and intraday
    /// series for every horizon.
    pub fn demo() -> Self {
        let session = demo_session();
        let daily: Vec<Bar> = (0..22)
            .map(|i| {
                let close = wave(17.0, 3.0, i * 3);
                Bar {
                    timestamp: session - Duration::days(21 - i as i64),
                    open: close - 0.4,
                    high: close + 1.1,
                    low: close - 1.3,
                    close,
                }
            })
            .collect();

        let intraday = Horizon::ALL
            .iter()
            .map(|h| {
                let step = Duration::minutes(h.timeframe().to_minutes() as i64);
                (h.timeframe(), synthetic_bars(session, h.lookback(), step))
            })
            .collect();

        Self {
            quote: Quote {
                open: 18.0,
                last: 20.0,
                day_low: 17.5,
                day_high: 21.0,
            },
            daily,
            intraday,
            failure: None,
            latency: StdDuration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_daily(mut self, daily: Vec<Bar>) -> Self {
        self.daily = daily;
        self
    }

    pub fn with_series(mut self, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.intraday.insert(timeframe, bars);
        self
    }

    /// Every call fails with `error`.
    pub fn failing(mut self, error: DashboardError) -> Self {
        self.failure = Some(error);
        self
    }

    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = latency;
        self
    }

    /// History requests received so far.
    pub fn requests(&self) -> Vec<HistoryRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    async fn respond(&self) -> DashboardResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketSeriesService for MockMarketSeriesService {
    async fn fetch_quote(&self, _symbol: &str) -> DashboardResult<Quote> {
        self.respond().await?;
        Ok(self.quote)
    }

    async fn fetch_history(&self, request: &HistoryRequest) -> DashboardResult<Vec<Bar>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.respond().await?;

        let bars = match request.timeframe {
            Timeframe::OneDay => self.daily.clone(),
            tf => self.intraday.get(&tf).cloned().unwrap_or_default(),
        };
        Ok(match request.window {
            HistoryWindow::Since(start) => bars.into_iter().filter(|b| b.timestamp >= start).collect(),
            HistoryWindow::Period(_) => bars,
        })
    }
}

#[derive(Default)]
pub struct MockAccountService {
    accounts: Vec<AccountRecord>,
    net_liq: HashMap<String, String>,
    balance_failures: HashMap<String, DashboardError>,
    list_failure: Option<DashboardError>,
    latency: StdDuration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    balance_calls: AtomicUsize,
}

impl MockAccountService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Three accounts plus the brokerage placeholder that must never show.
    pub fn demo() -> Self {
        Self::new()
            .with_account("5WT00001", "Roth IRA", "48210.37")
            .with_account("5WT00002", "Individual", "125000.00")
            .with_account("5WT00003", "Small", "450.00")
            .with_account("1DA13984", "TW Challenge", "1000.00")
    }

    pub fn with_account(mut self, number: &str, nickname: &str, net_liq: &str) -> Self {
        self.accounts.push(AccountRecord::new(number, nickname));
        self.net_liq.insert(number.to_string(), net_liq.to_string());
        self
    }

    pub fn failing_balance(mut self, number: &str, error: DashboardError) -> Self {
        self.balance_failures.insert(number.to_string(), error);
        self
    }

    pub fn failing_list(mut self, error: DashboardError) -> Self {
        self.list_failure = Some(error);
        self
    }

    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = latency;
        self
    }

    /// Highest number of balance fetches observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountService for MockAccountService {
    async fn list_accounts(&self) -> DashboardResult<Vec<AccountRecord>> {
        self.delay().await;
        match &self.list_failure {
            Some(e) => Err(e.clone()),
            None => Ok(self.accounts.clone()),
        }
    }

    async fn fetch_balance(&self, account_number: &str) -> DashboardResult<Balance> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.delay().await;

        if let Some(e) = self.balance_failures.get(account_number) {
            return Err(e.clone());
        }
        let net_liq = self.net_liq.get(account_number).ok_or_else(|| DashboardError::Remote {
            status: 404,
            body: format!("account {} not found", account_number),
        })?;

        Ok(Balance {
            account_number: account_number.to_string(),
            net_liquidating_value: net_liq.clone(),
            extra: Default::default(),
        })
    }
}

/// Keeps formatted log lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn record(&self, timestamp: DateTime<Utc>, component: &str, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(format_line(timestamp, component, message));
        }
    }
}
