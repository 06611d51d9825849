use crate::application::orchestrator::{CycleReport, Orchestrator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshCommand {
    Refresh,
    Shutdown,
}

/// Sends commands to a running [`RefreshService`].
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<RefreshCommand>,
}

impl RefreshHandle {
    /// Queues a refresh. Never blocks; a full queue already holds a pending
    /// refresh, so the request is dropped.
    pub fn request_refresh(&self) -> bool {
        match self.tx.try_send(RefreshCommand::Refresh) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("RefreshHandle: refresh already queued");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("RefreshHandle: refresh service has stopped");
                false
            }
        }
    }

    pub async fn shutdown(&self) {
        if self.tx.send(RefreshCommand::Shutdown).await.is_err() {
            debug!("RefreshHandle: refresh service already stopped");
        }
    }
}

/// Drives the orchestrator: once at startup, then on every timer tick and
/// every refresh command. Cycles never overlap.
pub struct RefreshService {
    orchestrator: Arc<Orchestrator>,
    interval: Option<Duration>,
    rx: mpsc::Receiver<RefreshCommand>,
}

impl RefreshService {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Option<Duration>) -> (Self, RefreshHandle) {
        let (tx, rx) = mpsc::channel(8);
        (
            Self {
                orchestrator,
                interval: interval.filter(|d| !d.is_zero()),
                rx,
            },
            RefreshHandle { tx },
        )
    }

    /// Runs until shutdown or until every handle is dropped. Returns the
    /// number of cycles run.
    pub async fn run(mut self) -> u64 {
        let mut cycles = 0;
        self.cycle(&mut cycles).await;

        let mut ticker = self.interval.map(|period| {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            let command = tokio::select! {
                cmd = self.rx.recv() => cmd,
                _ = async {
                    match ticker.as_mut() {
                        Some(t) => { t.tick().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => Some(RefreshCommand::Refresh),
            };

            match command {
                Some(RefreshCommand::Refresh) => {
                    if self.drain_pending() {
                        break;
                    }
                    self.cycle(&mut cycles).await;
                }
                Some(RefreshCommand::Shutdown) | None => break,
            }
        }

        info!("RefreshService: stopped after {} cycle(s)", cycles);
        cycles
    }

    /// Folds queued refreshes into the one about to run. Returns true if a
    /// shutdown was queued behind them.
    fn drain_pending(&mut self) -> bool {
        while let Ok(cmd) = self.rx.try_recv() {
            if cmd == RefreshCommand::Shutdown {
                return true;
            }
        }
        false
    }

    async fn cycle(&self, cycles: &mut u64) -> CycleReport {
        let report = self.orchestrator.run_cycle().await;
        *cycles += 1;
        debug!("RefreshService: cycle {} ended in {}", report.cycle, report.state);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_store::DataStore;
    use crate::application::orchestrator::OrchestratorConfig;
    use crate::infrastructure::mock::{MemoryLogSink, MockAccountService, MockMarketSeriesService};

    fn orchestrator(accounts: MockAccountService) -> Arc<Orchestrator> {
        Arc::new(Orchestrator::new(
            Arc::new(MockMarketSeriesService::demo()),
            Arc::new(accounts),
            Arc::new(DataStore::new()),
            Arc::new(MemoryLogSink::new()),
            OrchestratorConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_runs_initial_cycle_then_stops_on_shutdown() {
        let orchestrator = orchestrator(MockAccountService::new());
        let (service, handle) = RefreshService::new(orchestrator.clone(), None);
        let task = tokio::spawn(service.run());

        handle.shutdown().await;
        let cycles = task.await.unwrap();

        assert_eq!(cycles, 1);
        assert_eq!(orchestrator.store().current().cycle, 1);
    }

    #[tokio::test]
    async fn test_queued_refreshes_coalesce() {
        let accounts = MockAccountService::new()
            .with_account("5WT00001", "Roth", "1000")
            .with_latency(Duration::from_millis(50));
        let orchestrator = orchestrator(accounts);
        let (service, handle) = RefreshService::new(orchestrator.clone(), None);

        // Queued before the loop starts; all land while the initial cycle runs.
        for _ in 0..5 {
            assert!(handle.request_refresh());
        }
        let task = tokio::spawn(service.run());

        // Wait for the initial cycle plus one coalesced follow-up.
        let mut states = orchestrator.store().subscribe();
        while states.borrow_and_update().cycle < 2 {
            states.changed().await.unwrap();
        }
        handle.shutdown().await;
        let cycles = task.await.unwrap();

        assert_eq!(cycles, 2);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_service() {
        let orchestrator = orchestrator(MockAccountService::new());
        let (service, handle) = RefreshService::new(orchestrator, None);
        drop(handle);
        assert_eq!(service.run().await, 1);
    }

    #[tokio::test]
    async fn test_timer_triggers_cycles() {
        let orchestrator = orchestrator(MockAccountService::new());
        let (service, handle) =
            RefreshService::new(orchestrator.clone(), Some(Duration::from_millis(20)));
        let task = tokio::spawn(service.run());

        let mut snapshots = orchestrator.store().subscribe();
        while snapshots.borrow_and_update().cycle < 3 {
            snapshots.changed().await.unwrap();
        }
        handle.shutdown().await;

        assert!(task.await.unwrap() >= 3);
    }
}
