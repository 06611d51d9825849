use crate::application::data_store::DashboardSnapshot;
use crate::application::orchestrator::CycleState;
use crate::application::system::SystemHandle;
use crate::config::Mode;
use crossbeam_channel::Receiver;
use std::collections::VecDeque;
use std::sync::Arc;

/// The presenter's view of the running system.
///
/// Everything here is non-blocking: snapshot reads clone an `Arc`, and log
/// lines are drained from a channel fed by the tracing UI layer.
pub struct DashboardClient {
    handle: SystemHandle,
    log_rx: Receiver<String>,
    log_lines: VecDeque<String>,
    log_capacity: usize,
}

impl DashboardClient {
    pub fn new(handle: SystemHandle, log_rx: Receiver<String>, log_capacity: usize) -> Self {
        Self {
            handle,
            log_rx,
            log_lines: VecDeque::with_capacity(log_capacity),
            log_capacity,
        }
    }

    /// Last published snapshot. Never waits on an in-flight cycle.
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.handle.snapshots.borrow().clone()
    }

    pub fn cycle_state(&self) -> CycleState {
        self.handle.cycle_state.borrow().clone()
    }

    pub fn mode(&self) -> Mode {
        self.handle.mode
    }

    pub fn request_refresh(&self) -> bool {
        self.handle.refresh.request_refresh()
    }

    pub async fn shutdown(&self) {
        self.handle.refresh.shutdown().await;
    }

    /// Moves pending log lines into the ring buffer. Returns how many arrived.
    pub fn drain_logs(&mut self) -> usize {
        let mut received = 0;
        while let Ok(msg) = self.log_rx.try_recv() {
            received += 1;
            for line in msg.lines().filter(|l| !l.trim().is_empty()) {
                while self.log_lines.len() >= self.log_capacity.max(1) {
                    self.log_lines.pop_front();
                }
                self.log_lines.push_back(line.to_string());
            }
        }
        received
    }

    /// Most recent log lines, oldest first.
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log_lines.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_store::DataStore;
    use crate::application::orchestrator::{Orchestrator, OrchestratorConfig};
    use crate::application::refresh_service::RefreshService;
    use crate::infrastructure::mock::{MemoryLogSink, MockAccountService, MockMarketSeriesService};

    fn client(log_rx: Receiver<String>, capacity: usize) -> DashboardClient {
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(MockMarketSeriesService::demo()),
            Arc::new(MockAccountService::new()),
            Arc::new(DataStore::new()),
            Arc::new(MemoryLogSink::new()),
            OrchestratorConfig::default(),
        ));
        let (_service, refresh) = RefreshService::new(orchestrator.clone(), None);
        let handle = SystemHandle {
            snapshots: orchestrator.store().subscribe(),
            cycle_state: orchestrator.subscribe_state(),
            refresh,
            mode: Mode::Mock,
        };
        DashboardClient::new(handle, log_rx, capacity)
    }

    #[test]
    fn test_log_ring_keeps_last_lines() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut client = client(rx, 2);

        tx.send("one\n".to_string()).unwrap();
        tx.send("two\nthree\n".to_string()).unwrap();
        assert_eq!(client.drain_logs(), 2);

        let lines: Vec<&str> = client.log_lines().collect();
        assert_eq!(lines, vec!["two", "three"]);
    }

    #[test]
    fn test_zero_capacity_still_bounds_the_ring() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut client = client(rx, 0);

        for i in 0..1000 {
            tx.send(format!("line {}\n", i)).unwrap();
        }
        assert_eq!(client.drain_logs(), 1000);

        let lines: Vec<&str> = client.log_lines().collect();
        assert_eq!(lines, vec!["line 999"]);
    }

    #[test]
    fn test_blank_before_first_cycle() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let client = client(rx, 5);
        assert!(client.snapshot().is_empty());
        assert_eq!(client.cycle_state(), CycleState::Idle);
    }
}
