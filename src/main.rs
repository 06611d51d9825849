use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use vixbuddy::application::client::DashboardClient;
use vixbuddy::application::system::Application;
use vixbuddy::config::{Config, Mode};
use vixbuddy::domain::ports::LogSink;
use vixbuddy::infrastructure::logging::{TracingLogSink, init_tracing};

/// Terminal dashboard for the VIX and brokerage account allocation targets.
#[derive(Debug, Parser)]
#[command(name = "vixbuddy", version)]
struct Cli {
    /// Data source: `live` or `mock` (overrides MODE)
    #[arg(long)]
    mode: Option<Mode>,

    /// Auto-refresh interval in seconds, 0 to disable (overrides REFRESH_INTERVAL_SECS)
    #[arg(long)]
    refresh_secs: Option<u64>,

    /// Log file path (overrides LOG_FILE)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(secs) = self.refresh_secs {
            config.dashboard.refresh_interval_secs = secs;
        }
        if let Some(path) = self.log_file {
            config.dashboard.log_file = path;
        }
    }
}

fn main() -> anyhow::Result<()> {
    // 0. Load Env (before starting anything)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    // 1. Logging: file + UI channel
    let (log_tx, log_rx) = crossbeam_channel::unbounded();
    init_tracing(&config.dashboard.log_file, log_tx);
    let log: Arc<dyn LogSink> = Arc::new(TracingLogSink);
    log.log("main", format!("starting vixbuddy in {} mode", config.mode));

    let tick_rate = config.dashboard.tick_rate();
    let log_capacity = config.dashboard.log_pane_lines;
    let log_lines = config.dashboard.log_pane_height();

    // 2. Missing credentials end the process here, before the terminal is taken over
    let app = match Application::build(config, log.clone()) {
        Ok(app) => app,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            eprintln!("vixbuddy: {:#}", e);
            std::process::exit(1);
        }
    };

    // 3. Tokio runtime on a background thread; the UI owns the main thread
    let (system_tx, system_rx) = crossbeam_channel::bounded(1);
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

    let runtime_thread = std::thread::spawn(move || -> anyhow::Result<()> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        rt.block_on(async move {
            info!("Background runtime started.");
            let handle = app.start();
            let refresh = handle.refresh.clone();
            if system_tx.send(handle).is_err() {
                return;
            }
            // Park until the UI exits, then stop the refresh loop
            let _ = stop_rx.await;
            refresh.shutdown().await;
        });
        Ok(())
    });

    let handle = system_rx
        .recv()
        .map_err(|_| anyhow::anyhow!("background runtime exited before startup completed"))?;
    info!("System running. Launching UI.");

    // 4. Run UI (blocks main thread)
    let client = DashboardClient::new(handle, log_rx, log_capacity);
    let result = vixbuddy::interfaces::tui::run(client, tick_rate, log_lines);

    let _ = stop_tx.send(());
    match runtime_thread.join() {
        Ok(Err(e)) => error!("Runtime error: {:#}", e),
        Err(_) => error!("Runtime thread panicked"),
        Ok(Ok(())) => {}
    }

    result
}
