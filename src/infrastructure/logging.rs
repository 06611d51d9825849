//! Log sinks and the tracing subscriber setup.
//!
//! Components report through [`LogSink`]; the tracing-backed sink forwards to
//! the subscriber, which writes to the log file and to the UI log pane.

use crate::domain::ports::LogSink;
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// `YYYY-mm-dd HH:MM:SS [component]: message`
pub fn format_line(timestamp: DateTime<Utc>, component: &str, message: &str) -> String {
    format!(
        "{} [{}]: {}",
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        component,
        message
    )
}

/// Forwards records to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&self, timestamp: DateTime<Utc>, component: &str, message: &str) {
        info!(target: "vixbuddy", "{}", format_line(timestamp, component, message));
    }
}

// A writer that sends logs to the UI via a crossbeam channel
pub struct ChannelWriter {
    sender: crossbeam_channel::Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf).to_string();
        // A closed receiver just means the UI is gone
        let _ = self.sender.try_send(msg);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// Cloneable wrapper for MakeWriter
#[derive(Clone)]
pub struct ChannelWriterFactory {
    sender: crossbeam_channel::Sender<String>,
}

impl ChannelWriterFactory {
    pub fn new(sender: crossbeam_channel::Sender<String>) -> Self {
        Self { sender }
    }
}

impl<'a> fmt::MakeWriter<'a> for ChannelWriterFactory {
    type Writer = ChannelWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ChannelWriter {
            sender: self.sender.clone(),
        }
    }
}

/// Installs the global subscriber: an append-only file layer plus the UI
/// channel layer. Nothing goes to stdout, which belongs to the terminal UI.
pub fn init_tracing(log_file: &Path, ui_sender: crossbeam_channel::Sender<String>) {
    let ui_layer = fmt::layer()
        .with_writer(ChannelWriterFactory::new(ui_sender))
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_level(false);

    if let Some(dir) = log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
        let _ = std::fs::create_dir_all(dir);
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file);
    let (file_layer, file_error) = match file {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(file_layer)
        .with(ui_layer)
        .init();

    if let Some(e) = file_error {
        warn!("Log file {} unavailable: {}", log_file.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_line_format() {
        let ts = Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 5).unwrap();
        assert_eq!(
            format_line(ts, "orchestrator", "cycle 1 published"),
            "2024-04-02 09:30:05 [orchestrator]: cycle 1 published"
        );
    }

    #[test]
    fn test_channel_writer_forwards_lines() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let factory = ChannelWriterFactory::new(tx);
        let mut writer = fmt::MakeWriter::make_writer(&factory);
        writer.write_all(b"hello\n").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "hello\n");
    }
}
