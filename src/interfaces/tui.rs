//! Terminal lifecycle and the input/render loop.
//!
//! The loop only reads the last published snapshot, so it never waits on a
//! fetch in flight.

use crate::application::client::DashboardClient;
use crate::interfaces::dashboard::render_dashboard;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Refresh,
    None,
}

pub fn key_action(code: KeyCode) -> KeyAction {
    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Refresh,
        _ => KeyAction::None,
    }
}

/// Runs the dashboard until the user quits. Blocks the calling thread.
pub fn run(mut client: DashboardClient, tick_rate: Duration, log_lines: u16) -> anyhow::Result<()> {
    // Restore the terminal before the panic message is printed
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // An instant one tick ago forces a redraw on the next pass
    let stale = || Instant::now().checked_sub(tick_rate).unwrap_or_else(Instant::now);
    let mut last_draw = stale();
    let result: anyhow::Result<()> = loop {
        if last_draw.elapsed() >= tick_rate {
            client.drain_logs();
            if let Err(e) = terminal.draw(|f| render_dashboard(f, &client, log_lines)) {
                break Err(e.into());
            }
            last_draw = Instant::now();
        }

        let timeout = tick_rate.saturating_sub(last_draw.elapsed());
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    match key_action(key.code) {
                        KeyAction::Quit => break Ok(()),
                        KeyAction::Refresh => {
                            info!("Manual refresh requested");
                            client.request_refresh();
                            last_draw = stale();
                        }
                        KeyAction::None => {}
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }
    };

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
