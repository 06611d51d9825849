use crate::application::client::DashboardClient;
use crate::application::orchestrator::CycleState;
use crate::interfaces::components::{account_panel, index_panel, log_panel};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Rows taken by one account table (7 rows plus borders).
const ACCOUNT_HEIGHT: u16 = 9;

pub fn render_dashboard(f: &mut Frame, client: &DashboardClient, log_lines: u16) {
    let snapshot = client.snapshot();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),                // Index rows
            Constraint::Length(ACCOUNT_HEIGHT), // Accounts
            Constraint::Length(log_lines.saturating_add(1)), // Log pane
            Constraint::Length(1),              // Footer
        ])
        .split(f.area());

    index_panel::render(f, chunks[0], snapshot.index.as_ref());
    account_panel::render(f, chunks[1], &snapshot.accounts);
    log_panel::render(f, chunks[2], client.log_lines());
    let published = snapshot
        .published_at
        .map(|t| t.format("%H:%M:%S UTC").to_string());
    render_footer(f, chunks[3], client, published);
}

fn render_footer(f: &mut Frame, area: Rect, client: &DashboardClient, published: Option<String>) {
    let state = client.cycle_state();
    let state_style = match state {
        CycleState::Error(_) => Style::default().fg(Color::Red),
        ref s if s.is_busy() => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    };

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let footer = Line::from(vec![
        Span::raw(" ["),
        Span::styled("r", key),
        Span::raw("] refresh  ["),
        Span::styled("q", key),
        Span::raw("] quit  |  "),
        Span::raw(format!("{}  |  ", client.mode())),
        Span::styled(state.to_string(), state_style),
        Span::raw(match published {
            Some(at) => format!("  |  updated {}", at),
            None => String::new(),
        }),
    ]);
    f.render_widget(Paragraph::new(footer), area);
}
