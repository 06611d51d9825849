use crate::domain::stats::AccountStats;
use crate::interfaces::view_models::{AccountView, DashboardViewModel};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::collections::BTreeMap;

/// Width of one account table including borders.
const CARD_WIDTH: u16 = 44;

/// One bordered table per account, side by side.
pub fn render(f: &mut Frame, area: Rect, accounts: &BTreeMap<String, AccountStats>) {
    if accounts.is_empty() {
        let placeholder = Paragraph::new("waiting for account data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" accounts "));
        f.render_widget(placeholder, area);
        return;
    }

    let fit = (area.width / CARD_WIDTH).max(1) as usize;
    let shown = accounts.len().min(fit);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(CARD_WIDTH); shown])
        .split(area);

    for (stats, column) in accounts.values().zip(columns.iter()) {
        render_account(f, *column, &DashboardViewModel::account(stats));
    }
}

fn render_account(f: &mut Frame, area: Rect, view: &AccountView) {
    let rows: Vec<Row> = view
        .rows
        .iter()
        .map(|(label, value)| {
            let mut style = Style::default();
            if view.theta_inverted && label.ends_with("theta") {
                style = style.fg(Color::Yellow);
            }
            Row::new(vec![
                Cell::from(*label).style(Style::default().fg(Color::DarkGray)),
                Cell::from(value.as_str()).style(style),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(format!(" {} ", view.title)))
        .title_bottom(Line::from(format!(" {} ", view.subtitle)).right_aligned());

    let table = Table::new(rows, [Constraint::Length(20), Constraint::Min(10)]).block(block);
    f.render_widget(table, area);
}
