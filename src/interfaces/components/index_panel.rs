use super::tone_color;
use crate::domain::stats::IndexStats;
use crate::interfaces::view_models::{DashboardViewModel, HorizonView};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Sparkline, Table},
};

/// Three rows (24d, 5d, 1d), each a stats table beside a sparkline.
pub fn render(f: &mut Frame, area: Rect, index: Option<&IndexStats>) {
    let Some(index) = index else {
        let placeholder = Paragraph::new("waiting for index data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" index "));
        f.render_widget(placeholder, area);
        return;
    };

    let views = DashboardViewModel::horizons(index);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, views.len() as u32); views.len()])
        .split(area);

    for (view, row) in views.iter().zip(rows.iter()) {
        render_horizon(f, *row, view);
    }
}

fn render_horizon(f: &mut Frame, area: Rect, view: &HorizonView) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(10)])
        .split(area);

    let color = tone_color(view.tone);
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", view.title),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{} ", view.change), Style::default().fg(color)),
    ]);

    // Cells come in label/value pairs, laid out two pairs per row
    let rows: Vec<Row> = view
        .cells
        .chunks(2)
        .map(|pair| {
            let mut cells = Vec::with_capacity(4);
            for (label, value) in pair {
                cells.push(Cell::from(label.as_str()).style(Style::default().fg(Color::DarkGray)));
                cells.push(Cell::from(value.as_str()));
            }
            Row::new(cells)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Length(8),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, columns[0]);

    let chart_block = Block::default().borders(Borders::ALL);
    let width = chart_block.inner(columns[1]).width as usize;
    let data = DashboardViewModel::sparkline(&view.closes, width);
    let sparkline = Sparkline::default()
        .block(chart_block)
        .data(&data)
        .style(Style::default().fg(color));
    f.render_widget(sparkline, columns[1]);
}
