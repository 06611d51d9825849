use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

pub fn render<'a>(f: &mut Frame, area: Rect, lines: impl Iterator<Item = &'a str>) {
    let text: Vec<Line> = lines.map(|l| Line::from(l.to_string())).collect();
    let log = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP).title(" log "));
    f.render_widget(log, area);
}
