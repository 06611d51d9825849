pub mod account_panel;
pub mod index_panel;
pub mod log_panel;

use crate::interfaces::view_models::Tone;
use ratatui::style::Color;

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Up => Color::Green,
        Tone::Down => Color::Red,
        Tone::Flat => Color::White,
    }
}
