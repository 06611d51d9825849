// Index market data domain
pub mod timeframe;
pub mod types;

pub use timeframe::Timeframe;
pub use types::{Bar, HistoryRequest, HistoryWindow, Horizon, Period, Quote, RawIndexSnapshot};
