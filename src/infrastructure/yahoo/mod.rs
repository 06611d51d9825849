mod market_data;
mod types;

pub use market_data::YahooMarketDataService;
