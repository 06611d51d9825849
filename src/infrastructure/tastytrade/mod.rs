mod accounts;
mod client;
mod types;

pub use accounts::TastytradeAccountService;
pub use client::TastytradeClient;
