pub mod types;

pub use types::{AccountRecord, Balance, BrokerageResponse, is_excluded_account};
