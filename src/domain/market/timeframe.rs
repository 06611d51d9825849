use crate::domain::errors::DashboardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar resolutions requested from the market series provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneMin,
    FiveMin,
    ThirtyMin,
    OneDay,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::OneMin => 1,
            Timeframe::FiveMin => 5,
            Timeframe::ThirtyMin => 30,
            Timeframe::OneDay => 1440,
        }
    }

    /// Converts to the Yahoo chart API interval string
    pub fn to_yahoo_string(&self) -> &'static str {
        match self {
            Timeframe::OneMin => "1m",
            Timeframe::FiveMin => "5m",
            Timeframe::ThirtyMin => "30m",
            Timeframe::OneDay => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_yahoo_string())
    }
}

impl FromStr for Timeframe {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" => Ok(Timeframe::OneMin),
            "5m" => Ok(Timeframe::FiveMin),
            "30m" => Ok(Timeframe::ThirtyMin),
            "1d" => Ok(Timeframe::OneDay),
            other => Err(DashboardError::parse(format!(
                "Invalid timeframe '{}'. Must be one of 1m, 5m, 30m, 1d",
                other
            ))),
        }
    }
}
