//! OHLCV bar representation.

use chrono::{DateTime, FixedOffset};

/// Name of each raw price/volume column, in table order.
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

pub const RAW_COLUMNS: [&str; 5] = [OPEN, HIGH, LOW, CLOSE, VOLUME];

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Raw field by column name, `None` if `name` is not one of [`RAW_COLUMNS`].
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            OPEN => Some(self.open),
            HIGH => Some(self.high),
            LOW => Some(self.low),
            CLOSE => Some(self.close),
            VOLUME => Some(self.volume),
            _ => None,
        }
    }
}
