#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset};
use seqprep::domain::error::PipelineError;
pub use seqprep::domain::ohlcv::Bar;
use seqprep::domain::series::{DuplicatePolicy, SeriesTable};
use seqprep::ports::data_port::BarSource;
use std::io::Write;
use std::path::Path;

pub struct MockBarSource {
    pub bars: Vec<Bar>,
    pub duplicates: DuplicatePolicy,
    pub error: Option<String>,
}

impl MockBarSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            duplicates: DuplicatePolicy::Reject,
            error: None,
        }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl BarSource for MockBarSource {
    fn load(&self) -> Result<SeriesTable, PipelineError> {
        if let Some(reason) = &self.error {
            return Err(PipelineError::Csv {
                reason: reason.clone(),
            });
        }
        SeriesTable::from_bars(self.bars.clone(), self.duplicates)
    }
}

pub fn session_start() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-03-01T09:15:00+05:30").unwrap()
}

/// A bar at `session_start() + 15 * index` minutes.
pub fn make_bar(index: usize, close: f64) -> Bar {
    Bar {
        timestamp: session_start() + Duration::minutes(15 * index as i64),
        open: close - 0.25,
        high: close + 0.5,
        low: close - 0.75,
        close,
        volume: 1_000.0 + (index % 7) as f64 * 50.0,
    }
}

/// Oscillating, slowly trending closes: every feature varies.
pub fn wave_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.3).sin() * 4.0 + (t * 0.11).cos() * 2.0 + t * 0.05;
            let mut bar = make_bar(i, close);
            bar.high += (t * 0.7).cos().abs();
            bar.volume += (t * 1.3).sin() * 300.0;
            bar
        })
        .collect()
}

/// Flat bars (open = high = low = close) with a single +1% step at `jump`.
pub fn step_bars(n: usize, jump: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let price = if i < jump { 100.0 } else { 101.0 };
            Bar {
                open: price,
                high: price,
                low: price,
                ..make_bar(i, price)
            }
        })
        .collect()
}

pub fn table(bars: Vec<Bar>) -> SeriesTable {
    SeriesTable::from_bars(bars, DuplicatePolicy::Reject).unwrap()
}

/// Write bars as a yfinance-style CSV (includes an ignored `Adj Close`).
pub fn write_bars_csv(path: &Path, bars: &[Bar]) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "Datetime,Open,High,Low,Close,Adj Close,Volume").unwrap();
    for bar in bars {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S%:z"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.close,
            bar.volume
        )
        .unwrap();
    }
}
