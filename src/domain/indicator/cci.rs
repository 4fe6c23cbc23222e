//! CCI (Commodity Channel Index).
//!
//! TP = (H + L + C) / 3
//! CCI = (TP - SMA(TP, n)) / (0.015 × MeanDeviation(TP, n))
//! A zero mean deviation yields 0.
//!
//! Warmup: first (n-1) values are undefined.

use crate::domain::indicator::IndicatorValue;

pub const DEFAULT_PERIOD: usize = 14;

const LAMBERT: f64 = 0.015;

pub fn calculate_cci(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Vec<Option<IndicatorValue>> {
    if period == 0 {
        return vec![None; close.len()];
    }

    let typical: Vec<f64> = high
        .iter()
        .zip(low)
        .zip(close)
        .map(|((h, l), c)| (h + l + c) / 3.0)
        .collect();

    let mut values = vec![None; close.len()];
    for i in (period - 1)..typical.len() {
        let window = &typical[i + 1 - period..=i];
        let sma = window.iter().sum::<f64>() / period as f64;
        let mean_dev = window.iter().map(|tp| (tp - sma).abs()).sum::<f64>() / period as f64;

        let cci = if mean_dev == 0.0 {
            0.0
        } else {
            (typical[i] - sma) / (LAMBERT * mean_dev)
        };
        values[i] = Some(IndicatorValue::Simple(cci));
    }

    values
}
