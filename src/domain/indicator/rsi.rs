//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 * avg_gain / (avg_gain + avg_loss)
//! If avg_gain + avg_loss == 0 (a flat stretch): RSI = 0
//!
//! Warmup: first n values are undefined (need n price changes).

use crate::domain::indicator::IndicatorValue;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(close: &[f64], period: usize) -> Vec<Option<IndicatorValue>> {
    let mut values = vec![None; close.len()];
    if period == 0 || close.len() <= period {
        return values;
    }

    let changes: Vec<f64> = close.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| if c > 0.0 { c } else { 0.0 };
    let loss = |c: f64| if c < 0.0 { -c } else { 0.0 };

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;
    values[period] = Some(IndicatorValue::Simple(rsi_from(avg_gain, avg_loss)));

    for i in (period + 1)..close.len() {
        let change = changes[i - 1];
        avg_gain = (avg_gain * (period - 1) as f64 + gain(change)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(change)) / period as f64;
        values[i] = Some(IndicatorValue::Simple(rsi_from(avg_gain, avg_loss)));
    }

    values
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        0.0
    } else {
        100.0 * avg_gain / total
    }
}
