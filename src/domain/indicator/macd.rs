//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow), both starting at row max(fast, slow) - 1.
//! The fast EMA is seeded there with the SMA of the trailing `fast` closes.
//! Signal Line = EMA(signal) of MACD Line, seeded with the SMA of the first
//! `signal` defined MACD values
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: max(fast, slow) - 1 + signal - 1 values (33 for defaults)

use crate::domain::indicator::IndicatorValue;
use crate::domain::indicator::ema::calculate_ema_from;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    close: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<Option<IndicatorValue>> {
    let mut values = vec![None; close.len()];
    if fast == 0 || slow == 0 || signal_period == 0 {
        return values;
    }

    let macd_warmup = fast.max(slow) - 1;
    let ema_fast = calculate_ema_from(close, fast, macd_warmup);
    let ema_slow = calculate_ema_from(close, slow, macd_warmup);
    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_warmup = macd_warmup + signal_period - 1;
    if close.len() <= signal_warmup {
        return values;
    }

    let k = 2.0 / (signal_period as f64 + 1.0);
    let seed: f64 = macd_line[macd_warmup..=signal_warmup]
        .iter()
        .flatten()
        .sum::<f64>()
        / signal_period as f64;

    let mut signal = seed;
    for i in signal_warmup..close.len() {
        let Some(line) = macd_line[i] else { continue };
        if i > signal_warmup {
            signal = line * k + signal * (1.0 - k);
        }
        values[i] = Some(IndicatorValue::Macd {
            line,
            signal,
            histogram: line - signal,
        });
    }

    values
}
