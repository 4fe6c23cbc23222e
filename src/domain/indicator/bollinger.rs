//! Bollinger Bands.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) values are undefined.

use crate::domain::indicator::IndicatorValue;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    close: &[f64],
    period: usize,
    stddev_mult_x100: u32,
) -> Vec<Option<IndicatorValue>> {
    if period == 0 {
        return vec![None; close.len()];
    }

    let warmup = period - 1;
    let mult = stddev_mult_x100 as f64 / 100.0;

    (0..close.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            let window = &close[i + 1 - period..=i];

            let middle: f64 = window.iter().sum::<f64>() / period as f64;
            let variance: f64 = window
                .iter()
                .map(|c| {
                    let diff = c - middle;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            let stddev = variance.sqrt();

            Some(IndicatorValue::Bollinger {
                upper: middle + mult * stddev,
                middle,
                lower: middle - mult * stddev,
            })
        })
        .collect()
}
