//! Average Directional Index (ADX).
//!
//! ADX quantifies trend strength regardless of direction.
//!
//! 1. +DM, -DM and True Range for each bar-to-bar transition.
//! 2. Wilder's smoothing (period) of +DM, -DM and TR, seeded with their sums.
//! 3. +DI = smoothed(+DM) / smoothed(TR) * 100, -DI likewise.
//! 4. DX = |+DI - -DI| / (+DI + -DI) * 100
//! 5. ADX = SMA of the first `period` DX values, then Wilder's smoothing.
//!
//! Warmup: first (2 * period - 1) values are undefined.

use crate::domain::indicator::IndicatorValue;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_adx(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Vec<Option<IndicatorValue>> {
    let n = close.len().min(high.len()).min(low.len());
    let mut values = vec![None; close.len()];
    if period == 0 || n < 2 * period {
        return values;
    }
    let period_f = period as f64;

    // transition t covers bars (t, t + 1)
    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    let mut tr = Vec::with_capacity(n - 1);
    for i in 1..n {
        let up_move = high[i] - high[i - 1];
        let down_move = low[i - 1] - low[i];

        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
        tr.push(
            (high[i] - low[i])
                .max((high[i] - close[i - 1]).abs())
                .max((low[i] - close[i - 1]).abs()),
        );
    }

    let mut smooth_plus: f64 = plus_dm[..period].iter().sum();
    let mut smooth_minus: f64 = minus_dm[..period].iter().sum();
    let mut smooth_tr: f64 = tr[..period].iter().sum();

    // dx[j] belongs to bar period + j
    let mut dx = vec![compute_dx(smooth_plus, smooth_minus, smooth_tr)];
    for t in period..(n - 1) {
        smooth_plus = smooth_plus - smooth_plus / period_f + plus_dm[t];
        smooth_minus = smooth_minus - smooth_minus / period_f + minus_dm[t];
        smooth_tr = smooth_tr - smooth_tr / period_f + tr[t];
        dx.push(compute_dx(smooth_plus, smooth_minus, smooth_tr));
    }

    let mut adx = dx[..period].iter().sum::<f64>() / period_f;
    let first = 2 * period - 1;
    values[first] = Some(IndicatorValue::Simple(adx));
    for (j, &d) in dx.iter().enumerate().skip(period) {
        adx = (adx * (period_f - 1.0) + d) / period_f;
        values[period + j] = Some(IndicatorValue::Simple(adx));
    }

    values
}

/// DX from smoothed +DM, -DM and TR. A bar range of zero or no directional
/// movement yields 0.
fn compute_dx(smooth_plus_dm: f64, smooth_minus_dm: f64, smooth_tr: f64) -> f64 {
    if smooth_tr == 0.0 {
        return 0.0;
    }

    let plus_di = (smooth_plus_dm / smooth_tr) * 100.0;
    let minus_di = (smooth_minus_dm / smooth_tr) * 100.0;

    let di_sum = plus_di + minus_di;
    if di_sum == 0.0 {
        return 0.0;
    }

    ((plus_di - minus_di).abs() / di_sum) * 100.0
}
