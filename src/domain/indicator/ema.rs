//! Exponential Moving Average, the building block for MACD.
//!
//! k = 2/(n+1), seed with an SMA, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).
//! With `start = n - 1` this is the plain EMA; MACD starts both of its
//! averages at the slow period's seed row.

/// EMA whose first value sits at `start`, seeded with the SMA of the
/// `period` values ending there. Everything before `start` is undefined.
pub fn calculate_ema_from(values: &[f64], period: usize, start: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || start + 1 < period || start >= values.len() {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[start + 1 - period..=start].iter().sum::<f64>() / period as f64;
    out[start] = Some(ema);
    for (slot, &x) in out.iter_mut().zip(values).skip(start + 1) {
        ema = x * k + ema * (1.0 - k);
        *slot = Some(ema);
    }

    out
}
