//! Return Transformer: close-to-close log return and its EWMA.
//!
//! LogReturn[i] = ln(C[i]) - ln(C[i-1]), undefined at i = 0.
//! EWMA[i] = α·LogReturn[i] + (1-α)·EWMA[i-1], α = 2/(span+1), seeded with the
//! first defined return (no bias correction).

use tracing::debug;

use crate::domain::error::PipelineError;
use crate::domain::ohlcv::CLOSE;
use crate::domain::series::SeriesTable;

pub const LOG_RETURN: &str = "LogReturn";
pub const EWMA_LOG_RETURN: &str = "EWMA_LogReturn";
pub const DEFAULT_EWMA_SPAN: usize = 10;

/// Rows before the first defined log return.
pub const LOG_RETURN_WARMUP: usize = 1;

/// Log returns of `closes`. Fails on the first non-positive price.
pub fn log_returns(closes: &[f64]) -> Result<Vec<Option<f64>>, PipelineError> {
    let mut logs = Vec::with_capacity(closes.len());
    for (row, &close) in closes.iter().enumerate() {
        if close.is_nan() || close <= 0.0 {
            return Err(PipelineError::Domain {
                column: CLOSE.to_string(),
                row,
                value: close,
            });
        }
        logs.push(close.ln());
    }

    if logs.is_empty() {
        return Ok(Vec::new());
    }
    let values = std::iter::once(None)
        .chain(logs.windows(2).map(|w| Some(w[1] - w[0])))
        .collect();
    Ok(values)
}

/// Not-adjusted exponential moving average. Undefined inputs produce
/// undefined outputs and leave the running average untouched.
pub fn ewma(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut state: Option<f64> = None;

    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            let next = match state {
                None => x,
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
            };
            state = Some(next);
            Some(next)
        })
        .collect()
}

/// Add `LogReturn` and `EWMA_LogReturn` to the table.
pub fn apply_returns(table: &mut SeriesTable, span: usize) -> Result<(), PipelineError> {
    let returns = log_returns(&table.closes())?;
    let smoothed = ewma(&returns, span);
    debug!(rows = table.len(), span, "computed log returns");

    table.add_column(LOG_RETURN, returns)?;
    table.add_column(EWMA_LOG_RETURN, smoothed)?;
    Ok(())
}
