//! Indicator Engine call-site.
//!
//! Feeds each indicator its input columns in the provider's expected order,
//! aligns the outputs back onto the table and tracks the largest warm-up.

use tracing::debug;

use crate::domain::error::PipelineError;
use crate::domain::indicator::{IndicatorProvider, IndicatorType};
use crate::domain::series::SeriesTable;

/// Compute every indicator in `indicators` and add its output columns to
/// `table`. Returns the maximum declared lookback across all of them.
pub fn apply_indicators(
    table: &mut SeriesTable,
    indicators: &[IndicatorType],
    provider: &dyn IndicatorProvider,
) -> Result<usize, PipelineError> {
    let mut max_lookback = 0;

    for indicator in indicators {
        let columns: Vec<Vec<f64>> = indicator
            .inputs()
            .iter()
            .map(|name| {
                table.values(name).map(|values| values.into_iter().flatten().collect())
            })
            .collect::<Result<_, _>>()?;
        let inputs: Vec<&[f64]> = columns.iter().map(|c| c.as_slice()).collect();

        let series = provider.compute(indicator, &inputs)?;
        if series.values.len() != table.len() {
            return Err(PipelineError::Indicator {
                indicator: indicator.to_string(),
                reason: format!(
                    "returned {} values for {} rows",
                    series.values.len(),
                    table.len()
                ),
            });
        }

        for (name, values) in series.into_columns()? {
            table.add_column(name, values)?;
        }

        debug!(indicator = %indicator, lookback = indicator.lookback(), "indicator applied");
        max_lookback = max_lookback.max(indicator.lookback());
    }

    Ok(max_lookback)
}
