//! Feature schema, selection and standardization.
//!
//! [`FeatureSchema`] is the single ordered list of model-visible columns. It is
//! derived from the indicator battery, so selection and windowing can never
//! disagree about column order. The label and the timestamp are never part of
//! it.

use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};
use tracing::debug;

use crate::domain::error::PipelineError;
use crate::domain::indicator::IndicatorType;
use crate::domain::label::TARGET;
use crate::domain::ohlcv::RAW_COLUMNS;
use crate::domain::returns::{EWMA_LOG_RETURN, LOG_RETURN};
use crate::domain::series::SeriesTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Raw OHLCV, the log-return family, then every indicator output in
    /// battery order.
    pub fn for_indicators(indicators: &[IndicatorType]) -> Self {
        let names = RAW_COLUMNS
            .iter()
            .copied()
            .chain([LOG_RETURN, EWMA_LOG_RETURN])
            .chain(indicators.iter().flat_map(|i| i.output_names().iter().copied()))
            .map(String::from)
            .collect();
        Self { names }
    }

    /// A custom ordered selection. The label column is rejected.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, PipelineError> {
        let names: Vec<String> = names.iter().map(|s| s.as_ref().to_string()).collect();
        if names.iter().any(|n| n == TARGET) {
            return Err(PipelineError::Schema {
                column: format!("{TARGET} (the label cannot be a feature)"),
            });
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::for_indicators(&IndicatorType::default_set())
    }
}

/// Per-feature statistics fitted by [`standardize`].
///
/// Not persisted by the pipeline. A consumer that trains on a split must fit
/// on the training rows only and reapply these at inference.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStats {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

/// Rows × features matrix in schema order. Undefined values become NaN.
pub fn select_features(
    table: &SeriesTable,
    schema: &FeatureSchema,
) -> Result<Array2<f64>, PipelineError> {
    let mut matrix = Array2::<f64>::from_elem((table.len(), schema.len()), f64::NAN);
    for (j, name) in schema.names().iter().enumerate() {
        let values = table.values(name)?;
        for (i, v) in values.into_iter().enumerate() {
            if let Some(x) = v {
                matrix[[i, j]] = x;
            }
        }
    }
    Ok(matrix)
}

/// Rescale every column to zero mean and unit (population) standard
/// deviation over all of its defined values. NaN cells are ignored when
/// fitting and stay NaN.
pub fn standardize(
    matrix: &mut Array2<f64>,
    schema: &FeatureSchema,
) -> Result<Vec<FeatureStats>, PipelineError> {
    let mut stats = Vec::with_capacity(schema.len());

    for (mut column, name) in matrix.axis_iter_mut(Axis(1)).zip(schema.names()) {
        let fitted = fit_column(column.view(), name)?;
        apply_column(&mut column, &fitted);
        debug!(feature = %name, mean = fitted.mean, std = fitted.std, "standardized");
        stats.push(fitted);
    }

    Ok(stats)
}

fn fit_column(column: ArrayView1<f64>, name: &str) -> Result<FeatureStats, PipelineError> {
    let defined: Vec<f64> = column.iter().copied().filter(|x| x.is_finite()).collect();
    let degenerate = || PipelineError::DegenerateFeature {
        feature: name.to_string(),
    };

    let first = *defined.first().ok_or_else(degenerate)?;
    if defined.iter().all(|&x| x == first) {
        return Err(degenerate());
    }

    let n = defined.len() as f64;
    let mean = defined.iter().sum::<f64>() / n;
    let variance = defined.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std == 0.0 {
        return Err(degenerate());
    }

    Ok(FeatureStats {
        name: name.to_string(),
        mean,
        std,
    })
}

fn apply_column(column: &mut ArrayViewMut1<f64>, stats: &FeatureStats) {
    column.mapv_inplace(|x| (x - stats.mean) / stats.std);
}
