//! Stage orchestration: Series Table in, `(X, y)` plus processed table out.
//!
//! Stages run strictly in order: returns → indicators → labels → row filter →
//! feature selection → optional standardization → windowing. Every stage is
//! a pure transformation of the table; nothing here touches the filesystem.

use chrono::{DateTime, FixedOffset};
use ndarray::Array2;
use tracing::{info, warn};

use crate::domain::error::PipelineError;
use crate::domain::features::{FeatureSchema, FeatureStats, select_features, standardize};
use crate::domain::indicator::{BuiltinIndicators, IndicatorProvider, IndicatorType};
use crate::domain::indicator_stage::apply_indicators;
use crate::domain::label::{LABEL_HORIZON, TARGET, apply_labels};
use crate::domain::returns::{
    DEFAULT_EWMA_SPAN, EWMA_LOG_RETURN, LOG_RETURN, LOG_RETURN_WARMUP, apply_returns,
};
use crate::domain::row_filter::drop_undefined_rows;
use crate::domain::series::{DuplicatePolicy, SeriesTable};
use crate::domain::window::Dataset;

pub const DEFAULT_WINDOW_SIZE: usize = 10;
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "Datetime";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub window_size: usize,
    pub normalize: bool,
    /// When false, undefined values stay in the processed table (as NaN in
    /// `X`) and handling them is the caller's job.
    pub dropna: bool,
    pub ewma_span: usize,
    pub timestamp_column: String,
    pub duplicates: DuplicatePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            normalize: false,
            dropna: true,
            ewma_span: DEFAULT_EWMA_SPAN,
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

/// The retained rows after all stages, in schema order plus the label.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedTable {
    pub timestamps: Vec<DateTime<FixedOffset>>,
    pub schema: FeatureSchema,
    pub features: Array2<f64>,
    pub labels: Vec<Option<u8>>,
}

impl ProcessedTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub dataset: Dataset,
    pub table: ProcessedTable,
    /// Present only when normalization ran.
    pub stats: Option<Vec<FeatureStats>>,
    /// Leading rows with at least one undefined feature, counted on the table
    /// the provider actually produced. Capped by the input length.
    pub warmup: usize,
}

pub struct Pipeline<P = BuiltinIndicators> {
    config: PipelineConfig,
    indicators: Vec<IndicatorType>,
    schema: FeatureSchema,
    provider: P,
}

impl Pipeline<BuiltinIndicators> {
    pub fn new(config: PipelineConfig) -> Self {
        let indicators = IndicatorType::default_set();
        Self {
            schema: FeatureSchema::for_indicators(&indicators),
            config,
            indicators,
            provider: BuiltinIndicators,
        }
    }
}

impl<P: IndicatorProvider> Pipeline<P> {
    /// Swap in another indicator implementation honoring the same contract.
    pub fn with_provider<Q: IndicatorProvider>(self, provider: Q) -> Pipeline<Q> {
        Pipeline {
            config: self.config,
            indicators: self.indicators,
            schema: self.schema,
            provider,
        }
    }

    /// Replace the indicator battery; the feature schema follows it.
    pub fn with_indicators(mut self, indicators: Vec<IndicatorType>) -> Self {
        self.schema = FeatureSchema::for_indicators(&indicators);
        self.indicators = indicators;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn indicators(&self) -> &[IndicatorType] {
        &self.indicators
    }

    /// Leading rows with at least one undefined feature.
    pub fn warmup(&self) -> usize {
        self.indicators
            .iter()
            .map(|i| i.lookback())
            .max()
            .unwrap_or(0)
            .max(LOG_RETURN_WARMUP)
    }

    /// Warm-up of every feature column in schema order.
    pub fn feature_warmups(&self) -> Vec<(String, usize)> {
        self.schema
            .names()
            .iter()
            .map(|name| {
                let warmup = if name == LOG_RETURN || name == EWMA_LOG_RETURN {
                    LOG_RETURN_WARMUP
                } else {
                    self.indicators
                        .iter()
                        .find(|i| i.output_names().iter().any(|n| *n == name.as_str()))
                        .map_or(0, |i| i.lookback())
                };
                (name.clone(), warmup)
            })
            .collect()
    }

    /// Smallest table that yields at least one window with `dropna` on.
    pub fn min_rows(&self) -> usize {
        self.warmup() + self.config.window_size + 1 + LABEL_HORIZON
    }

    pub fn run(&self, mut table: SeriesTable) -> Result<PipelineOutput, PipelineError> {
        let input_rows = table.len();
        if input_rows < self.min_rows() {
            warn!(
                rows = input_rows,
                needed = self.min_rows(),
                "input too short for a single window; dataset will be empty"
            );
        }

        apply_returns(&mut table, self.config.ewma_span)?;
        let lookback = apply_indicators(&mut table, &self.indicators, &self.provider)?;
        apply_labels(&mut table)?;

        let warmup = leading_undefined(&table, &self.schema)?;
        let declared = lookback.max(LOG_RETURN_WARMUP);
        if warmup > declared && warmup < table.len() {
            warn!(
                declared,
                observed = warmup,
                "indicator provider left more leading rows undefined than its lookback"
            );
        }

        if self.config.dropna {
            drop_undefined_rows(&mut table);
        }

        let mut features = select_features(&table, &self.schema)?;
        let labels: Vec<Option<u8>> = table
            .values(TARGET)?
            .into_iter()
            .map(|v| v.map(|x| x as u8))
            .collect();

        let stats = if self.config.normalize && !table.is_empty() {
            Some(standardize(&mut features, &self.schema)?)
        } else {
            if self.config.normalize {
                warn!("no rows left to normalize");
            }
            None
        };

        let dataset = Dataset::from_features(&features, &labels, self.config.window_size);
        let (windows, window_size, num_features) = dataset.shape();
        info!(
            input_rows,
            retained_rows = table.len(),
            windows,
            window_size,
            num_features,
            "dataset ready"
        );

        Ok(PipelineOutput {
            dataset,
            table: ProcessedTable {
                timestamps: table.bars().iter().map(|b| b.timestamp).collect(),
                schema: self.schema.clone(),
                features,
                labels,
            },
            stats,
            warmup,
        })
    }
}

fn leading_undefined(table: &SeriesTable, schema: &FeatureSchema) -> Result<usize, PipelineError> {
    let columns = schema
        .names()
        .iter()
        .map(|name| table.values(name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((0..table.len())
        .take_while(|&row| columns.iter().any(|c| c[row].is_none()))
        .count())
}
