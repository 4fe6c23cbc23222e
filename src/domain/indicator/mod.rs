//! Technical indicator contract and built-in implementations.
//!
//! The pipeline treats indicator math as an injected capability:
//! - `IndicatorType`: indicator identity + parameters, input columns, output
//!   columns and warm-up (lookback) length
//! - `IndicatorProvider`: computes one indicator from its input columns
//! - `IndicatorSeries`: the provider's answer, one optional value per row
//! - `BuiltinIndicators`: the default provider, using the TA-Lib lookback
//!   conventions
//!
//! Only the contract is relied on downstream. Any provider whose output has
//! the declared arity and the table's length can be swapped in.

pub mod adx;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod macd;
pub mod rsi;

use std::fmt;

use crate::domain::error::PipelineError;
use crate::domain::ohlcv::{CLOSE, HIGH, LOW};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    /// Values kept as table columns, in `IndicatorType::output_names` order.
    /// The MACD histogram is discarded.
    pub fn components(&self) -> Vec<f64> {
        match *self {
            IndicatorValue::Simple(v) => vec![v],
            IndicatorValue::Macd { line, signal, .. } => vec![line, signal],
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => vec![upper, middle, lower],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Adx(usize),
    Cci(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// The indicator battery fed to the sequence model.
    pub fn default_set() -> Vec<IndicatorType> {
        vec![
            IndicatorType::Rsi(rsi::DEFAULT_PERIOD),
            IndicatorType::Macd {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            },
            IndicatorType::Adx(adx::DEFAULT_PERIOD),
            IndicatorType::Cci(cci::DEFAULT_PERIOD),
            IndicatorType::Bollinger {
                period: bollinger::DEFAULT_PERIOD,
                stddev_mult_x100: bollinger::DEFAULT_MULT_X100,
            },
        ]
    }

    /// Input columns, in the order the provider receives them.
    pub fn inputs(&self) -> &'static [&'static str] {
        match self {
            IndicatorType::Rsi(_)
            | IndicatorType::Macd { .. }
            | IndicatorType::Bollinger { .. } => &[CLOSE],
            IndicatorType::Adx(_) | IndicatorType::Cci(_) => &[HIGH, LOW, CLOSE],
        }
    }

    /// Output column names written onto the Series Table.
    pub fn output_names(&self) -> &'static [&'static str] {
        match self {
            IndicatorType::Rsi(_) => &["RSI"],
            IndicatorType::Macd { .. } => &["MACD", "MACD_signal"],
            IndicatorType::Adx(_) => &["ADX"],
            IndicatorType::Cci(_) => &["CCI"],
            IndicatorType::Bollinger { .. } => &["BB_upper", "BB_middle", "BB_lower"],
        }
    }

    /// Number of leading rows with no defined value.
    pub fn lookback(&self) -> usize {
        match *self {
            IndicatorType::Rsi(period) => period,
            IndicatorType::Macd { fast, slow, signal } => {
                fast.max(slow).saturating_sub(1) + signal.saturating_sub(1)
            }
            IndicatorType::Adx(period) => (2 * period).saturating_sub(1),
            IndicatorType::Cci(period) => period.saturating_sub(1),
            IndicatorType::Bollinger { period, .. } => period.saturating_sub(1),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Cci(period) => write!(f, "CCI({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// One indicator's output: a value per input row, `None` during warm-up.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<IndicatorValue>>,
}

impl IndicatorSeries {
    /// Split into one column per output name, checking the declared arity.
    pub fn into_columns(self) -> Result<Vec<(&'static str, Vec<Option<f64>>)>, PipelineError> {
        let names = self.indicator_type.output_names();
        let mut columns: Vec<Vec<Option<f64>>> =
            vec![Vec::with_capacity(self.values.len()); names.len()];

        for value in &self.values {
            match value {
                Some(v) => {
                    let parts = v.components();
                    if parts.len() != names.len() {
                        return Err(PipelineError::Indicator {
                            indicator: self.indicator_type.to_string(),
                            reason: format!(
                                "expected {} outputs, provider returned {}",
                                names.len(),
                                parts.len()
                            ),
                        });
                    }
                    for (column, part) in columns.iter_mut().zip(parts) {
                        column.push(Some(part).filter(|p| p.is_finite()));
                    }
                }
                None => columns.iter_mut().for_each(|c| c.push(None)),
            }
        }

        Ok(names.iter().copied().zip(columns).collect())
    }
}

/// Capability that computes indicator values from price columns.
pub trait IndicatorProvider {
    /// `inputs` holds the columns named by `indicator.inputs()`, in order,
    /// all of equal length. The returned series must have that same length.
    fn compute(
        &self,
        indicator: &IndicatorType,
        inputs: &[&[f64]],
    ) -> Result<IndicatorSeries, PipelineError>;
}

/// Default provider backed by this crate's indicator implementations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinIndicators;

impl IndicatorProvider for BuiltinIndicators {
    fn compute(
        &self,
        indicator: &IndicatorType,
        inputs: &[&[f64]],
    ) -> Result<IndicatorSeries, PipelineError> {
        let expected = indicator.inputs().len();
        if inputs.len() != expected {
            return Err(PipelineError::Indicator {
                indicator: indicator.to_string(),
                reason: format!("expected {} input columns, got {}", expected, inputs.len()),
            });
        }

        let values = match *indicator {
            IndicatorType::Rsi(period) => rsi::calculate_rsi(inputs[0], period),
            IndicatorType::Macd { fast, slow, signal } => {
                macd::calculate_macd(inputs[0], fast, slow, signal)
            }
            IndicatorType::Adx(period) => {
                adx::calculate_adx(inputs[0], inputs[1], inputs[2], period)
            }
            IndicatorType::Cci(period) => {
                cci::calculate_cci(inputs[0], inputs[1], inputs[2], period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => bollinger::calculate_bollinger(inputs[0], period, stddev_mult_x100),
        };

        Ok(IndicatorSeries {
            indicator_type: indicator.clone(),
            values,
        })
    }
}
