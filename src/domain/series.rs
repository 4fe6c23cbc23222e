//! Series Table: time-ordered bars plus named derived columns.
//!
//! The table owns the raw bars and an ordered list of [`Column`]s, each aligned
//! 1:1 with the bar index. Transformer stages add columns; the Row Filter
//! removes rows from the bars and every column together.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::PipelineError;
use crate::domain::ohlcv::{Bar, RAW_COLUMNS};

/// A named numeric series aligned with the table's rows. `None` marks an
/// undefined value (warm-up head or forward-looking tail).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// What to do when two bars share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    /// Keep the bar that appeared last in the source.
    KeepLast,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(DuplicatePolicy::Reject),
            "keep_last" | "keep-last" => Ok(DuplicatePolicy::KeepLast),
            other => Err(format!(
                "unknown duplicate policy '{other}' (expected reject or keep_last)"
            )),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "reject"),
            DuplicatePolicy::KeepLast => write!(f, "keep_last"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesTable {
    bars: Vec<Bar>,
    columns: Vec<Column>,
}

impl SeriesTable {
    /// Build a table from bars in any order. Bars are stably sorted by
    /// timestamp; equal timestamps are resolved by `duplicates`.
    pub fn from_bars(
        mut bars: Vec<Bar>,
        duplicates: DuplicatePolicy,
    ) -> Result<Self, PipelineError> {
        bars.sort_by_key(|b| b.timestamp);

        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => match duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(PipelineError::DuplicateTimestamp {
                            row: deduped.len(),
                            timestamp: bar.timestamp.to_rfc3339(),
                        });
                    }
                    DuplicatePolicy::KeepLast => *prev = bar,
                },
                _ => deduped.push(bar),
            }
        }

        Ok(Self {
            bars: deduped,
            columns: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Add a derived column, replacing any existing column of the same name.
    pub fn add_column(
        &mut self,
        name: &str,
        values: Vec<Option<f64>>,
    ) -> Result<(), PipelineError> {
        if values.len() != self.bars.len() {
            return Err(PipelineError::ColumnLength {
                column: name.to_string(),
                expected: self.bars.len(),
                actual: values.len(),
            });
        }
        if RAW_COLUMNS.contains(&name) {
            return Err(PipelineError::Schema {
                column: format!("{name} (raw columns cannot be overwritten)"),
            });
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    pub fn derived(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of any column, raw or derived.
    pub fn values(&self, name: &str) -> Result<Vec<Option<f64>>, PipelineError> {
        if RAW_COLUMNS.contains(&name) {
            return Ok(self.bars.iter().map(|b| b.field(name)).collect());
        }
        self.derived(name)
            .map(|c| c.values.clone())
            .ok_or_else(|| PipelineError::Schema {
                column: name.to_string(),
            })
    }

    /// Whether every derived column is defined at `row`. Raw columns are
    /// always defined once loaded.
    pub fn row_is_complete(&self, row: usize) -> bool {
        self.columns
            .iter()
            .all(|c| c.values.get(row).is_some_and(|v| v.is_some()))
    }

    /// Keep only the rows where `keep[row]` is true, preserving order.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.bars.len());

        let mut idx = 0;
        self.bars.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
        for column in &mut self.columns {
            let mut idx = 0;
            column.values.retain(|_| {
                let k = keep[idx];
                idx += 1;
                k
            });
        }
    }
}
