//! Labeler: binary direction of the next close.
//!
//! Target[i] = 1 if Close[i+1] > Close[i] else 0; the last row has no label.
//! The label is the supervised signal and never part of the feature set.

use crate::domain::error::PipelineError;
use crate::domain::series::SeriesTable;

pub const TARGET: &str = "Target";

/// Rows at the tail with no label.
pub const LABEL_HORIZON: usize = 1;

pub fn next_step_labels(closes: &[f64]) -> Vec<Option<u8>> {
    let mut labels: Vec<Option<u8>> = closes
        .windows(2)
        .map(|w| Some(u8::from(w[1] > w[0])))
        .collect();
    if !closes.is_empty() {
        labels.push(None);
    }
    labels
}

/// Add the `Target` column to the table.
pub fn apply_labels(table: &mut SeriesTable) -> Result<(), PipelineError> {
    let labels = next_step_labels(&table.closes())
        .into_iter()
        .map(|l| l.map(f64::from))
        .collect();
    table.add_column(TARGET, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn up_down_flat() {
        let labels = next_step_labels(&[100.0, 101.0, 100.5, 100.5, 100.6]);
        assert_eq!(labels, vec![Some(1), Some(0), Some(0), Some(1), None]);
    }

    #[test]
    fn single_row_has_no_label() {
        assert_eq!(next_step_labels(&[100.0]), vec![None]);
        assert!(next_step_labels(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn label_matches_next_close(closes in prop::collection::vec(1.0f64..1000.0, 1..200)) {
            let labels = next_step_labels(&closes);
            prop_assert_eq!(labels.len(), closes.len());
            prop_assert_eq!(labels[closes.len() - 1], None);
            for i in 0..closes.len() - 1 {
                let expected = if closes[i + 1] > closes[i] { 1 } else { 0 };
                prop_assert_eq!(labels[i], Some(expected));
            }
        }
    }
}
