//! Row Filter: drop every row with an undefined derived value.
//!
//! Run once, after every column-producing stage, so that warm-up heads and the
//! label's forward shift are trimmed together. Surviving rows keep their
//! original timestamps and gaps.

use tracing::info;

use crate::domain::series::SeriesTable;

/// Remove incomplete rows in place. Returns the number of rows dropped.
pub fn drop_undefined_rows(table: &mut SeriesTable) -> usize {
    let keep: Vec<bool> = (0..table.len()).map(|row| table.row_is_complete(row)).collect();
    let before = table.len();
    table.retain_rows(&keep);
    let dropped = before - table.len();

    info!(before, after = table.len(), dropped, "dropped rows with undefined values");
    dropped
}
