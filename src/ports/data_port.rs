//! Bar source port trait.

use crate::domain::error::PipelineError;
use crate::domain::series::SeriesTable;

/// Supplies a Series Table: sorted ascending, duplicates resolved, every core
/// column defined on every row.
pub trait BarSource {
    fn load(&self) -> Result<SeriesTable, PipelineError>;
}
