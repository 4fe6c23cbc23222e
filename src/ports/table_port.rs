//! Processed-table persistence port trait.

use std::path::Path;

use crate::domain::error::PipelineError;
use crate::domain::pipeline::ProcessedTable;

/// Port for writing the processed table after a pipeline run.
pub trait TableSink {
    fn write(&self, table: &ProcessedTable, output_path: &Path) -> Result<(), PipelineError>;
}
