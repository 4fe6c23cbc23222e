//! Pipeline error types.

/// Top-level error type for seqprep.
///
/// Every stage fails fast: the first error aborts the run and is returned to
/// the caller unchanged. Row numbers are 1-based data rows for load errors and
/// 0-based table rows for everything after the Loader.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("required column '{column}' is missing")]
    Schema { column: String },

    #[error("parse error at row {row}, column '{column}': cannot parse '{value}': {reason}")]
    Parse {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("domain error at row {row}, column '{column}': value {value} is not strictly positive")]
    Domain {
        column: String,
        row: usize,
        value: f64,
    },

    #[error("feature '{feature}' has zero standard deviation and cannot be standardized")]
    DegenerateFeature { feature: String },

    #[error("duplicate timestamp {timestamp} at row {row}")]
    DuplicateTimestamp { row: usize, timestamp: String },

    #[error("column '{column}' has {actual} values, table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("indicator {indicator} violated its contract: {reason}")]
    Indicator { indicator: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PipelineError> for std::process::ExitCode {
    fn from(err: &PipelineError) -> Self {
        let code: u8 = match err {
            PipelineError::Io(_) | PipelineError::Csv { .. } => 1,
            PipelineError::ConfigParse { .. } | PipelineError::ConfigInvalid { .. } => 2,
            PipelineError::Schema { .. } | PipelineError::Parse { .. } => 3,
            PipelineError::Domain { .. }
            | PipelineError::DegenerateFeature { .. }
            | PipelineError::DuplicateTimestamp { .. } => 4,
            PipelineError::Indicator { .. } | PipelineError::ColumnLength { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
