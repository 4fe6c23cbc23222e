//! CSV adapters: the bar Loader and the processed-table writer.

use crate::domain::error::PipelineError;
use crate::domain::label::TARGET;
use crate::domain::ohlcv::{Bar, RAW_COLUMNS};
use crate::domain::pipeline::{DEFAULT_TIMESTAMP_COLUMN, ProcessedTable};
use crate::domain::series::{DuplicatePolicy, SeriesTable};
use crate::ports::data_port::BarSource;
use crate::ports::table_port::TableSink;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Cell spellings read as a missing value, matched after trimming.
const NA_VALUES: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Parse a timestamp cell. Offsets are kept; naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    if let Some(ts) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(ts);
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
}

/// `Ok(None)` for a missing cell: empty, one of `NA_VALUES`, or anything
/// that parses to NaN.
fn parse_value(raw: &str, row: usize, column: &str) -> Result<Option<f64>, PipelineError> {
    let s = raw.trim();
    if s.is_empty() || NA_VALUES.contains(&s) {
        return Ok(None);
    }
    let value: f64 = s.parse().map_err(|e: std::num::ParseFloatError| PipelineError::Parse {
        row,
        column: column.to_string(),
        value: s.to_string(),
        reason: e.to_string(),
    })?;
    if value.is_nan() {
        return Ok(None);
    }
    if value.is_infinite() {
        return Err(PipelineError::Parse {
            row,
            column: column.to_string(),
            value: s.to_string(),
            reason: "value is not finite".to_string(),
        });
    }
    Ok(Some(value))
}

fn csv_error(e: csv::Error) -> PipelineError {
    PipelineError::Csv {
        reason: e.to_string(),
    }
}

/// Positions of the timestamp column and the five core columns.
struct HeaderIndex {
    timestamp: usize,
    core: [usize; 5],
}

impl HeaderIndex {
    fn resolve(headers: &StringRecord, timestamp_column: &str) -> Result<Self, PipelineError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PipelineError::Schema {
                    column: name.to_string(),
                })
        };
        let timestamp = find(timestamp_column)?;
        let mut core = [0; 5];
        for (slot, name) in core.iter_mut().zip(RAW_COLUMNS) {
            *slot = find(name)?;
        }
        Ok(Self { timestamp, core })
    }
}

/// Loader over a delimited text file with a header row.
///
/// Extra columns are ignored. Rows missing any core value are dropped.
pub struct CsvAdapter {
    path: PathBuf,
    timestamp_column: String,
    duplicates: DuplicatePolicy,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            duplicates: DuplicatePolicy::default(),
        }
    }

    pub fn with_timestamp_column(mut self, name: &str) -> Self {
        self.timestamp_column = name.to_string();
        self
    }

    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Read bars from any CSV stream. Row numbers in errors are 1-based data
    /// rows (the header is not counted).
    pub fn read_from<R: Read>(&self, reader: R) -> Result<SeriesTable, PipelineError> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = rdr.headers().map_err(csv_error)?.clone();
        let index = HeaderIndex::resolve(&headers, &self.timestamp_column)?;

        let mut bars = Vec::new();
        let mut incomplete = 0usize;

        for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(csv_error)?;

            let raw_ts = record.get(index.timestamp).unwrap_or("");
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| PipelineError::Parse {
                row,
                column: self.timestamp_column.clone(),
                value: raw_ts.to_string(),
                reason: "unrecognised timestamp format".to_string(),
            })?;

            let mut values = [0.0; 5];
            let mut complete = true;
            for ((slot, &col), name) in values.iter_mut().zip(&index.core).zip(RAW_COLUMNS) {
                match parse_value(record.get(col).unwrap_or(""), row, name)? {
                    Some(v) => *slot = v,
                    None => complete = false,
                }
            }
            if !complete {
                debug!(row, "row missing a core value");
                incomplete += 1;
                continue;
            }

            let [open, high, low, close, volume] = values;
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if incomplete > 0 {
            warn!(rows = incomplete, "dropped rows with missing core values");
        }

        let table = SeriesTable::from_bars(bars, self.duplicates)?;
        info!(
            rows = table.len(),
            first = ?table.bars().first().map(|b| b.timestamp),
            last = ?table.bars().last().map(|b| b.timestamp),
            "loaded bars"
        );
        Ok(table)
    }
}

impl BarSource for CsvAdapter {
    fn load(&self) -> Result<SeriesTable, PipelineError> {
        let file = File::open(&self.path)?;
        debug!(path = %self.path.display(), "reading bars");
        self.read_from(file)
    }
}

/// Writes the processed table with one row per retained bar: timestamp, every
/// feature in schema order, then the label. Undefined cells are left empty.
pub struct CsvTableWriter {
    timestamp_column: String,
}

impl CsvTableWriter {
    pub fn new() -> Self {
        Self {
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
        }
    }

    pub fn with_timestamp_column(mut self, name: &str) -> Self {
        self.timestamp_column = name.to_string();
        self
    }
}

impl Default for CsvTableWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSink for CsvTableWriter {
    fn write(&self, table: &ProcessedTable, output_path: &Path) -> Result<(), PipelineError> {
        let mut wtr = csv::Writer::from_path(output_path).map_err(csv_error)?;

        let mut header = Vec::with_capacity(table.schema.len() + 2);
        header.push(self.timestamp_column.as_str());
        header.extend(table.schema.names().iter().map(String::as_str));
        header.push(TARGET);
        wtr.write_record(&header).map_err(csv_error)?;

        for (i, ts) in table.timestamps.iter().enumerate() {
            let mut record = Vec::with_capacity(header.len());
            record.push(ts.format(WRITE_FORMAT).to_string());
            record.extend(table.features.row(i).iter().map(|x| {
                if x.is_finite() {
                    x.to_string()
                } else {
                    String::new()
                }
            }));
            record.push(
                table
                    .labels
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|l| l.to_string())
                    .unwrap_or_default(),
            );
            wtr.write_record(&record).map_err(csv_error)?;
        }

        wtr.flush()?;
        info!(rows = table.len(), path = %output_path.display(), "wrote processed table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureSchema;
    use crate::domain::ohlcv::{CLOSE, HIGH, LOW, OPEN, VOLUME};
    use chrono::Timelike;
    use ndarray::array;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Datetime,Open,High,Low,Close,Adj Close,Volume";

    fn load_str(content: &str) -> Result<SeriesTable, PipelineError> {
        CsvAdapter::new(PathBuf::from("unused.csv")).read_from(content.as_bytes())
    }

    #[test]
    fn loads_and_sorts_ascending() {
        let content = format!(
            "{HEADER}\n\
             2024-03-01 09:45:00+05:30,102,103,101,102.5,102.5,900\n\
             2024-03-01 09:15:00+05:30,100,101,99,100.5,100.5,1000\n\
             2024-03-01 09:30:00+05:30,101,102,100,101.5,101.5,1100\n"
        );
        let table = load_str(&content).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.closes(), vec![100.5, 101.5, 102.5]);
        assert_eq!(table.bars()[0].timestamp.minute(), 15);
        assert_eq!(table.bars()[0].volume, 1000.0);
    }

    #[test]
    fn missing_core_column_is_schema_error() {
        let content = "Datetime,Open,High,Low,Close\n2024-03-01,1,1,1,1\n";
        let err = load_str(content).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { column } if column == "Volume"));
    }

    #[test]
    fn missing_timestamp_column_is_schema_error() {
        let content = "Date,Open,High,Low,Close,Volume\n2024-03-01,1,1,1,1,1\n";
        let err = load_str(content).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { column } if column == "Datetime"));
    }

    #[test]
    fn custom_timestamp_column() {
        let content = "Date,Open,High,Low,Close,Volume\n2024-03-01,1,2,0.5,1.5,10\n";
        let table = CsvAdapter::new(PathBuf::from("unused.csv"))
            .with_timestamp_column("Date")
            .read_from(content.as_bytes())
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.bars()[0].timestamp.hour(), 0);
    }

    #[test]
    fn unparseable_timestamp_reports_row() {
        let content = format!(
            "{HEADER}\n2024-03-01 09:15:00,1,1,1,1,1,1\nyesterday,1,1,1,1,1,1\n"
        );
        let err = load_str(&content).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Parse { row: 2, ref column, ref value, .. }
                if column == "Datetime" && value == "yesterday"
        ));
    }

    #[test]
    fn rows_with_missing_values_are_dropped() {
        let content = format!(
            "{HEADER}\n\
             2024-03-01 09:15:00,1,2,0.5,1.5,1.5,10\n\
             2024-03-01 09:30:00,1,2,0.5,,1.5,10\n\
             2024-03-01 09:45:00,1,2,0.5,1.6,1.6,NaN\n\
             2024-03-01 10:00:00,1,2,0.5,1.7,1.7,12\n"
        );
        let table = load_str(&content).unwrap();
        assert_eq!(table.closes(), vec![1.5, 1.7]);
    }

    #[test]
    fn na_spellings_count_as_missing() {
        let content = format!(
            "{HEADER}
             2024-03-01 09:15:00,1,2,0.5,1.5,1.5,10
             2024-03-01 09:30:00,NA,2,0.5,1.5,1.5,10
             2024-03-01 09:45:00,1,N/A,0.5,1.6,1.6,11
             2024-03-01 10:00:00,1,2,null,1.7,1.7,12
             2024-03-01 10:15:00,1,2,0.5,#N/A,1.7,12
             2024-03-01 10:30:00,1,2,0.5,1.8,1.8, <NA> 
             2024-03-01 10:45:00,1,2,0.5,1.9,1.9,13
"
        );
        let table = load_str(&content).unwrap();
        assert_eq!(table.closes(), vec![1.5, 1.9]);
    }

    #[test]
    fn na_lookalikes_are_parse_errors() {
        for cell in ["none", "Null", "missing"] {
            let content = format!("{HEADER}
2024-03-01 09:15:00,1,2,0.5,{cell},1.5,10
");
            let err = load_str(&content).unwrap_err();
            assert!(
                matches!(err, PipelineError::Parse { ref column, .. } if column == "Close"),
                "{cell} should not be read as missing"
            );
        }
    }

    #[test]
    fn non_numeric_core_cell_is_parse_error() {
        let content = format!("{HEADER}\n2024-03-01 09:15:00,1,2,abc,1.5,1.5,10\n");
        let err = load_str(&content).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { row: 1, column, .. } if column == "Low"));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let content = format!("{HEADER}\n2024-03-01 09:15:00,1,2,0.5,1.5,not-a-number,10\n");
        assert_eq!(load_str(&content).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_timestamps_follow_policy() {
        let content = format!(
            "{HEADER}\n\
             2024-03-01 09:15:00,1,2,0.5,1.5,1.5,10\n\
             2024-03-01 09:15:00,1,2,0.5,1.9,1.9,10\n"
        );
        assert!(matches!(
            load_str(&content),
            Err(PipelineError::DuplicateTimestamp { .. })
        ));

        let table = CsvAdapter::new(PathBuf::from("unused.csv"))
            .with_duplicates(DuplicatePolicy::KeepLast)
            .read_from(content.as_bytes())
            .unwrap();
        assert_eq!(table.closes(), vec![1.9]);
    }

    #[test]
    fn timestamp_formats() {
        let with_offset = parse_timestamp("2024-03-01 09:15:00+05:30").unwrap();
        assert_eq!(with_offset.offset().local_minus_utc(), 5 * 3600 + 30 * 60);

        let rfc = parse_timestamp("2024-03-01T03:45:00Z").unwrap();
        assert_eq!(rfc, with_offset);

        let naive = parse_timestamp("2024-03-01 03:45:00").unwrap();
        assert_eq!(naive, with_offset);

        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("01/03/2024").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/bars.csv"));
        assert!(matches!(adapter.load(), Err(PipelineError::Io(_))));
    }

    #[test]
    fn load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(
            &path,
            "Datetime,Open,High,Low,Close,Volume\n2024-03-01 09:15:00,1,2,0.5,1.5,10\n",
        )
        .unwrap();

        let table = CsvAdapter::new(path).load().unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn writer_emits_header_and_blank_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.csv");
        let table = ProcessedTable {
            timestamps: vec![
                parse_timestamp("2024-03-01 09:15:00+05:30").unwrap(),
                parse_timestamp("2024-03-01 09:30:00+05:30").unwrap(),
            ],
            schema: FeatureSchema::from_names(&["Close", "RSI"]).unwrap(),
            features: array![[100.5, f64::NAN], [101.25, 55.0]],
            labels: vec![Some(1), None],
        };

        CsvTableWriter::new().write(&table, &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();

        assert_eq!(lines[0], "Datetime,Close,RSI,Target");
        assert_eq!(lines[1], "2024-03-01 09:15:00+05:30,100.5,,1");
        assert_eq!(lines[2], "2024-03-01 09:30:00+05:30,101.25,55,");
    }

    #[test]
    fn written_table_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.csv");
        let schema =
            FeatureSchema::from_names(&["Open", "High", "Low", "Close", "Volume"]).unwrap();
        let table = ProcessedTable {
            timestamps: vec![parse_timestamp("2024-03-01T09:15:00+05:30").unwrap()],
            schema,
            features: array![[1.0, 2.0, 0.5, 1.5, 10.0]],
            labels: vec![Some(0)],
        };
        CsvTableWriter::new().write(&table, &path).unwrap();

        let loaded = CsvAdapter::new(path).load().unwrap();
        assert_eq!(loaded.bars()[0].timestamp, table.timestamps[0]);
        assert_eq!(loaded.bars()[0].field(CLOSE), Some(1.5));
        assert_eq!(loaded.bars()[0].field(OPEN), Some(1.0));
        assert_eq!(loaded.bars()[0].field(HIGH), Some(2.0));
        assert_eq!(loaded.bars()[0].field(LOW), Some(0.5));
        assert_eq!(loaded.bars()[0].field(VOLUME), Some(10.0));
    }
}
