//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::{CsvAdapter, CsvTableWriter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{SECTION, validate_pipeline_config};
use crate::domain::error::PipelineError;
use crate::domain::pipeline::{Pipeline, PipelineConfig, PipelineOutput};
use crate::domain::series::DuplicatePolicy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::BarSource;
use crate::ports::table_port::TableSink;

#[derive(Parser, Debug)]
#[command(name = "seqprep", about = "Windowed OHLCV dataset preparation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the preprocessing pipeline over a bar file
    Prepare {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        window_size: Option<usize>,
        #[arg(long)]
        normalize: bool,
        /// Keep rows with undefined values instead of dropping them
        #[arg(long)]
        keep_na: bool,
        #[arg(long)]
        timestamp_column: Option<String>,
        /// Write the processed table to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the feature schema and per-column warm-up
    Features,
    /// Validate a pipeline configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub window_size: Option<usize>,
    pub normalize: bool,
    pub keep_na: bool,
    pub timestamp_column: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Prepare {
            input,
            config,
            window_size,
            normalize,
            keep_na,
            timestamp_column,
            output,
        } => {
            let overrides = Overrides {
                window_size,
                normalize,
                keep_na,
                timestamp_column,
            };
            run_prepare(&input, config.as_deref(), &overrides, output.as_deref())
        }
        Command::Features => run_features(),
        Command::Validate { config } => run_validate(&config),
    }
}

fn report(err: PipelineError) -> ExitCode {
    error!("{err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PipelineError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_pipeline_config(&adapter)?;
    Ok(adapter)
}

fn config_int(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, PipelineError> {
    let value = adapter.get_int(SECTION, key, default as i64);
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| PipelineError::ConfigInvalid {
            section: SECTION.into(),
            key: key.into(),
            reason: format!("{value} is not a positive integer"),
        })
}

pub fn build_pipeline_config(adapter: &dyn ConfigPort) -> Result<PipelineConfig, PipelineError> {
    let defaults = PipelineConfig::default();

    let duplicates = match adapter.get_string(SECTION, "duplicates") {
        Some(raw) => raw
            .parse::<DuplicatePolicy>()
            .map_err(|reason| PipelineError::ConfigInvalid {
                section: SECTION.into(),
                key: "duplicates".into(),
                reason,
            })?,
        None => defaults.duplicates,
    };

    Ok(PipelineConfig {
        window_size: config_int(adapter, "window_size", defaults.window_size)?,
        normalize: adapter.get_bool(SECTION, "normalize", defaults.normalize),
        dropna: adapter.get_bool(SECTION, "dropna", defaults.dropna),
        ewma_span: config_int(adapter, "ewma_span", defaults.ewma_span)?,
        timestamp_column: adapter
            .get_string(SECTION, "timestamp_column")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.timestamp_column),
        duplicates,
    })
}

pub fn apply_overrides(
    mut config: PipelineConfig,
    overrides: &Overrides,
) -> Result<PipelineConfig, PipelineError> {
    if let Some(window_size) = overrides.window_size {
        if window_size == 0 {
            return Err(PipelineError::ConfigInvalid {
                section: "cli".into(),
                key: "window-size".into(),
                reason: "window size must be positive".into(),
            });
        }
        config.window_size = window_size;
    }
    if overrides.normalize {
        config.normalize = true;
    }
    if overrides.keep_na {
        config.dropna = false;
    }
    if let Some(column) = &overrides.timestamp_column {
        config.timestamp_column = column.clone();
    }
    Ok(config)
}

/// Load, transform and optionally persist one bar file.
pub fn prepare(
    input: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
    output: Option<&Path>,
) -> Result<PipelineOutput, PipelineError> {
    let config = match config_path {
        Some(path) => build_pipeline_config(&load_config(path)?)?,
        None => PipelineConfig::default(),
    };
    let config = apply_overrides(config, overrides)?;
    info!(
        window_size = config.window_size,
        normalize = config.normalize,
        dropna = config.dropna,
        "pipeline configured"
    );

    let source = CsvAdapter::new(input.to_path_buf())
        .with_timestamp_column(&config.timestamp_column)
        .with_duplicates(config.duplicates);
    let table = source.load()?;

    let writer = CsvTableWriter::new().with_timestamp_column(&config.timestamp_column);
    let result = Pipeline::new(config).run(table)?;

    if let Some(path) = output {
        writer.write(&result.table, path)?;
    }
    Ok(result)
}

fn run_prepare(
    input: &Path,
    config_path: Option<&Path>,
    overrides: &Overrides,
    output: Option<&Path>,
) -> ExitCode {
    match prepare(input, config_path, overrides, output) {
        Ok(result) => {
            let (windows, window_size, features) = result.dataset.shape();
            println!("X: ({windows}, {window_size}, {features})");
            println!("y: ({})", result.dataset.y.len());
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

fn run_features() -> ExitCode {
    let pipeline = Pipeline::new(PipelineConfig::default());
    for (i, (name, warmup)) in pipeline.feature_warmups().iter().enumerate() {
        println!("{i:>2}  {name:<16} warm-up {warmup}");
    }
    println!(
        "rows trimmed from the head: {}, from the tail: 1",
        pipeline.warmup()
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path).and_then(|a| build_pipeline_config(&a)) {
        Ok(c) => c,
        Err(e) => return report(e),
    };

    println!("window_size      = {}", config.window_size);
    println!("normalize        = {}", config.normalize);
    println!("dropna           = {}", config.dropna);
    println!("ewma_span        = {}", config.ewma_span);
    println!("timestamp_column = {}", config.timestamp_column);
    println!("duplicates       = {}", config.duplicates);
    info!("pipeline configuration is valid");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn cli_parses_prepare() {
        let cli = Cli::try_parse_from([
            "seqprep",
            "prepare",
            "--input",
            "bars.csv",
            "-w",
            "20",
            "--normalize",
            "--keep-na",
            "-o",
            "out.csv",
        ])
        .unwrap();
        match cli.command {
            Command::Prepare {
                input,
                window_size,
                normalize,
                keep_na,
                output,
                config,
                ..
            } => {
                assert_eq!(input, PathBuf::from("bars.csv"));
                assert_eq!(window_size, Some(20));
                assert!(normalize);
                assert!(keep_na);
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(config.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_requires_input_for_prepare() {
        assert!(Cli::try_parse_from(["seqprep", "prepare"]).is_err());
    }

    #[test]
    fn build_config_defaults_when_section_absent() {
        let config = build_pipeline_config(&make_config("")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn build_config_reads_every_key() {
        let config = build_pipeline_config(&make_config(
            "[pipeline]\nwindow_size = 32\nnormalize = true\ndropna = false\newma_span = 5\ntimestamp_column = Date\nduplicates = keep_last\n",
        ))
        .unwrap();
        assert_eq!(config.window_size, 32);
        assert!(config.normalize);
        assert!(!config.dropna);
        assert_eq!(config.ewma_span, 5);
        assert_eq!(config.timestamp_column, "Date");
        assert_eq!(config.duplicates, DuplicatePolicy::KeepLast);
    }

    #[test]
    fn build_config_rejects_zero_window() {
        let err = build_pipeline_config(&make_config("[pipeline]\nwindow_size = 0\n")).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigInvalid { key, .. } if key == "window_size"));
    }

    #[test]
    fn overrides_take_precedence() {
        let base = PipelineConfig {
            window_size: 5,
            ..PipelineConfig::default()
        };
        let overrides = Overrides {
            window_size: Some(12),
            normalize: true,
            keep_na: true,
            timestamp_column: Some("Date".into()),
        };
        let config = apply_overrides(base, &overrides).unwrap();
        assert_eq!(config.window_size, 12);
        assert!(config.normalize);
        assert!(!config.dropna);
        assert_eq!(config.timestamp_column, "Date");
    }

    #[test]
    fn absent_overrides_keep_file_values() {
        let base = PipelineConfig {
            window_size: 7,
            normalize: true,
            ..PipelineConfig::default()
        };
        let config = apply_overrides(base.clone(), &Overrides::default()).unwrap();
        assert_eq!(config, base);
    }

    #[test]
    fn zero_window_override_rejected() {
        let overrides = Overrides {
            window_size: Some(0),
            ..Overrides::default()
        };
        assert!(apply_overrides(PipelineConfig::default(), &overrides).is_err());
    }
}
