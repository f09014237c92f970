//! anomaly-scan
//!
//! Scans a CSV file for missing values, statistical outliers and format
//! violations, and prints the report.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use anomaly_guard::config::ScanConfig;
use anomaly_guard::core::{AnomalyPipeline, AnomalyReport};
use anomaly_guard::detectors::AnomalyRecord;
use anomaly_guard::error::{GuardError, LoadError};
use anomaly_guard::explain::ExplanationRequest;
use anomaly_guard::formatters::{
    FormatterConfig, HumanFormatter, JsonFormatter, MarkdownFormatter, ReportFormatter,
};
use anomaly_guard::logging::setup::{init_logging, LoggingConfig};
use anomaly_guard::sources::CsvSource;

const EXIT_FAILURE: i32 = 1;
const EXIT_INPUT_ERROR: i32 = 2;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV file to scan
    path: PathBuf,

    /// JSON scan configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Outlier percentile threshold (overrides the config file)
    #[arg(long)]
    percentile: Option<f64>,

    /// Seed for the outlier model (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the explanation prompt for record number N (as numbered in the
    /// human and Markdown reports, starting at 1) instead of the report
    #[arg(long, value_name = "N")]
    explain: Option<usize>,

    /// Rows of data to include in the explanation prompt
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colours in human output
    #[arg(long)]
    no_color: bool,
}

fn load_config(args: &Args) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };
    if let Some(percentile) = args.percentile {
        config = config.with_percentile(percentile);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    Ok(config)
}

fn run(args: &Args, config: &ScanConfig) -> Result<()> {
    let pipeline = AnomalyPipeline::from_config(config)?;
    let source = CsvSource::with_options(&args.path, config.loader.csv_options()?);
    let dataset = source.load()?;
    let report = pipeline.run(&dataset);

    if let Some(number) = args.explain {
        let record = select_record(&report, number)?;
        let request = ExplanationRequest::for_record(&dataset, record, args.preview_rows)?;
        print!("{}", request.render_prompt());
        return Ok(());
    }

    let formatter_config = FormatterConfig::default().with_colors(!args.no_color);
    let output = match args.format {
        OutputFormat::Human => HumanFormatter::with_config(formatter_config).format(&report)?,
        OutputFormat::Json => JsonFormatter::with_config(formatter_config).format(&report)?,
        OutputFormat::Markdown => {
            MarkdownFormatter::with_config(formatter_config).format(&report)?
        }
    };
    println!("{output}");
    Ok(())
}

fn main() {
    let args = Args::parse();

    let logging = LoggingConfig::from_verbosity(args.verbose).with_json_format(args.json_logs);
    if let Err(e) = init_logging(logging) {
        eprintln!("warning: could not initialise logging: {e}");
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(EXIT_INPUT_ERROR);
        }
    };

    if let Err(e) = run(&args, &config) {
        eprintln!("error: {e:#}");
        process::exit(exit_code(&e));
    }
}

/// Looks up a record by its 1-based display number.
fn select_record(report: &AnomalyReport, number: usize) -> Result<&AnomalyRecord> {
    number
        .checked_sub(1)
        .and_then(|index| report.get(index))
        .with_context(|| {
            format!(
                "no anomaly #{number}; the report has {} records numbered from 1",
                report.len()
            )
        })
}

/// Input problems (unreadable data or configuration) exit with 2, anything else with 1.
fn exit_code(error: &anyhow::Error) -> i32 {
    if error.downcast_ref::<LoadError>().is_some() {
        return EXIT_INPUT_ERROR;
    }
    match error.downcast_ref::<GuardError>() {
        Some(GuardError::Load(_) | GuardError::Configuration(_)) => EXIT_INPUT_ERROR,
        _ => EXIT_FAILURE,
    }
}
