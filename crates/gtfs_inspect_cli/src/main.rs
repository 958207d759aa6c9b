use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use gtfs_inspect_core::engine::validate_input_with;
use gtfs_inspect_core::notice::DEFAULT_MAX_NOTICES_PER_CODE;
use gtfs_inspect_core::progress::ProgressHandler;
use gtfs_inspect_core::{
    default_runner, set_validation_country_code, set_validation_date, CancelFlag, GtfsInput,
};
use gtfs_inspect_report::{write_html_report, ReportSummary, ValidationReport};

#[derive(Debug, Parser)]
#[command(name = "gtfs-inspect")]
#[command(about = "Validates a GTFS Schedule feed and writes a notice report")]
struct Args {
    /// Feed to validate: a directory of .txt files or a .zip archive.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Directory the reports are written into.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    #[arg(short = 'c', long = "country_code", alias = "country-code")]
    country_code: Option<String>,

    /// Date used by calendar-coverage rules, YYYYMMDD or YYYY-MM-DD.
    #[arg(short = 'd', long = "date", alias = "date-for-validation")]
    date_for_validation: Option<String>,

    #[arg(
        short = 'v',
        long = "validation_report_name",
        alias = "validation-report-name",
        default_value = "report.json"
    )]
    validation_report_name: String,

    #[arg(
        short = 'r',
        long = "html_report_name",
        alias = "html-report-name",
        default_value = "report.html"
    )]
    html_report_name: String,

    #[arg(
        short = 'e',
        long = "system_errors_report_name",
        alias = "system-errors-report-name",
        default_value = "system_errors.json"
    )]
    system_errors_report_name: String,

    #[arg(short = 'p', long = "pretty")]
    pretty: bool,

    /// Worker threads; defaults to the number of logical CPUs.
    #[arg(long = "threads")]
    threads: Option<usize>,

    /// Comma-separated validator names to disable.
    #[arg(long = "skip_validators", alias = "skip-validators", value_delimiter = ',')]
    skip_validators: Vec<String>,

    /// Retained samples per notice code; totals stay exact beyond it.
    #[arg(long = "max_notices_per_type", alias = "max-notices-per-type")]
    max_notices_per_type: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();

    if let Some(threads) = args.threads {
        if threads == 0 {
            bail!("--threads must be positive");
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configure worker pool")?;
    }

    let _date_guard = match args.date_for_validation.as_deref() {
        Some(value) => Some(set_validation_date(Some(parse_validation_date(value)?))),
        None => None,
    };
    let _country_guard = match args.country_code.as_deref() {
        Some(value) if !value.trim().is_empty() => {
            Some(set_validation_country_code(Some(value.trim().to_string())))
        }
        _ => None,
    };

    let input = GtfsInput::from_path(&args.input);
    let input = match input {
        Ok(input) => input,
        Err(error) => {
            eprintln!("cannot open feed: {error}");
            std::process::exit(2);
        }
    };
    info!("validating {}", input.path().display());

    let mut runner = default_runner();
    if !args.skip_validators.is_empty() {
        runner.set_skipped(args.skip_validators.iter().map(|name| name.trim().to_string()));
    }

    let progress = Arc::new(IndicatifHandler::new());
    let started_at = Instant::now();
    let outcome = validate_input_with(
        &input,
        &runner,
        args.max_notices_per_type
            .unwrap_or(DEFAULT_MAX_NOTICES_PER_CODE),
        &CancelFlag::new(),
        Some(progress.as_ref() as &dyn ProgressHandler),
    );
    progress.finish();
    info!(
        "validation finished in {:.2}s with {} notices",
        started_at.elapsed().as_secs_f64(),
        outcome.notices.len()
    );

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("create output dir {}", args.output.display()))?;

    let mut summary = ReportSummary::new(env!("CARGO_PKG_VERSION"))
        .with_gtfs_input(input.path().display().to_string());
    if let Some(country_code) = args.country_code.as_deref() {
        summary = summary.with_country_code(country_code);
    }
    if let Some(date) = args.date_for_validation.as_deref() {
        summary = summary.with_date_for_validation(date);
    }
    if let Some(threads) = args.threads {
        summary = summary.with_threads(threads);
    }
    let summary = summary.with_outcome(&outcome);

    let report = ValidationReport::from_outcome(&outcome, summary);
    report.write_json(args.output.join(&args.validation_report_name), args.pretty)?;
    write_html_report(args.output.join(&args.html_report_name), &report)?;

    let system_errors = ValidationReport::from_container(
        &outcome.system_errors,
        ReportSummary::new(env!("CARGO_PKG_VERSION")),
    );
    system_errors.write_json(
        args.output.join(&args.system_errors_report_name),
        args.pretty,
    )?;

    std::process::exit(outcome.exit_code());
}

fn parse_validation_date(value: &str) -> anyhow::Result<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("--date cannot be empty");
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
        .with_context(|| format!("invalid --date {}", value))
}

struct IndicatifHandler {
    _multi: MultiProgress,
    loading_bar: ProgressBar,
    validation_bar: ProgressBar,
}

impl IndicatifHandler {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let loading_bar = multi.add(ProgressBar::new(0));
        loading_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {percent}% {msg}",
            )
            .expect("static template")
            .progress_chars("#>-"),
        );
        loading_bar.set_message("Waiting to load files...");

        let validation_bar = multi.add(ProgressBar::new(0));
        validation_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.magenta/magenta} {percent}% {msg}",
            )
            .expect("static template")
            .progress_chars("#>-"),
        );
        validation_bar.set_message("Waiting to validate...");

        Self {
            _multi: multi,
            loading_bar,
            validation_bar,
        }
    }

    fn finish(&self) {
        self.loading_bar.finish_and_clear();
        self.validation_bar.finish_and_clear();
    }
}

impl ProgressHandler for IndicatifHandler {
    fn set_total_files(&self, count: usize) {
        self.loading_bar.set_length(count as u64);
        self.loading_bar.set_message("Loading files...");
    }

    fn on_start_file_load(&self, file: &str) {
        self.loading_bar.set_message(format!("Loading {}", file));
    }

    fn on_finish_file_load(&self, _file: &str) {
        self.loading_bar.inc(1);
    }

    fn set_total_validators(&self, count: usize) {
        self.validation_bar.set_length(count as u64);
        self.validation_bar.set_message("Validating...");
    }

    fn on_start_validator(&self, validator_name: &str) {
        self.validation_bar
            .set_message(format!("Running {}", validator_name));
    }

    fn on_finish_validator(&self, _validator_name: &str) {
        self.validation_bar.inc(1);
    }
}
