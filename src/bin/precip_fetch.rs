use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Arc;

use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use herbarium_precip::app::App;
use herbarium_precip::config::{RunConfig, DEFAULT_LOG_FILE};
use herbarium_precip::error::PrecipError;
use herbarium_precip::open_meteo::OpenMeteoHttpClient;

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(precip) = report.downcast_ref::<PrecipError>() {
            return ExitCode::from(map_exit_code(precip));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PrecipError) -> u8 {
    match error {
        PrecipError::InputRead(_) => 2,
        PrecipError::ArchiveHttp(_)
        | PrecipError::ArchiveStatus { .. }
        | PrecipError::ArchiveDecode(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    init_logging().into_diagnostic()?;

    let config = RunConfig::default();
    info!(
        input = %config.input_csv,
        output = %config.output_csv,
        first_year = config.first_year,
        last_year = config.last_year,
        "starting precipitation batch"
    );

    let client = OpenMeteoHttpClient::new(config.retry).into_diagnostic()?;
    let app = App::new(config, client);
    let summary = app.run().into_diagnostic()?;

    println!(
        "done: {} records processed, {} skipped, {} rows appended ({} ranges failed, {} years resumed)",
        summary.records_processed,
        summary.records_skipped,
        summary.rows_appended,
        summary.ranges_failed,
        summary.years_resumed
    );
    Ok(())
}

/// Log lines go both to stdout and to an append-mode log file, so a run
/// leaves a durable trace of every query attempt, failure, and append.
fn init_logging() -> Result<(), PrecipError> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(DEFAULT_LOG_FILE)
        .map_err(|err| PrecipError::Filesystem(format!("open {DEFAULT_LOG_FILE}: {err}")))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stdout),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();
    Ok(())
}
