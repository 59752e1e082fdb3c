// Main entry point for the churn pipeline

use churn_etl::args::{Cli, Commands};
use churn_etl::config::PipelineConfig;
use churn_etl::etl::{ChurnExporter, ChurnLoader};
use churn_etl::{EtlError, EtlResult};
use clap::Parser;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = PipelineConfig::load(&cli.config);
    let level = match &config {
        Ok(config) => config.logging.level.as_str(),
        Err(_) => "info",
    };
    init_tracing(level, cli.verbose);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if !cli.config.exists() && !matches!(cli.command, Commands::InitConfig { .. }) {
        warn!("Configuration file {} not found, using defaults", cli.config.display());
    }

    let start = Instant::now();
    let result = match cli.command {
        Commands::Load => run_load(&config),
        Commands::Export => run_export(&config),
        Commands::InitConfig { output } => PipelineConfig::default()
            .save_to_file(&output)
            .map(|()| info!("Created default configuration at: {}", output.display())),
    };

    match result {
        Ok(()) => {
            info!("Finished in {:.2}s", start.elapsed().as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

// RUST_LOG wins over --verbose, which wins over the configured level
fn init_tracing(level: &str, verbose: bool) {
    let fallback = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_load(config: &PipelineConfig) -> EtlResult<()> {
    let report = ChurnLoader::new(config)?.run()?;
    info!(
        rows_read = report.clean.initial_rows,
        rows_loaded = report.rows_written,
        coercion_anomalies = report.clean.coercion_anomalies,
        "Load complete"
    );
    Ok(())
}

fn run_export(config: &PipelineConfig) -> EtlResult<()> {
    let report = ChurnExporter::new(config)?.run()?;
    info!(
        rows = report.rows_exported,
        path = %report.output.display(),
        "Data successfully exported to CSV"
    );
    Ok(())
}

fn report_error(e: &EtlError) {
    match e {
        EtlError::SourceNotFound(path) => error!(
            "The file '{}' was not found. Check the source path in the configuration.",
            path.display()
        ),
        EtlError::Connection { path, .. } => {
            error!("Could not connect to the database. Make sure '{}' exists.", path.display());
            error!("Detailed error: {}", e);
        }
        other => error!("An error occurred: {}", other),
    }
}
