//! mssql-cosmos-migrate CLI - continuous MSSQL to Cosmos DB row migration.

use clap::{Parser, Subcommand};
use mssql_cosmos_migrate::{
    Config, CosmosSink, DocumentSink, MigrateError, MigrationDriver, MssqlSource, RowSource,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "mssql-cosmos-migrate")]
#[command(about = "Continuous MSSQL to Cosmos DB row migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the migration loop until a fatal error occurs
    Run,

    /// Test source and target connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run => {
            let source = MssqlSource::new(config.source.clone()).await?;
            let sink = CosmosSink::new(&config.target)?;
            let driver = MigrationDriver::new(source, sink, config.driver_settings());

            // Runs until a fatal condition surfaces; Ok is never returned.
            driver.run().await
        }

        Commands::HealthCheck => {
            let mut source_latency_ms = None;
            let mut source_error = None;
            match MssqlSource::new(config.source.clone()).await {
                Ok(source) => match source.ping().await {
                    Ok(latency) => source_latency_ms = Some(latency.as_millis() as u64),
                    Err(e) => source_error = Some(e.to_string()),
                },
                Err(e) => source_error = Some(e.to_string()),
            }

            let mut target_latency_ms = None;
            let mut target_error = None;
            match CosmosSink::new(&config.target) {
                Ok(sink) => match sink.health_check().await {
                    Ok(latency) => target_latency_ms = Some(latency.as_millis() as u64),
                    Err(e) => target_error = Some(e.to_string()),
                },
                Err(e) => target_error = Some(e.to_string()),
            }

            let healthy = source_error.is_none() && target_error.is_none();

            if cli.output_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "source_connected": source_error.is_none(),
                        "source_latency_ms": source_latency_ms,
                        "source_error": source_error,
                        "target_connected": target_error.is_none(),
                        "target_latency_ms": target_latency_ms,
                        "target_error": target_error,
                        "healthy": healthy,
                    }))?
                );
            } else {
                println!("Health Check Results:");
                print_check("Source (MSSQL)", source_latency_ms, source_error.as_deref());
                print_check("Target (Cosmos DB)", target_latency_ms, target_error.as_deref());
                println!(
                    "\n  Overall: {}",
                    if healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !healthy {
                return Err(MigrateError::Config("Health check failed".to_string()));
            }

            Ok(())
        }
    }
}

fn print_check(label: &str, latency_ms: Option<u64>, error: Option<&str>) {
    match latency_ms {
        Some(ms) => println!("  {}: OK ({}ms)", label, ms),
        None => println!("  {}: FAILED", label),
    }
    if let Some(err) = error {
        println!("    Error: {}", err);
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
