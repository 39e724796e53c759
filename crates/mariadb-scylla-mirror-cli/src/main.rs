//! mariadb-scylla-mirror CLI - schema-driven MariaDB to ScyllaDB replication setup.

use clap::{Parser, Subcommand};
use mariadb_scylla_mirror::{
    Config, MariadbCatalog, Orchestrator, ScyllaStore, SetupError,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mariadb-scylla-mirror")]
#[command(about = "Schema-driven MariaDB to ScyllaDB replication setup")]
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
    /// Run the full mirror setup
    Run {
        /// Show every statement setup would execute, without executing any
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare source and mirror row counts for every mirrorable table
    Validate,

    /// Test database connections
    HealthCheck,

    /// List trigger executions that started but never completed
    Audit,
}

#[derive(Serialize)]
struct HealthCheckResult {
    source_connected: bool,
    source_latency_ms: u64,
    source_error: Option<String>,
    target_connected: bool,
    target_latency_ms: u64,
    target_error: Option<String>,
    healthy: bool,
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

async fn run() -> Result<(), SetupError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(SetupError::Config)?;

    // Loading already runs full validation
    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run { dry_run } => {
            let source = MariadbCatalog::connect(&config.source).await?;
            let target = ScyllaStore::connect(&config.target).await?;
            let orchestrator = Orchestrator::new(config, source, target);

            if dry_run {
                let plans = orchestrator.dry_run().await?;

                if cli.output_json {
                    println!("{}", serde_json::to_string_pretty(&plans)?);
                } else {
                    for plan in &plans {
                        println!("-- {}", plan.table);
                        for statement in &plan.statements {
                            println!("{};\n", statement);
                        }
                    }
                }
                return Ok(());
            }

            let report = orchestrator.run().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\nMirror setup completed!");
                println!("  Tables mirrored: {}", report.tables_mirrored);
                println!("  Tables skipped:  {}", report.tables_skipped);
                println!("  Tables failed:   {}", report.tables_failed);
                for outcome in &report.outcomes {
                    use mariadb_scylla_mirror::TableStatus;
                    match &outcome.status {
                        TableStatus::Mirrored { backfilled_rows } => {
                            println!("  ✓ {} ({} rows backfilled)", outcome.table, backfilled_rows)
                        }
                        TableStatus::Skipped { reason } => {
                            println!("  - {} (skipped: {})", outcome.table, reason)
                        }
                        TableStatus::Failed { reason } => {
                            println!("  ✗ {} ({})", outcome.table, reason)
                        }
                    }
                }
            }

            if !report.is_success() {
                return Err(SetupError::Config(format!(
                    "setup finished with {} failed tables",
                    report.tables_failed
                )));
            }
        }

        Commands::Validate => {
            let source = MariadbCatalog::connect(&config.source).await?;
            let target = ScyllaStore::connect(&config.target).await?;
            let orchestrator = Orchestrator::new(config, source, target);

            let outcomes = orchestrator.validate().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in &outcomes {
                    match outcome.mirror_rows {
                        Some(_) if outcome.matched => println!(
                            "  ✓ {} ({} rows)",
                            outcome.table, outcome.source_rows
                        ),
                        Some(mirror_rows) => println!(
                            "  ✗ {} (source: {}, mirror: {})",
                            outcome.table, outcome.source_rows, mirror_rows
                        ),
                        None => println!("  ✗ {} (no mirror table)", outcome.table),
                    }
                }
            }

            let mismatched = outcomes.iter().filter(|o| !o.matched).count();
            if mismatched > 0 {
                return Err(SetupError::Config(format!(
                    "{} table(s) out of sync",
                    mismatched
                )));
            }
            println!("Validation completed successfully");
        }

        Commands::HealthCheck => {
            let result = health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (MariaDB): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (ScyllaDB): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(SetupError::Config("Health check failed".to_string()));
            }
        }

        Commands::Audit => {
            let source = MariadbCatalog::connect(&config.source).await?;
            let entries = source
                .fetch_open_audit_entries(&config.source.database)
                .await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No incomplete trigger executions");
            } else {
                println!("{} incomplete trigger execution(s):", entries.len());
                for entry in &entries {
                    println!(
                        "  #{} {} {} {} key={} at {}",
                        entry.log_id,
                        entry.table_name,
                        entry.trigger_name,
                        entry.event_type,
                        entry.primary_key_value.as_deref().unwrap_or("NULL"),
                        entry.log_timestamp
                    );
                }
            }
        }
    }

    Ok(())
}

async fn health_check(config: &Config) -> HealthCheckResult {
    let start = Instant::now();
    let (source_connected, source_error) =
        match MariadbCatalog::connect(&config.source).await {
            Ok(catalog) => match catalog.ping().await {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e.to_string())),
            },
            Err(e) => (false, Some(e.to_string())),
        };
    let source_latency_ms = start.elapsed().as_millis() as u64;

    let start = Instant::now();
    let (target_connected, target_error) = match ScyllaStore::connect(&config.target).await {
        Ok(store) => match store.ping().await {
            Ok(()) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        },
        Err(e) => (false, Some(e.to_string())),
    };
    let target_latency_ms = start.elapsed().as_millis() as u64;

    HealthCheckResult {
        source_connected,
        source_latency_ms,
        source_error,
        target_connected,
        target_latency_ms,
        target_error,
        healthy: source_connected && target_connected,
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    // RUST_LOG overrides --verbosity when set
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(verbosity))
        .map_err(|e| e.to_string())?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
