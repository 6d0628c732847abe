//! # ELT Job Runner
//!
//! Command-line tool that executes a declarative sling job file in process
//! and prints a run summary.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tasker_elt::execution::RunEventType;
use tasker_elt::{EltConfig, ExecuteOptions, SlingJobSpec};
use tracing::error;

#[derive(Parser)]
#[command(name = "elt-run")]
#[command(about = "Execute a declarative sling job")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Job file (YAML) describing resources and assets
    job_file: PathBuf,

    /// Runtime configuration file (YAML)
    #[arg(short, long, env = "TASKER_ELT_CONFIG")]
    config: Option<PathBuf>,

    /// Only validate the job file and print the execution order
    #[arg(long)]
    dry_run: bool,

    /// Output format for the run summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            error!(error = %err, "elt-run failed");
            eprintln!("Error: {err:#}");
            process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = EltConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tasker_elt::logging::init_structured_logging_with(&config);

    let job = SlingJobSpec::from_path(&cli.job_file)
        .and_then(|spec| spec.into_job(&config))
        .with_context(|| format!("building job from {}", cli.job_file.display()))?;

    if cli.dry_run {
        println!("Job '{}' is valid. Execution order:", job.name());
        for (position, definition) in job.graph().execution_order().enumerate() {
            let keys: Vec<String> = definition.keys().map(|key| key.to_user_string()).collect();
            println!("  {}. {} -> {}", position + 1, definition.name(), keys.join(", "));
        }
        if !job.external_dependencies().is_empty() {
            let external: Vec<String> = job
                .external_dependencies()
                .iter()
                .map(|key| key.to_user_string())
                .collect();
            println!("External dependencies: {}", external.join(", "));
        }
        return Ok(true);
    }

    let result = job
        .execute_in_process_with(ExecuteOptions::default().raise_on_error(false))
        .await?;

    if cli.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(result.all_events())?);
    } else {
        println!("Run {} for job '{}': {}", result.run_id(), result.job_name(), result.status());
        for event in result.all_events() {
            match &event.event_type {
                RunEventType::AssetMaterialization { materialization } => {
                    let key = materialization
                        .asset_key
                        .as_ref()
                        .map(|key| key.to_user_string())
                        .unwrap_or_default();
                    let rows = materialization
                        .metadata_int("rows_written")
                        .map(|rows| rows.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    println!("  materialized {key:<30} rows_written={rows}");
                }
                RunEventType::StepFailure { error } => {
                    println!("  step {:<30} FAILED: {error}", event.step_key.as_deref().unwrap_or("-"));
                }
                RunEventType::StepSkipped { .. } => {
                    println!("  step {:<30} skipped", event.step_key.as_deref().unwrap_or("-"));
                }
                _ => {}
            }
        }
        println!("Finished in {}ms", result.duration().as_millis());
    }

    Ok(result.success())
}
