//! pf-harness CLI: generate and run population forecast model sweeps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pf_engine::{build_executor, HarnessConfig, InMemoryRunTracker, SweepOrchestrator, EXAMPLE_CONFIG};
use pf_sweep::{aggregate, default_catalog, extended_catalog};

#[derive(Parser)]
#[command(name = "pf-harness")]
#[command(version)]
#[command(about = "Parameter sweeps over VAR population forecasting pipelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the built-in suite catalog as JSON
    Catalog {
        /// Include the VARMAX suite
        #[arg(long)]
        extended: bool,
    },

    /// Expand the configured suites into run configurations
    Generate {
        /// Write the run configurations here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Execute the sweep against a CSV dataset
    Run {
        /// Population CSV; overrides the configuration
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Concurrent runs; overrides the configuration
        #[arg(short, long)]
        parallelism: Option<usize>,

        /// Re-execute runs that already exist
        #[arg(long)]
        upsert: bool,
    },

    /// Show example configuration
    ExampleConfig,
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {path:?}")),
        None => Ok(HarnessConfig::default().with_data_path_override(
            std::env::var_os(pf_engine::DATA_PATH_ENV).map(PathBuf::from),
        )),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::ExampleConfig => {
            println!("{EXAMPLE_CONFIG}");
        }

        Commands::Catalog { extended } => {
            let catalog = if extended {
                extended_catalog()
            } else {
                default_catalog()
            };
            println!("{}", catalog.to_json_pretty()?);
        }

        Commands::Generate { output } => {
            let config = load_config(cli.config.as_ref())?;
            let catalog = config.catalog().context("Failed to load suite catalog")?;
            let setup = aggregate(&catalog).context("Failed to generate run configurations")?;
            let json = serde_json::to_string_pretty(&setup)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {path:?}"))?;
                    info!(runs = setup.len(), path = %path.display(), "Wrote run configurations");
                }
                None => println!("{json}"),
            }
        }

        Commands::Run {
            data,
            parallelism,
            upsert,
        } => {
            let mut config = load_config(cli.config.as_ref())?.with_data_path_override(data);
            if let Some(n) = parallelism {
                config.execution.parallelism = n;
            }
            config.execution.upsert_previous_runs |= upsert;
            config.validate()?;

            let catalog = config.catalog().context("Failed to load suite catalog")?;
            let setup = aggregate(&catalog).context("Failed to generate run configurations")?;

            let tracker = Arc::new(InMemoryRunTracker::new());
            let executor = Arc::new(build_executor(&config, tracker));
            let summary = SweepOrchestrator::new(executor, config.sweep_options())
                .run(&setup)
                .context("Sweep aborted")?;

            println!("\n=== Sweep Complete: {} ===", summary.experiment_name);
            println!("Runs:      {}", summary.total);
            println!("Executed:  {}", summary.executed);
            println!("Skipped:   {}", summary.skipped);
            println!("Failed:    {}", summary.failed);
            if let Some(best) = &summary.best {
                println!("Best run:  {}", best.run_name);
                if let Some(output) = &best.output {
                    println!("           {output}");
                }
            }
        }
    }

    Ok(())
}
