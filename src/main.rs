//! Journey Insights CLI
//!
//! Explore shopper behavior from an interaction log:
//! funnel, step drill-down and error insights.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use journey_insights::commands::{
    display_version, execute_analyze, execute_funnel, execute_insights, execute_inspect,
    print_default_config, validate_args, validate_input_file, AnalyzeArgs, InspectArgs,
};

/// Journey Insights - funnel and error analysis for storefront event logs
#[derive(Parser, Debug)]
#[command(name = "journey")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every view and optionally write a JSON report
    Analyze {
        /// Event log (JSON array or JSON Lines)
        #[arg(short, long, env = "JOURNEY_INPUT")]
        input: PathBuf,

        /// Analysis config TOML
        #[arg(short, long, env = "JOURNEY_CONFIG")]
        config: Option<PathBuf>,

        /// Output path for the JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Show how many sessions move through each step
    Funnel {
        #[arg(short, long, env = "JOURNEY_INPUT")]
        input: PathBuf,

        #[arg(short, long, env = "JOURNEY_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Drill into one funnel step
    Inspect {
        #[arg(short, long, env = "JOURNEY_INPUT")]
        input: PathBuf,

        #[arg(short, long, env = "JOURNEY_CONFIG")]
        config: Option<PathBuf>,

        /// Step label or 1-based step number
        #[arg(short, long)]
        step: String,

        /// Maximum number of sessions to list
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Errors by category and why shoppers did not complete their order
    Insights {
        #[arg(short, long, env = "JOURNEY_INPUT")]
        input: PathBuf,

        #[arg(short, long, env = "JOURNEY_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Load an event log and report skipped records
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the default analysis configuration as TOML
    Config,

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            summary,
        } => {
            let args = AnalyzeArgs {
                // Without a report file the summary is the only output
                print_summary: summary || output.is_none(),
                input,
                config,
                output,
            };

            validate_args(&args)?;
            execute_analyze(args)?;
        }

        Commands::Funnel { input, config } => {
            execute_funnel(&input, config.as_deref())?;
        }

        Commands::Inspect {
            input,
            config,
            step,
            limit,
        } => {
            execute_inspect(InspectArgs {
                input,
                config,
                step,
                limit,
            })?;
        }

        Commands::Insights { input, config } => {
            execute_insights(&input, config.as_deref())?;
        }

        Commands::Validate { input } => {
            validate_input_file(&input)?;
        }

        Commands::Config => {
            print_default_config()?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
