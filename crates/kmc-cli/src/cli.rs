use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "OptoKMC Developers",
    version,
    about = "OptoKMC CLI - Kinetic Monte Carlo simulation of charge and exciton transport in disordered organic semiconductors.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for independent runs.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one or more independent KMC trajectories.
    Run(RunArgs),
    /// Write the precomputed neighbor rate table of a system.
    Rates(RatesArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory for the per-run output files, overriding the config file.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the random seed.
    #[arg(short, long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Override the number of independent runs.
    #[arg(short = 'n', long, value_name = "INT")]
    pub runs: Option<u64>,

    /// Override the simulated time limit in seconds.
    #[arg(long, value_name = "FLOAT")]
    pub max_time: Option<f64>,

    /// Override the step limit.
    #[arg(long, value_name = "INT")]
    pub max_steps: Option<u64>,

    /// Disable trajectory output; only the final summary is written.
    #[arg(long)]
    pub no_record: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S simulation.seed=7
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `rates` subcommand.
#[derive(Args, Debug)]
pub struct RatesArgs {
    /// Path to the run configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Path of the CSV file to write.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,
}
