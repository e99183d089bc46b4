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
    author,
    version,
    about = "molmin CLI - Force-field energy evaluation, geometry optimization and rigid superposition of molecules.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Minimize the energy of a structure by moving its atoms.
    Minimize(MinimizeArgs),
    /// Superimpose a source structure onto a target structure.
    Align(AlignArgs),
    /// Report the energy of a structure without moving it.
    Energy(EnergyArgs),
}

/// Force field selection shared by every command that evaluates energies.
#[derive(Args, Debug, Clone, Default)]
pub struct ForceFieldArgs {
    /// Registry name of the force field (e.g., 'dreiding-lite').
    #[arg(long, value_name = "NAME")]
    pub force_field: Option<String>,

    /// Named parameter set of the force field.
    #[arg(long, value_name = "NAME", conflicts_with = "parameter_file")]
    pub parameter_set: Option<String>,

    /// TOML parameter file, replacing the force field's named parameter sets.
    #[arg(long, value_name = "PATH")]
    pub parameter_file: Option<PathBuf>,
}

/// Optimizer settings that override the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Convergence threshold on the RMS gradient, in kcal/(mol·Å).
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Maximum number of optimization steps.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S optimizer.initial-step=0.05
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `minimize` subcommand.
#[derive(Args, Debug)]
pub struct MinimizeArgs {
    /// Path to the input structure file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the minimized structure file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub force_field: ForceFieldArgs,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

/// Arguments for the `align` subcommand.
#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Structure to move.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub source: PathBuf,

    /// Reference structure.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub target: PathBuf,

    /// Pair only atoms with this name (e.g., 'CA' for alpha carbons).
    /// Without it, atoms are paired by position.
    #[arg(short = 'n', long, value_name = "NAME")]
    pub atom_name: Option<String>,

    /// Where to write the aligned source structure.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Path to the input structure file (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub force_field: ForceFieldArgs,
}
