use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "clustermut CLI - Assemble and inspect molecular cluster geometries with the clustermut mutation engine.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE).
    /// Per-module levels can be set with the CLUSTERMUT_LOG environment variable.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used when packing several structures.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build new cluster geometries from the units of an input file by incremental packing.
    Pack(PackArgs),
    /// Report collisions, dissociation, and unit connectivity of a cluster geometry.
    Analyze(AnalyzeArgs),
}

/// Output file formats for packed geometries.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Cluster TOML with units, orientations, and bonds.
    Toml,
    /// Flattened Cartesian coordinates.
    Xyz,
}

/// Unit order used by the packer.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingOrderArg {
    Ascending,
    Random,
    BySize,
}

/// Collision detection algorithm.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionStrategyArg {
    #[default]
    Pairwise,
    Spatial,
}

/// Arguments for the `pack` subcommand.
#[derive(Args, Debug)]
pub struct PackArgs {
    // --- Core Arguments ---
    /// Path to the input cluster file (.toml cluster description or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output file. With --count above one, an index is appended
    /// to the file stem.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format. Inferred from the output extension when omitted.
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    // --- Run Overrides ---
    /// Number of independent structures to pack.
    #[arg(short = 'n', long, value_name = "INT")]
    pub count: Option<usize>,

    /// Seed of the random number generator. Structure `i` uses `seed + i`.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    // --- Packing Overrides ---
    /// Override the order in which units are placed.
    #[arg(long, value_enum, value_name = "ORDER")]
    pub order: Option<PackingOrderArg>,

    /// Override the maximum random box growth per axis, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub box_increment: Option<f64>,

    /// Override the number of box resets allowed per unit.
    #[arg(long, value_name = "INT")]
    pub max_resets: Option<usize>,

    /// Override the collision detection algorithm.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub collision_detection: Option<CollisionStrategyArg>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S packing.tries-before-reset=2000
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the cluster file to inspect (.toml cluster description or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Scale applied to radius sums in the collision test.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.0)]
    pub collision_blow_factor: f64,

    /// Scale applied to radius sums when detecting inter-unit bonds.
    #[arg(long, value_name = "FLOAT", default_value_t = 1.2)]
    pub bond_blow_factor: f64,

    /// Scale applied to radius sums in the dissociation test.
    #[arg(long, value_name = "FLOAT", default_value_t = 3.0)]
    pub dissociation_blow_factor: f64,

    /// Collision detection algorithm.
    #[arg(long, value_enum, value_name = "STRATEGY", default_value_t)]
    pub collision_detection: CollisionStrategyArg,
}
