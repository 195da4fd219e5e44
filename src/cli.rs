use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cropwise", version, about = "Crop and fertilizer recommendations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend a crop for an environment you describe
    Recommend(ExplicitArgs),
    /// Detect the environment at a location without recommending
    Detect(LocationArgs),
    /// Detect the environment at a location, then recommend
    Auto {
        #[command(flatten)]
        location: LocationArgs,

        /// Do not save the result to history
        #[arg(long)]
        no_save: bool,
    },
    /// Show saved recommendations, newest first
    History {
        /// Owner to list (defaults to farm.owner from config, else "local")
        #[arg(long)]
        user: Option<String>,

        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
    /// Re-run interactive setup
    Init,
    /// Validate config and test connections
    Check,
}

#[derive(Args)]
pub struct ExplicitArgs {
    /// Sandy, Clay, Loamy, Black or Red
    #[arg(long)]
    pub soil: Option<String>,

    /// Degrees Celsius
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<f64>,

    /// Millimetres
    #[arg(long, allow_hyphen_values = true)]
    pub rainfall: Option<f64>,

    /// Kharif, Rabi, Zaid or All
    #[arg(long)]
    pub season: Option<String>,

    /// Do not save the result to history
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args, Default)]
pub struct LocationArgs {
    /// Latitude in degrees (defaults to farm.latitude)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees (defaults to farm.longitude)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,
}
