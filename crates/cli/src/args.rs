//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// crop-advisor: rank crops by expected profitability from soil and weather data
#[derive(Parser, Debug)]
#[command(name = "crop-advisor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank crops for one plot
    Rank(RankArgs),

    /// Rank crops for several plots read from a JSON file
    Batch(BatchArgs),

    /// Inspect the economic reference tables
    Crops(CropsArgs),

    /// Soil amendment report for a chosen crop
    Amend(AmendArgs),

    /// Soil alerts for a sample and optional field plan
    Alerts(AlertsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

/// Soil and weather inputs.
///
/// Either pass all seven values, pass the four soil values (or `--soil`) and
/// let the forecast provider fill in the weather, or pass `--features`.
#[derive(Args, Debug, Default, Clone)]
pub struct FeatureArgs {
    /// All seven features as N,P,K,rainfall,ph,humidity,temperature
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with_all = ["soil", "nitrogen", "phosphorus", "potassium", "ph"])]
    pub features: Option<Vec<f64>>,

    /// Soil sample JSON file ({"nitrogen", "phosphorus", "potassium", "ph"})
    #[arg(long, conflicts_with_all = ["nitrogen", "phosphorus", "potassium", "ph"])]
    pub soil: Option<PathBuf>,

    /// Nitrogen (N)
    #[arg(short = 'n', long)]
    pub nitrogen: Option<f64>,

    /// Phosphorus (P)
    #[arg(short = 'p', long)]
    pub phosphorus: Option<f64>,

    /// Potassium (K)
    #[arg(short = 'k', long)]
    pub potassium: Option<f64>,

    /// Soil pH
    #[arg(long)]
    pub ph: Option<f64>,

    /// Rainfall in mm
    #[arg(long)]
    pub rainfall: Option<f64>,

    /// Relative humidity in percent
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Temperature in degrees Celsius
    #[arg(long)]
    pub temperature: Option<f64>,
}

#[derive(Args, Debug)]
pub struct RankArgs {
    #[command(flatten)]
    pub features: FeatureArgs,

    /// Number of crops to return
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Override reference tables file
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON array of plots ({"id", "features", "top_k"?}); use - for stdin
    #[arg(long)]
    pub input: PathBuf,

    /// Override classifier.max_concurrent
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Override reference tables file
    #[arg(long)]
    pub reference: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CropsArgs {
    #[command(subcommand)]
    pub command: CropsCommands,
}

#[derive(Subcommand, Debug)]
pub enum CropsCommands {
    /// List crops in reference order
    List {
        /// Override reference tables file
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the economics of one crop
    Show {
        /// Crop name
        name: String,

        /// Override reference tables file
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate reference tables
    Validate {
        /// Override reference tables file
        #[arg(long)]
        reference: Option<PathBuf>,
    },

    /// Print the built-in reference tables as TOML
    Export,
}

#[derive(Args, Debug)]
pub struct AmendArgs {
    /// Crop to assess
    #[arg(long)]
    pub crop: String,

    /// Field area in square feet
    #[arg(long, default_value_t = 1000.0)]
    pub area_sqft: f64,

    #[command(flatten)]
    pub features: FeatureArgs,

    /// Override reference tables file
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AlertsArgs {
    /// Soil sample JSON file
    #[arg(long, conflicts_with_all = ["nitrogen", "phosphorus", "potassium", "ph"])]
    pub soil: Option<PathBuf>,

    /// Nitrogen (N)
    #[arg(short = 'n', long)]
    pub nitrogen: Option<f64>,

    /// Phosphorus (P)
    #[arg(short = 'p', long)]
    pub phosphorus: Option<f64>,

    /// Potassium (K)
    #[arg(short = 'k', long)]
    pub potassium: Option<f64>,

    /// Soil pH
    #[arg(long)]
    pub ph: Option<f64>,

    /// Field plan JSON file ({"total_acres", "allocations": [{"crop", "acres"}]})
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Check specific component (config, reference, classifier, forecast)
    #[arg(long)]
    pub check: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
