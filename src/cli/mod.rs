use crate::error::Result;
use crate::search::SearchConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// qcsearch: which regressor best predicts each QC signal from the others
#[derive(Parser, Debug)]
#[command(name = "qcsearch")]
#[command(about = "Leave-one-feature-out grid search of regression pipelines over QC metrics")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare regressor kinds behind a fixed min-max + percentile preprocessing
    Models(SearchArgs),

    /// Compare scaler and selector shapes in front of an elastic net
    Pipelines(SearchArgs),

    /// Print the shape of the metrics store and the signal features
    Inspect(InspectArgs),
}

/// Options shared by both search modes
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// SQLite metrics store
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// Output directory for the result tables
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Signal features, comma separated (default: every numeric feature)
    #[arg(short, long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Only run these candidates, comma separated
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Worker threads for the grid search
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl SearchArgs {
    /// Configuration file (or defaults) with the flags given on the command line applied
    pub fn resolve(&self) -> Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_toml_file(path)?,
            None => SearchConfig::default(),
        };

        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if !self.features.is_empty() {
            config.signal_features = self.features.clone();
        }
        if !self.only.is_empty() {
            config.only = self.only.clone();
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Inspection arguments
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// SQLite metrics store
    #[arg(short, long)]
    pub database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Signal features, comma separated (default: every numeric feature)
    #[arg(short, long, value_delimiter = ',')]
    pub features: Vec<String>,
}

impl InspectArgs {
    pub fn resolve(&self) -> Result<SearchConfig> {
        SearchArgs {
            database: self.database.clone(),
            config: self.config.clone(),
            features: self.features.clone(),
            ..SearchArgs::default()
        }
        .resolve()
    }
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
