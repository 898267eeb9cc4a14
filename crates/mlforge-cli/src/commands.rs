//! Subcommand definitions.

use clap::Subcommand;
use std::path::PathBuf;

use mlforge_core::domain::{AlgorithmClass, DataType, FeatureType, ImputeOption};

use crate::config_commands::ConfigCommand;

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Manage datasets and their versions
    Dataset {
        #[command(subcommand)]
        command: DatasetCommand,
    },
    /// Manage analyses: algorithm, hyperparameters and features
    Analysis {
        #[command(subcommand)]
        command: AnalysisCommand,
    },
    /// Create, build and query models
    Model {
        #[command(subcommand)]
        command: ModelCommand,
    },
    /// Cluster a sample of a dataset version on the given columns
    ClusterPoints {
        /// Dataset version ID
        version_id: i64,
        /// Comma-separated column names
        #[arg(long, value_delimiter = ',', required = true)]
        features: Vec<String>,
        /// Number of clusters
        #[arg(long, default_value_t = 3)]
        clusters: u32,
    },
    /// View or change application settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Show resolved data paths
    Paths,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List projects
    List,
    /// Delete a project with its analyses and models
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum DatasetCommand {
    /// Register a dataset
    Create {
        name: String,
        /// Row format (CSV or TSV)
        #[arg(long = "type", default_value = "CSV")]
        data_type: DataType,
        /// Where the data comes from
        #[arg(long, default_value = "file")]
        source_type: String,
        /// Where versions are kept
        #[arg(long, default_value = "file")]
        target_type: String,
        #[arg(long)]
        comments: Option<String>,
    },
    /// List datasets
    List,
    /// Replace or clear a dataset's comments
    Comment {
        id: i64,
        /// New comments; omit to clear
        comments: Option<String>,
    },
    /// Delete a dataset with its versions and their models
    Delete { id: i64 },
    /// Manage dataset versions
    Version {
        #[command(subcommand)]
        command: VersionCommand,
    },
}

#[derive(Subcommand)]
pub enum VersionCommand {
    /// Add an immutable version and cache a sample of its rows
    Add {
        dataset_id: i64,
        version: String,
        /// Location of the data (path, file:// or hdfs:// URI)
        uri: String,
    },
    /// List versions of a dataset
    List { dataset_id: i64 },
    /// Delete a version and the models built on it
    Delete { version_id: i64 },
}

#[derive(Subcommand)]
pub enum AnalysisCommand {
    /// Create an analysis in a project
    Create {
        project_id: i64,
        name: String,
        #[arg(long)]
        comments: Option<String>,
    },
    /// List analyses of a project
    List { project_id: i64 },
    /// Delete an analysis and its models
    Delete { analysis_id: i64 },
    /// Choose algorithm, response variable and train fraction
    Set {
        analysis_id: i64,
        /// Algorithm name (e.g. LOGISTIC_REGRESSION)
        #[arg(long)]
        algorithm: Option<String>,
        /// Algorithm class (e.g. Classification)
        #[arg(long = "class")]
        algorithm_class: Option<AlgorithmClass>,
        /// Response column
        #[arg(long)]
        response: Option<String>,
        /// Fraction of rows used for training, in (0, 1]
        #[arg(long)]
        train_fraction: Option<f64>,
    },
    /// Set hyperparameters as key=value pairs
    Hyper {
        analysis_id: i64,
        #[arg(value_parser = parse_key_value, required = true)]
        params: Vec<(String, String)>,
    },
    /// Customize one feature
    Feature {
        analysis_id: i64,
        name: String,
        #[arg(long = "type")]
        feature_type: Option<FeatureType>,
        #[arg(long)]
        impute: Option<ImputeOption>,
        /// Include the column in training (true/false)
        #[arg(long)]
        include: Option<bool>,
    },
    /// Store default features for every column of a dataset version
    InitFeatures { analysis_id: i64, version_id: i64 },
    /// Show configuration, hyperparameters and features
    Show { analysis_id: i64 },
    /// List supported algorithms of a class
    Algorithms {
        #[arg(default_value = "Classification")]
        class: AlgorithmClass,
    },
}

#[derive(Subcommand)]
pub enum ModelCommand {
    /// Create a model for an analysis and dataset version
    Create {
        name: String,
        #[arg(long)]
        analysis: i64,
        #[arg(long)]
        version: i64,
        /// Storage type of the artifact root (file or hdfs)
        #[arg(long, requires = "storage_location")]
        storage_type: Option<String>,
        /// Root the artifact is written under
        #[arg(long, requires = "storage_type")]
        storage_location: Option<String>,
    },
    /// List models
    List,
    /// Show a model by ID or name
    Show { model: String },
    /// Choose where the artifact is written
    Storage {
        model: String,
        storage_type: String,
        location: String,
    },
    /// Start a build
    Build {
        model: String,
        /// Follow the build and print the outcome
        #[arg(long)]
        wait: bool,
    },
    /// Predict with a built model
    Predict {
        model: String,
        /// JSON file holding an array of rows
        #[arg(long)]
        rows: PathBuf,
    },
    /// Delete a model
    Delete { model: String },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
