use std::path::PathBuf;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "elflint",
    version,
    about = "Packaging-policy checks for ELF binaries and static archives"
)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check every file of an extracted package tree
    Check {
        /// Root of the extracted package
        root: PathBuf,

        /// Package name, used in findings and the naming policy
        #[arg(long)]
        package: String,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Check a single file
    File {
        /// Path of the file to read
        path: PathBuf,

        /// Installed path of the file (defaults to PATH)
        #[arg(long = "as", value_name = "LOGICAL")]
        logical: Option<String>,

        /// Package name, used in findings and the naming policy
        #[arg(long, default_value = "unknown")]
        package: String,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Print the explanation of one or more rules
    Explain {
        #[arg(required = true)]
        rules: Vec<String>,
    },

    /// Print the effective configuration as TOML
    PrintConfig {
        /// Configuration file to merge over the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, ClapArgs)]
pub struct AnalysisArgs {
    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// readelf binary to run
    #[arg(long)]
    pub readelf: Option<PathBuf>,

    /// Per-file readelf timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Treat warnings as errors
    #[arg(long, conflicts_with = "permissive")]
    pub strict: bool,

    /// Never fail on findings
    #[arg(long)]
    pub permissive: bool,

    /// Skip a rule (repeatable)
    #[arg(long = "disable", value_name = "RULE")]
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
