use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Evaluate stored record filters against field records
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Evaluator config file (TOML)
    #[arg(long, global = true, env = "RECORD_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the report to this file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a filter file and summarise what it references
    Check {
        /// Filter tree (JSON or JSON5)
        filter: PathBuf,
    },
    /// Evaluate a filter against a single record
    Eval {
        /// Filter tree (JSON or JSON5)
        filter: PathBuf,
        /// Record object mapping field keys to {fieldType, fieldValue}
        record: PathBuf,
    },
    /// Evaluate a filter against many records and list the matches
    Select {
        /// Filter tree (JSON or JSON5)
        filter: PathBuf,
        /// JSON array or JSON lines of records
        records: PathBuf,
        /// Report records that cannot be evaluated instead of stopping
        #[arg(short, long)]
        keep_going: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
