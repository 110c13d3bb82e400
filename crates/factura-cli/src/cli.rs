//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the completion API key
pub const API_KEY_VAR: &str = "ASI1_API_KEY";

/// Factura CLI - Extract invoice fields from PDF or text invoices.
#[derive(Debug, Parser)]
#[command(name = "factura")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Completion API key
    #[arg(long, env = API_KEY_VAR, hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract the fields of one invoice
    Extract(ExtractArgs),

    /// Extract every PDF invoice in a directory
    Batch(BatchArgs),

    /// Print the effective configuration
    Config,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Invoice file; `.pdf` is read as PDF, anything else as UTF-8 text
    pub file: PathBuf,
}

/// Arguments for the batch command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Directory containing `.pdf` invoices
    pub dir: PathBuf,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
