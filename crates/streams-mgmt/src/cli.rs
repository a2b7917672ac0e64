//! Command-line argument parsing with clap.
//!
//! clap owns the global options and the action name. The action's own
//! flags are collected verbatim and handed to [`crate::params::RawParams`].

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Administer a stream-processing domain through its management service.
#[derive(Parser, Debug, Clone)]
#[command(name = "streams-mgmt")]
#[command(version, about, long_about = None)]
#[command(after_help = "Run with an unknown action, or none, to list the actions and their flags.")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "STREAMS_MGMT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for JSON documents.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// User name; selects credentials mode.
    #[arg(long, env = "STREAMS_MGMT_USER")]
    pub user: Option<String>,

    /// Password for credentials mode.
    #[arg(long, env = "STREAMS_MGMT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Session token for token mode.
    #[arg(long, env = "STREAMS_MGMT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log line format on standard error.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Action to perform, e.g. `getDomainInfo` or `submitJob`.
    pub action: String,

    /// Action flags, e.g. `-zkconnect host:port -domain d1`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Compact single-line JSON.
    #[default]
    Json,
    /// Indented JSON.
    Pretty,
}

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}
