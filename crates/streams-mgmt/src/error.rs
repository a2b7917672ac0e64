//! CLI error types.

use thiserror::Error;

use crate::validate::ContractViolation;

/// CLI-specific errors.
///
/// Everything except the usage family is reported to the caller as a single
/// `EXCEPTION:<message>` line on standard output.
#[derive(Debug, Error)]
pub enum CliError {
    /// Malformed command line: unknown action or flag, or a flag without its value.
    #[error("{0}")]
    Usage(String),

    /// The flags given do not satisfy the action's parameter contract.
    #[error("{0}")]
    Contract(ContractViolation),

    /// A parameter value is malformed.
    #[error("{0}")]
    Validation(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Management service connection failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// A remote call was attempted without a session.
    #[error("Not connected. Must connect to the management service first")]
    NotConnected,

    /// A request did not complete in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The management service rejected a call.
    #[error("{message} (code {code})")]
    Remote {
        /// Error code.
        code: u32,
        /// Error message.
        message: String,
    },

    /// Unexpected or undecodable message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A named resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Artifact upload or download failed.
    #[error("{0}")]
    Transfer(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CliError {
    /// Whether the error belongs on standard error together with usage text
    /// rather than on standard output as an `EXCEPTION:` line.
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::Contract(_))
    }
}

impl From<streams_proto::ProtoError> for CliError {
    fn from(err: streams_proto::ProtoError) -> Self {
        match err {
            streams_proto::ProtoError::InvalidResource(msg) => Self::Validation(msg),
            other => Self::Protocol(other.to_string()),
        }
    }
}
