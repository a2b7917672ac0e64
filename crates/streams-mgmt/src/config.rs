//! Client configuration.
//!
//! Settings come from an optional TOML file:
//! - `[connection]` timeouts, keep-alive override and default URL scheme
//! - `[auth]` credentials or token
//! - `[transfer]` HTTPS trust policy and block size for artifact transfers
//!
//! Command-line and environment values are applied on top with
//! [`Settings::with_overrides`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::transfer::TransportConfig;

/// Connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Time allowed to open the socket and finish the handshake.
    pub connect_timeout_secs: u64,
    /// Time allowed for one remote call; `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Keep-alive period, overriding the one the service announces.
    pub keep_alive_secs: Option<u64>,
    /// Scheme used for bare `host:port` coordination entries.
    pub default_scheme: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: None,
            keep_alive_secs: None,
            default_scheme: "wss".to_string(),
        }
    }
}

impl ConnectionSettings {
    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-request timeout, if any.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Keep-alive override, if any.
    #[must_use]
    pub fn keep_alive(&self) -> Option<Duration> {
        self.keep_alive_secs.map(Duration::from_secs)
    }
}

/// Authentication settings.
///
/// A username selects credentials mode; otherwise the session is opened by
/// domain, optionally with a token.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthSettings {
    /// User name.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Session token.
    pub token: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Full client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Connection settings.
    pub connection: ConnectionSettings,
    /// Authentication settings.
    pub auth: AuthSettings,
    /// Artifact transfer settings.
    pub transfer: TransportConfig,
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        let settings: Self =
            toml::from_str(content).map_err(|e| CliError::Config(format!("invalid TOML: {e}")))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load from a file when one is given, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if any value is out of range.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.connection.connect_timeout_secs == 0 {
            return Err(CliError::Config(
                "connection.connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.connection.request_timeout_secs == Some(0) {
            return Err(CliError::Config(
                "connection.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.connection.keep_alive_secs == Some(0) {
            return Err(CliError::Config(
                "connection.keep_alive_secs must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.connection.default_scheme.as_str(), "ws" | "wss") {
            return Err(CliError::Config(format!(
                "connection.default_scheme must be \"ws\" or \"wss\", got \"{}\"",
                self.connection.default_scheme
            )));
        }

        if self.auth.username.as_deref() == Some("") {
            return Err(CliError::Config("auth.username cannot be empty".to_string()));
        }

        if self.transfer.block_size == 0 {
            return Err(CliError::Config(
                "transfer.block_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply command-line and environment values.
    ///
    /// `None` or an empty value keeps the file value, so an exported but
    /// empty `STREAMS_MGMT_USER` does not select credentials mode.
    #[must_use]
    pub fn with_overrides(
        mut self,
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Self {
        let username = username.filter(|v| !v.is_empty());
        let password = password.filter(|v| !v.is_empty());
        let token = token.filter(|v| !v.is_empty());
        if username.is_some() {
            self.auth.username = username;
        }
        if password.is_some() {
            self.auth.password = password;
        }
        if token.is_some() {
            self.auth.token = token;
        }
        self
    }
}
