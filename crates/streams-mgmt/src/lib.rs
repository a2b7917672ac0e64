//! # streams-mgmt
//!
//! Command-line administration of a stream-processing domain.
//!
//! One invocation performs one action: the action's flags are checked
//! against its parameter contract, a session with the domain's management
//! service is opened, the action runs, and the session is closed again.
//!
//! ```text
//! argv ─► clap (global options) ─► RawParams ─► validate ─► ParameterSet
//!                                                              │
//!          stdout ◄─ JSON | EXCEPTION: ◄─ dispatch ◄─ ResourceFacade ◄─ Session
//! ```
//!
//! Failures of a well-formed request are reported as one `EXCEPTION:` line
//! on standard output and still count as a completed run. Malformed command
//! lines print diagnostics and usage on standard error.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod facade;
pub mod output;
pub mod params;
pub mod transfer;
pub mod validate;

use std::io::Write;

use tracing::{debug, warn};

pub use error::CliError;

use crate::action::{Action, Field};
use crate::cli::Cli;
use crate::config::Settings;
use crate::connection::{ConnectTarget, ConnectionManager, ConnectionOptions};
use crate::facade::ResourceFacade;
use crate::output::OutputFormat;
use crate::params::{ParameterSet, RawParams};
use crate::transfer::ArtifactTransfer;

/// Program name used in usage text.
pub const PROGRAM: &str = "streams-mgmt";

/// Exit status of a usage error.
pub const USAGE_EXIT_CODE: u8 = 2;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action ran to completion.
    Completed,
    /// The action failed and an `EXCEPTION:` line was written.
    Failed,
    /// The command line was rejected before anything ran.
    UsageError,
}

impl Outcome {
    /// Process exit status.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Completed | Self::Failed => 0,
            Self::UsageError => USAGE_EXIT_CODE,
        }
    }
}

/// Run one invocation.
///
/// `out` receives the action's document or its `EXCEPTION:` line; `err`
/// receives usage diagnostics.
pub async fn run<W: Write, E: Write>(cli: &Cli, out: &mut W, err: &mut E) -> Outcome {
    let Some(action) = Action::from_name(&cli.action) else {
        report_usage(err, &format!("Unknown action:  {}", cli.action));
        return Outcome::UsageError;
    };

    let params = match RawParams::parse(&cli.args).and_then(|raw| validate::validate(action, raw)) {
        Ok(params) => params,
        Err(e) if e.is_usage() => {
            report_usage(err, &e.to_string());
            return Outcome::UsageError;
        }
        Err(e) => return report_failure(out, &e),
    };

    match perform(cli, action, &params, out).await {
        Ok(()) => Outcome::Completed,
        Err(e) => report_failure(out, &e),
    }
}

async fn perform<W: Write>(cli: &Cli, action: Action, params: &ParameterSet, out: &mut W) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref())?.with_overrides(
        cli.user.clone(),
        cli.password.clone(),
        cli.token.clone(),
    );
    let transfer = ArtifactTransfer::new(settings.transfer.clone())?;
    let target = ConnectTarget::select(
        params.text(Field::ConnectString)?,
        params.text(Field::Domain)?,
        &settings.auth,
    );

    let mut manager = ConnectionManager::new(ConnectionOptions::from(&settings.connection));
    let result = connect_and_execute(&mut manager, &target, action, params, &transfer, out, cli).await;

    if let Err(e) = manager.disconnect().await {
        debug!(error = %e, "Disconnect failed");
    }
    result
}

async fn connect_and_execute<W: Write>(
    manager: &mut ConnectionManager,
    target: &ConnectTarget,
    action: Action,
    params: &ParameterSet,
    transfer: &ArtifactTransfer,
    out: &mut W,
    cli: &Cli,
) -> Result<(), CliError> {
    manager.connect(target).await?;
    let facade = ResourceFacade::new(manager.session()?, transfer);
    dispatch::execute(action, params, &facade, out, OutputFormat::new(cli.format)).await
}

fn report_usage<E: Write>(err: &mut E, diagnostics: &str) {
    if let Err(e) = output::write_usage(err, diagnostics, &action::usage(PROGRAM)) {
        warn!(error = %e, "Failed to write usage");
    }
}

fn report_failure<W: Write>(out: &mut W, error: &CliError) -> Outcome {
    debug!(error = ?error, "Action failed");
    if let Err(e) = output::write_exception(out, error) {
        warn!(error = %e, "Failed to write exception line");
    }
    Outcome::Failed
}
