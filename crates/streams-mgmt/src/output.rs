//! Output formatting.
//!
//! Standard output carries exactly one of: a JSON document, nothing, or a
//! single `EXCEPTION:<message>` line. Diagnostics and logs go to standard
//! error.

use std::io::{self, Write};

use serde::Serialize;
use streams_proto::JobId;

use crate::cli::Format;
use crate::error::CliError;

/// Prefix of the failure line on standard output.
pub const EXCEPTION_PREFIX: &str = "EXCEPTION:";

/// Result document of `submitJob`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    /// Id of the new job.
    pub job_id: JobId,
}

/// Writes JSON documents in the selected format.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + ?Sized,
    {
        match self.format {
            Format::Json => serde_json::to_writer(&mut *writer, value),
            Format::Pretty => serde_json::to_writer_pretty(&mut *writer, value),
        }
        .map_err(io::Error::from)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// Write the `EXCEPTION:` line for a failed action.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_exception<W: Write>(writer: &mut W, error: &CliError) -> io::Result<()> {
    writeln!(writer, "{EXCEPTION_PREFIX}{error}")?;
    writer.flush()
}

/// Write usage diagnostics and the usage text.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_usage<W: Write>(writer: &mut W, diagnostics: &str, usage: &str) -> io::Result<()> {
    if !diagnostics.is_empty() {
        writeln!(writer, "{diagnostics}")?;
        writeln!(writer)?;
    }
    write!(writer, "{usage}")?;
    writer.flush()
}
