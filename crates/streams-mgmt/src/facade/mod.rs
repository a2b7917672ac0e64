//! Typed access to remote resources.
//!
//! Each resource kind has a small client stub that turns method calls into
//! [`Operation`]s on a [`ResourceRef`]. Stubs are cheap and built fresh for
//! every call; nothing is cached between calls. [`ResourceFacade`] sits on
//! top and implements one operation per action, including the ones that
//! combine remote calls with artifact transfers.

mod domain;
mod host;
mod instance;
mod job;

#[cfg(test)]
pub(crate) mod fake;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use streams_proto::{JobId, Operation, ResourceRef, ResourceSpecification};
use tracing::{debug, info, warn};

use crate::error::CliError;
use crate::transfer::ArtifactTransfer;

pub use domain::DomainClient;
pub use host::{HostClient, HostManagerClient};
pub use instance::{InstanceClient, JobSubmission};
pub use job::JobClient;

/// Carries operations to the management service.
pub trait ManagementTransport {
    /// Invoke `operation` on `target` and return the result value.
    fn invoke(
        &self,
        target: ResourceRef,
        operation: Operation,
    ) -> impl Future<Output = Result<Value, CliError>> + Send;
}

/// Decode an operation result into the expected type.
pub(crate) fn decode<T: DeserializeOwned>(operation: &str, value: Value) -> Result<T, CliError> {
    serde_json::from_value(value)
        .map_err(|e| CliError::Protocol(format!("unexpected result for {operation}: {e}")))
}

/// Parse `name=value` instance properties.
///
/// Each entry must contain exactly one `=` with text on both sides.
/// Trailing empty parts are kept, so `a=b=` is rejected like `a=b=c`.
///
/// # Errors
///
/// Returns a validation error quoting the first malformed entry.
pub fn parse_properties(entries: &[String]) -> Result<BTreeMap<String, String>, CliError> {
    let mut properties = BTreeMap::new();
    for entry in entries {
        let mut parts = entry.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(value), None) if !name.is_empty() && !value.is_empty() => {
                properties.insert(name.to_string(), value.to_string());
            }
            _ => {
                return Err(CliError::Validation(format!(
                    "Format of property name=value not valid:  {entry}"
                )));
            }
        }
    }
    Ok(properties)
}

/// Build resource specifications from the three positional flag lists.
///
/// Lists are correlated by position and cut to the shortest one. Tags are
/// comma separated; exclusivity is set only by the literal `true`.
///
/// # Errors
///
/// Returns a validation error for a count that is not a non-negative integer.
pub fn zip_resources(
    counts: &[String],
    tags: &[String],
    exclusives: &[String],
) -> Result<Vec<ResourceSpecification>, CliError> {
    let usable = counts.len().min(tags.len()).min(exclusives.len());
    if usable < counts.len().max(tags.len()).max(exclusives.len()) {
        warn!(
            counts = counts.len(),
            tags = tags.len(),
            exclusives = exclusives.len(),
            used = usable,
            "Resource specification lists differ in length; extra entries ignored"
        );
    }

    counts
        .iter()
        .zip(tags)
        .zip(exclusives)
        .map(|((count, tags), exclusive)| {
            let count = count
                .parse::<u32>()
                .map_err(|_| CliError::Validation(format!("Invalid resource count:  {count}")))?;
            Ok(ResourceSpecification::new(
                count,
                tags.split(',').filter(|t| !t.is_empty()).map(str::to_string),
                exclusive == "true",
            ))
        })
        .collect()
}

/// One operation per action over a transport and an artifact transfer.
#[derive(Debug)]
pub struct ResourceFacade<'a, T> {
    transport: &'a T,
    transfer: &'a ArtifactTransfer,
}

impl<'a, T: ManagementTransport + Sync> ResourceFacade<'a, T> {
    /// Create a facade.
    #[must_use]
    pub const fn new(transport: &'a T, transfer: &'a ArtifactTransfer) -> Self {
        Self { transport, transfer }
    }

    /// Stub for a domain.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name.
    pub fn domain(&self, domain: &str) -> Result<DomainClient<'a, T>, CliError> {
        Ok(DomainClient::new(self.transport, ResourceRef::domain(domain)?))
    }

    /// Stub for an instance.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name.
    pub fn instance(&self, domain: &str, instance: &str) -> Result<InstanceClient<'a, T>, CliError> {
        Ok(InstanceClient::new(
            self.transport,
            ResourceRef::instance(domain, instance)?,
        ))
    }

    /// Stub for a job; registers the job with its instance first.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails.
    pub async fn job(&self, domain: &str, instance: &str, job_id: JobId) -> Result<JobClient<'a, T>, CliError> {
        self.instance(domain, instance)?.job(job_id).await
    }

    /// Stub for a domain's host resource manager.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name.
    pub fn host_manager(&self, domain: &str) -> Result<HostManagerClient<'a, T>, CliError> {
        Ok(HostManagerClient::new(
            self.transport,
            ResourceRef::host_resource_manager(domain)?,
        ))
    }

    /// Stub for a host.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty name.
    pub fn host(&self, domain: &str, host: &str) -> Result<HostClient<'a, T>, CliError> {
        Ok(HostClient::new(self.transport, ResourceRef::host(domain, host)?))
    }

    /// Deploy a bundle, upload it and submit it as a job.
    ///
    /// The three phases run strictly in order; a failed upload means the job
    /// is never submitted.
    ///
    /// # Errors
    ///
    /// Returns the first phase's error.
    pub async fn submit_job(
        &self,
        domain: &str,
        instance: &str,
        bundle: &Path,
        submission: JobSubmission,
    ) -> Result<JobId, CliError> {
        let instance = self.instance(domain, instance)?;
        let bundle_name = bundle
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CliError::Validation(format!("Invalid bundle path:  {}", bundle.display())))?;

        let descriptor = instance.deploy_application(bundle_name).await?;
        debug!(application = %descriptor.application_id, uri = %descriptor.uri, "Application deployed");

        let pushed = self.transfer.upload(bundle, &descriptor.uri).await?;
        info!(bytes = pushed.content_length, url = %pushed.remote_url, "Bundle pushed");

        let job_id = instance.submit_job(&descriptor.application_id, submission).await?;
        info!(job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    /// Raw status snapshot of a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be prepared or read.
    pub async fn job_status_info(&self, job: &JobClient<'a, T>) -> Result<String, CliError> {
        let url = job.status_snapshot_url().await?;
        self.transfer.fetch_text(&url).await
    }

    /// Raw metrics snapshot of a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be prepared or read.
    pub async fn job_metric_info(&self, job: &JobClient<'a, T>) -> Result<String, CliError> {
        let url = job.metrics_snapshot_url().await?;
        self.transfer.fetch_text(&url).await
    }

    /// Download a job's log archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be prepared or downloaded.
    pub async fn job_logs(&self, domain: &str, instance: &str, job_id: JobId, destination: &Path) -> Result<(), CliError> {
        let url = self.job(domain, instance, job_id).await?.logs_url().await?;
        let fetched = self.transfer.download(&url, destination).await?;
        info!(
            job_id = %job_id,
            file = %fetched.local_path.display(),
            bytes = fetched.content_length,
            "Job logs retrieved"
        );
        Ok(())
    }

    /// Download the domain's log archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be prepared or downloaded.
    pub async fn domain_logs(&self, domain: &str, destination: &Path) -> Result<(), CliError> {
        let url = self.domain(domain)?.logs_url().await?;
        let fetched = self.transfer.download(&url, destination).await?;
        info!(
            domain,
            file = %fetched.local_path.display(),
            bytes = fetched.content_length,
            "Domain logs retrieved"
        );
        Ok(())
    }
}
