use streams_proto::{JobId, Operation, ResourceRef};

use super::{decode, ManagementTransport};
use crate::error::CliError;

/// Client stub for a registered job.
#[derive(Debug)]
pub struct JobClient<'a, T> {
    transport: &'a T,
    target: ResourceRef,
    job_id: JobId,
}

impl<'a, T: ManagementTransport + Sync> JobClient<'a, T> {
    pub(crate) const fn new(transport: &'a T, target: ResourceRef, job_id: JobId) -> Self {
        Self {
            transport,
            target,
            job_id,
        }
    }

    /// Job id.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    async fn call(&self, operation: Operation) -> Result<serde_json::Value, CliError> {
        self.transport.invoke(self.target.clone(), operation).await
    }

    /// Job name.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn name(&self) -> Result<String, CliError> {
        decode("get_name", self.call(Operation::GetName).await?)
    }

    /// URL of a full status snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn status_snapshot_url(&self) -> Result<String, CliError> {
        decode("snapshot", self.call(Operation::full_snapshot()).await?)
    }

    /// URL of a metrics snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn metrics_snapshot_url(&self) -> Result<String, CliError> {
        decode("snapshot_metrics", self.call(Operation::SnapshotMetrics).await?)
    }

    /// URL of a freshly packaged application log archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn logs_url(&self) -> Result<String, CliError> {
        decode(
            "retrieve_application_log_and_trace_files",
            self.call(Operation::RetrieveApplicationLogAndTraceFiles).await?,
        )
    }
}
