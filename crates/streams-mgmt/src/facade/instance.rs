use std::collections::BTreeMap;

use streams_proto::{DeployInformation, JobId, Operation, ResourceRef};
use tracing::{debug, info};

use super::{decode, JobClient, ManagementTransport};
use crate::error::CliError;

/// Submission-time settings of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSubmission {
    /// Submission parameters.
    pub params: BTreeMap<String, String>,
    /// Job group, service default when `None`.
    pub group: Option<String>,
    /// Job name, service default when `None`.
    pub name: Option<String>,
}

/// Client stub for an instance.
#[derive(Debug)]
pub struct InstanceClient<'a, T> {
    transport: &'a T,
    target: ResourceRef,
}

impl<'a, T: ManagementTransport + Sync> InstanceClient<'a, T> {
    pub(crate) const fn new(transport: &'a T, target: ResourceRef) -> Self {
        Self { transport, target }
    }

    async fn call(&self, operation: Operation) -> Result<serde_json::Value, CliError> {
        self.transport.invoke(self.target.clone(), operation).await
    }

    /// Instance status.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn status(&self) -> Result<String, CliError> {
        decode("get_status", self.call(Operation::GetStatus).await?)
    }

    /// Ids of the instance's jobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn jobs(&self) -> Result<Vec<JobId>, CliError> {
        decode("get_jobs", self.call(Operation::GetJobs).await?)
    }

    /// Register a job and return a stub for it.
    ///
    /// # Errors
    ///
    /// Returns an error if registration fails.
    pub async fn job(&self, job_id: JobId) -> Result<JobClient<'a, T>, CliError> {
        self.call(Operation::RegisterJob { job_id }).await?;
        let ResourceRef::Instance { domain, instance } = &self.target else {
            return Err(CliError::Protocol(format!("{} is not an instance", self.target)));
        };
        debug!(job_id = %job_id, "Job registered");
        Ok(JobClient::new(
            self.transport,
            ResourceRef::job(domain, instance, job_id)?,
            job_id,
        ))
    }

    /// Register an application bundle by its file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn deploy_application(&self, bundle_name: &str) -> Result<DeployInformation, CliError> {
        let operation = Operation::DeployApplication {
            bundle_name: bundle_name.to_string(),
        };
        decode("deploy_application", self.call(operation).await?)
    }

    /// Submit a deployed application.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn submit_job(&self, application_id: &str, submission: JobSubmission) -> Result<JobId, CliError> {
        let operation = Operation::SubmitJob {
            application_id: application_id.to_string(),
            job_params: submission.params,
            job_group: submission.group,
            job_name: submission.name,
        };
        decode("submit_job", self.call(operation).await?)
    }

    /// Cancel a job.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn cancel_job(&self, job_id: JobId, force: bool) -> Result<(), CliError> {
        self.call(Operation::CancelJob { job_id, force }).await?;
        info!(job_id = %job_id, force, "Job cancelled");
        Ok(())
    }

    /// Remove the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn remove(&self) -> Result<(), CliError> {
        self.call(Operation::Remove).await?;
        info!(target = %self.target, "Instance removed");
        Ok(())
    }

    /// Start the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn start(&self) -> Result<(), CliError> {
        self.call(Operation::Start).await?;
        info!(target = %self.target, "Instance started");
        Ok(())
    }

    /// Stop the instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn stop(&self, force: bool) -> Result<(), CliError> {
        self.call(Operation::Stop { force }).await?;
        info!(target = %self.target, force, "Instance stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::fake::FakeTransport;
    use serde_json::json;

    #[tokio::test]
    async fn submission_fields_forwarded() {
        let fake = FakeTransport::new(|_, _| Ok(json!(12)));
        let instance = InstanceClient::new(&fake, ResourceRef::instance("d1", "i1").expect("ref"));
        let submission = JobSubmission {
            params: BTreeMap::from([("a".to_string(), "1".to_string())]),
            group: Some("g".into()),
            name: None,
        };

        let job_id = instance.submit_job("app-7", submission).await.expect("submit");
        assert_eq!(job_id, JobId::new(12));
        let Operation::SubmitJob {
            application_id,
            job_params,
            job_group,
            job_name,
        } = &fake.calls()[0].1
        else {
            panic!("expected submit_job");
        };
        assert_eq!(application_id, "app-7");
        assert_eq!(job_params.get("a").map(String::as_str), Some("1"));
        assert_eq!(job_group.as_deref(), Some("g"));
        assert!(job_name.is_none());
    }

    #[tokio::test]
    async fn remote_errors_propagate_unchanged() {
        let fake = FakeTransport::new(|_, _| {
            Err(CliError::Remote {
                code: 2001,
                message: "instance i1 not found".into(),
            })
        });
        let instance = InstanceClient::new(&fake, ResourceRef::instance("d1", "i1").expect("ref"));
        let err = instance.stop(true).await.unwrap_err();
        assert_eq!(err.to_string(), "instance i1 not found (code 2001)");
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn job_ids_decode_from_numbers() {
        let fake = FakeTransport::new(|_, _| Ok(json!([1, 2])));
        let instance = InstanceClient::new(&fake, ResourceRef::instance("d1", "i1").expect("ref"));
        assert_eq!(instance.jobs().await.expect("jobs"), vec![JobId::new(1), JobId::new(2)]);
    }
}
