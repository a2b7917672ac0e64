//! Nested info documents for the read actions.
//!
//! ```json
//! {
//!   "domainInfo":   {"status": "running", "instances": ["i1"]},
//!   "instanceInfo": {"status": "running", "jobs": [1, 2]},
//!   "jobInfo": {
//!     "1": {"jobStatusInfoRaw": "...", "jobMetricInfoRaw": "..."}
//!   }
//! }
//! ```
//!
//! The raw snapshot payloads are embedded as strings, exactly as read.

use std::collections::BTreeMap;

use serde::Serialize;
use streams_proto::JobId;
use tracing::debug;

use crate::error::CliError;
use crate::facade::{InstanceClient, JobClient, ManagementTransport, ResourceFacade};

/// Domain level of an info document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainInfo {
    /// Domain status.
    pub status: String,
    /// Instance names.
    pub instances: Vec<String>,
}

/// Instance level of an info document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    /// Instance status.
    pub status: String,
    /// Job ids.
    pub jobs: Vec<JobId>,
}

/// Raw snapshots of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// Status snapshot, verbatim.
    pub job_status_info_raw: String,
    /// Metrics snapshot, verbatim.
    pub job_metric_info_raw: String,
}

/// Output of the read actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDocument {
    /// Always present.
    pub domain_info: DomainInfo,
    /// Present for instance and job queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_info: Option<InstanceInfo>,
    /// Present for job queries, keyed by job id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_info: Option<BTreeMap<JobId, JobInfo>>,
}

/// Domain status and instances.
///
/// # Errors
///
/// Returns the first failing call's error.
pub async fn domain_info<T>(facade: &ResourceFacade<'_, T>, domain: &str) -> Result<InfoDocument, CliError>
where
    T: ManagementTransport + Sync,
{
    Ok(InfoDocument {
        domain_info: domain_level(facade, domain).await?,
        instance_info: None,
        job_info: None,
    })
}

/// Domain and instance levels.
///
/// # Errors
///
/// Returns the first failing call's error.
pub async fn instance_info<T>(
    facade: &ResourceFacade<'_, T>,
    domain: &str,
    instance: &str,
) -> Result<InfoDocument, CliError>
where
    T: ManagementTransport + Sync,
{
    let domain_info = domain_level(facade, domain).await?;
    let instance = facade.instance(domain, instance)?;
    Ok(InfoDocument {
        domain_info,
        instance_info: Some(instance_level(&instance).await?),
        job_info: None,
    })
}

/// All three levels for one job.
///
/// # Errors
///
/// Returns the first failing call's error.
pub async fn single_job_info<T>(
    facade: &ResourceFacade<'_, T>,
    domain: &str,
    instance: &str,
    job_id: JobId,
) -> Result<InfoDocument, CliError>
where
    T: ManagementTransport + Sync,
{
    let domain_info = domain_level(facade, domain).await?;
    let instance = facade.instance(domain, instance)?;
    let instance_info = instance_level(&instance).await?;
    let job = instance.job(job_id).await?;
    let info = job_level(facade, &job).await?;

    Ok(InfoDocument {
        domain_info,
        instance_info: Some(instance_info),
        job_info: Some(BTreeMap::from([(job_id, info)])),
    })
}

/// All three levels for every job of an instance, fetched one job at a time.
///
/// # Errors
///
/// Returns the first failing call's error.
pub async fn all_job_info<T>(
    facade: &ResourceFacade<'_, T>,
    domain: &str,
    instance: &str,
) -> Result<InfoDocument, CliError>
where
    T: ManagementTransport + Sync,
{
    let domain_info = domain_level(facade, domain).await?;
    let instance = facade.instance(domain, instance)?;
    let instance_info = instance_level(&instance).await?;

    let mut jobs = BTreeMap::new();
    for &job_id in &instance_info.jobs {
        let job = instance.job(job_id).await?;
        jobs.insert(job_id, job_level(facade, &job).await?);
    }

    Ok(InfoDocument {
        domain_info,
        instance_info: Some(instance_info),
        job_info: Some(jobs),
    })
}

/// All three levels for the first job whose name matches.
///
/// Jobs are resolved and compared one by one in the order the instance
/// lists them.
///
/// # Errors
///
/// Returns [`CliError::NotFound`] when no job has that name.
pub async fn job_info_by_name<T>(
    facade: &ResourceFacade<'_, T>,
    domain: &str,
    instance: &str,
    name: &str,
) -> Result<InfoDocument, CliError>
where
    T: ManagementTransport + Sync,
{
    let domain_info = domain_level(facade, domain).await?;
    let instance = facade.instance(domain, instance)?;
    let instance_info = instance_level(&instance).await?;

    for &job_id in &instance_info.jobs {
        let job = instance.job(job_id).await?;
        if job.name().await? == name {
            debug!(job_id = %job_id, name, "Job found by name");
            let info = job_level(facade, &job).await?;
            return Ok(InfoDocument {
                domain_info,
                instance_info: Some(instance_info),
                job_info: Some(BTreeMap::from([(job_id, info)])),
            });
        }
    }

    Err(CliError::NotFound(format!("Could not find job named {name}")))
}

async fn domain_level<T>(facade: &ResourceFacade<'_, T>, domain: &str) -> Result<DomainInfo, CliError>
where
    T: ManagementTransport + Sync,
{
    let domain = facade.domain(domain)?;
    Ok(DomainInfo {
        status: domain.status().await?,
        instances: domain.instances().await?,
    })
}

async fn instance_level<T>(instance: &InstanceClient<'_, T>) -> Result<InstanceInfo, CliError>
where
    T: ManagementTransport + Sync,
{
    Ok(InstanceInfo {
        status: instance.status().await?,
        jobs: instance.jobs().await?,
    })
}

async fn job_level<'a, T>(facade: &ResourceFacade<'a, T>, job: &JobClient<'a, T>) -> Result<JobInfo, CliError>
where
    T: ManagementTransport + Sync,
{
    Ok(JobInfo {
        job_status_info_raw: facade.job_status_info(job).await?,
        job_metric_info_raw: facade.job_metric_info(job).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::fake::FakeTransport;
    use crate::transfer::{ArtifactTransfer, TransportConfig};
    use serde_json::json;
    use streams_proto::{Operation, ResourceRef};

    fn service() -> FakeTransport {
        FakeTransport::new(|target, op| match (target, op) {
            (_, Operation::GetStatus) => Ok(json!("running")),
            (_, Operation::GetInstances) => Ok(json!(["i1", "i2"])),
            (_, Operation::GetJobs) => Ok(json!([1, 2])),
            (_, Operation::RegisterJob { .. }) => Ok(json!(null)),
            (ResourceRef::Job { job_id, .. }, Operation::GetName) => {
                Ok(json!(if job_id.get() == 1 { "foo" } else { "bar" }))
            }
            (_, op) => Err(CliError::Remote {
                code: 2002,
                message: format!("unexpected {}", op.name()),
            }),
        })
    }

    fn transfer() -> ArtifactTransfer {
        ArtifactTransfer::new(TransportConfig::default()).expect("client")
    }

    #[tokio::test]
    async fn domain_document_has_one_level() {
        let fake = service();
        let transfer = transfer();
        let facade = ResourceFacade::new(&fake, &transfer);

        let doc = domain_info(&facade, "d1").await.expect("info");
        let json = serde_json::to_value(&doc).expect("json");
        assert_eq!(json, json!({"domainInfo": {"status": "running", "instances": ["i1", "i2"]}}));
    }

    #[tokio::test]
    async fn instance_document_has_two_levels() {
        let fake = service();
        let transfer = transfer();
        let facade = ResourceFacade::new(&fake, &transfer);

        let doc = instance_info(&facade, "d1", "i1").await.expect("info");
        let json = serde_json::to_value(&doc).expect("json");
        assert_eq!(json["instanceInfo"], json!({"status": "running", "jobs": [1, 2]}));
        assert!(json.get("jobInfo").is_none());
    }

    #[tokio::test]
    async fn unknown_job_name_is_not_found() {
        let fake = service();
        let transfer = transfer();
        let facade = ResourceFacade::new(&fake, &transfer);

        let err = job_info_by_name(&facade, "d1", "i1", "baz").await.unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
        assert_eq!(err.to_string(), "Could not find job named baz");

        let names = fake
            .calls()
            .iter()
            .filter(|(_, op)| *op == Operation::GetName)
            .count();
        assert_eq!(names, 2);
    }

    #[test]
    fn job_info_keys_are_stringified_ids() {
        let doc = InfoDocument {
            domain_info: DomainInfo {
                status: "running".into(),
                instances: vec![],
            },
            instance_info: None,
            job_info: Some(BTreeMap::from([(
                JobId::new(7),
                JobInfo {
                    job_status_info_raw: "{\"a\":1}".into(),
                    job_metric_info_raw: "m".into(),
                },
            )])),
        };
        let json = serde_json::to_value(&doc).expect("json");
        assert_eq!(json["jobInfo"]["7"]["jobStatusInfoRaw"], "{\"a\":1}");
        assert_eq!(json["jobInfo"]["7"]["jobMetricInfoRaw"], "m");
    }
}
