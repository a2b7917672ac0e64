//! Per-action execution against an open session.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::action::{Action, Field};
use crate::aggregate;
use crate::error::CliError;
use crate::facade::{parse_properties, zip_resources, JobSubmission, ManagementTransport, ResourceFacade};
use crate::output::{OutputFormat, SubmittedJob};
use crate::params::ParameterSet;

/// Run one validated action and write its output.
///
/// Read actions print one JSON document, `submitJob` prints the new job id,
/// every other action prints nothing.
///
/// # Errors
///
/// Returns the first failing step's error; nothing has been written then.
pub async fn execute<T, W>(
    action: Action,
    params: &ParameterSet,
    facade: &ResourceFacade<'_, T>,
    out: &mut W,
    format: OutputFormat,
) -> Result<(), CliError>
where
    T: ManagementTransport + Sync,
    W: Write,
{
    let domain = params.text(Field::Domain)?;
    debug!(action = %action, domain, read_only = action.is_read(), "Executing");

    match action {
        Action::GetDomainInfo => {
            let doc = aggregate::domain_info(facade, domain).await?;
            format.write(out, &doc)?;
        }
        Action::GetInstanceInfo => {
            let doc = aggregate::instance_info(facade, domain, params.text(Field::Instance)?).await?;
            format.write(out, &doc)?;
        }
        Action::GetSingleJobInfo => {
            let doc = aggregate::single_job_info(facade, domain, params.text(Field::Instance)?, params.job_id()?)
                .await?;
            format.write(out, &doc)?;
        }
        Action::GetAllJobInfo => {
            let doc = aggregate::all_job_info(facade, domain, params.text(Field::Instance)?).await?;
            format.write(out, &doc)?;
        }
        Action::GetSingleJobInfoByName => {
            let doc = aggregate::job_info_by_name(
                facade,
                domain,
                params.text(Field::Instance)?,
                params.text(Field::JobName)?,
            )
            .await?;
            format.write(out, &doc)?;
        }
        Action::SubmitJob => {
            let submission = JobSubmission {
                params: params.map(Field::JobParm).cloned().unwrap_or_default(),
                group: params.optional_text(Field::JobGroup).map(str::to_string),
                name: params.optional_text(Field::JobName).map(str::to_string),
            };
            let job_id = facade
                .submit_job(
                    domain,
                    params.text(Field::Instance)?,
                    Path::new(params.text(Field::Bundle)?),
                    submission,
                )
                .await?;
            format.write(out, &SubmittedJob { job_id })?;
        }
        Action::CancelJob => {
            facade
                .instance(domain, params.text(Field::Instance)?)?
                .cancel_job(params.job_id()?, params.flag(Field::Force))
                .await?;
        }
        Action::AddDomainHost => {
            facade.host_manager(domain)?.add_host(params.text(Field::Host)?).await?;
        }
        Action::RemoveDomainHost => {
            facade.host_manager(domain)?.remove_host(params.text(Field::Host)?).await?;
        }
        Action::GetDomainHosts => {
            let hosts = facade.host_manager(domain)?.hosts().await?;
            format.write(out, &hosts)?;
        }
        Action::AddTagToHost => {
            facade
                .host_manager(domain)?
                .add_tag(params.text(Field::Host)?, params.text(Field::Tag)?)
                .await?;
        }
        Action::RemoveTagFromHost => {
            facade
                .host_manager(domain)?
                .remove_tag(params.text(Field::Host)?, params.text(Field::Tag)?)
                .await?;
        }
        Action::GetHostTags => {
            let tags = facade.host(domain, params.text(Field::Host)?)?.tags().await?;
            format.write(out, &tags)?;
        }
        Action::MakeInstance => {
            let properties = parse_properties(params.list(Field::Property))?;
            let resources = zip_resources(
                params.list(Field::ResourceCount),
                params.list(Field::ResourceTags),
                params.list(Field::ResourceExclusive),
            )?;
            facade
                .domain(domain)?
                .make_instance(
                    params.text(Field::Instance)?,
                    params.optional_text(Field::AdminGroup),
                    params.optional_text(Field::UserGroup),
                    properties,
                    resources,
                )
                .await?;
        }
        Action::RemoveInstance => {
            facade.instance(domain, params.text(Field::Instance)?)?.remove().await?;
        }
        Action::StartInstance => {
            facade.instance(domain, params.text(Field::Instance)?)?.start().await?;
        }
        Action::StopInstance => {
            facade
                .instance(domain, params.text(Field::Instance)?)?
                .stop(params.flag(Field::Force))
                .await?;
        }
        Action::GetJobLogs => {
            facade
                .job_logs(
                    domain,
                    params.text(Field::Instance)?,
                    params.job_id()?,
                    Path::new(params.text(Field::LogFile)?),
                )
                .await?;
        }
        Action::GetDomainLogs => {
            facade
                .domain_logs(domain, Path::new(params.text(Field::LogFile)?))
                .await?;
        }
    }

    out.flush()?;
    Ok(())
}
