//! Named remote operations.
//!
//! Each [`Operation`] is invoked against a [`crate::ResourceRef`]; which
//! operations a resource kind understands is decided by the service. The
//! reply value of every operation is documented on its variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{JobId, ResourceSpecification};

/// Snapshot depth meaning "no limit".
pub const SNAPSHOT_FULL_DEPTH: i32 = -1;

/// A remote operation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Operation {
    // ---- domain, instance, job ----
    /// Current status. Replies with a string.
    GetStatus,

    // ---- domain ----
    /// Instance names of a domain. Replies with an array of strings.
    GetInstances,

    /// Create an instance in a domain. Replies with null.
    MakeInstance {
        /// New instance name.
        instance: String,
        /// Administrators group.
        admin_group: Option<String>,
        /// Users group.
        user_group: Option<String>,
        /// Instance properties by property id.
        properties: Option<BTreeMap<String, String>>,
        /// Host blocks to allocate.
        resources: Option<Vec<ResourceSpecification>>,
    },

    /// Package the domain's product logs and traces. Replies with a download URL.
    RetrieveProductLogAndTraceFiles,

    // ---- instance ----
    /// Job ids of an instance. Replies with an array of numbers.
    GetJobs,

    /// Make a job addressable before it is used. Replies with null.
    RegisterJob {
        /// Job to register.
        job_id: JobId,
    },

    /// Register an application bundle by file name. Replies with a
    /// [`crate::DeployInformation`].
    DeployApplication {
        /// Base name of the bundle file.
        bundle_name: String,
    },

    /// Submit a deployed application. Replies with the new job id.
    SubmitJob {
        /// Application id from the deployment descriptor.
        application_id: String,
        /// Submission-time parameters.
        job_params: BTreeMap<String, String>,
        /// Job group.
        job_group: Option<String>,
        /// Job name.
        job_name: Option<String>,
    },

    /// Cancel a job. Replies with null.
    CancelJob {
        /// Job to cancel.
        job_id: JobId,
        /// Cancel without waiting for a clean shutdown.
        force: bool,
    },

    /// Remove the instance. Replies with null.
    Remove,

    /// Start the instance. Replies with null.
    Start,

    /// Stop the instance. Replies with null.
    Stop {
        /// Stop without waiting for jobs to finish.
        force: bool,
    },

    // ---- job ----
    /// Job name. Replies with a string.
    GetName,

    /// Prepare a status snapshot. Replies with the URL to read it from.
    Snapshot {
        /// Maximum depth, [`SNAPSHOT_FULL_DEPTH`] for everything.
        max_depth: i32,
        /// Include static attributes in addition to live state.
        include_static: bool,
    },

    /// Prepare a metrics snapshot. Replies with the URL to read it from.
    SnapshotMetrics,

    /// Package the job's application logs and traces. Replies with a download URL.
    RetrieveApplicationLogAndTraceFiles,

    // ---- host resource manager ----
    /// Add a host to the domain. Replies with null.
    AddDomainHost {
        /// Host name.
        host: String,
    },

    /// Remove a host from the domain. Replies with null.
    RemoveDomainHost {
        /// Host name.
        host: String,
    },

    /// Hosts of the domain. Replies with an array of strings.
    GetDomainHosts,

    /// Tag a host. Replies with null.
    AddTag {
        /// Host name.
        host: String,
        /// Tag name.
        tag: String,
    },

    /// Remove a tag from a host. Replies with null.
    RemoveTag {
        /// Host name.
        host: String,
        /// Tag name.
        tag: String,
    },

    // ---- host ----
    /// Tags on a host. Replies with an array of strings.
    GetTags,
}

impl Operation {
    /// Full status snapshot, no depth limit.
    #[must_use]
    pub const fn full_snapshot() -> Self {
        Self::Snapshot {
            max_depth: SNAPSHOT_FULL_DEPTH,
            include_static: true,
        }
    }

    /// Operation name for logging and error reporting.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetStatus => "get_status",
            Self::GetInstances => "get_instances",
            Self::MakeInstance { .. } => "make_instance",
            Self::RetrieveProductLogAndTraceFiles => "retrieve_product_log_and_trace_files",
            Self::GetJobs => "get_jobs",
            Self::RegisterJob { .. } => "register_job",
            Self::DeployApplication { .. } => "deploy_application",
            Self::SubmitJob { .. } => "submit_job",
            Self::CancelJob { .. } => "cancel_job",
            Self::Remove => "remove",
            Self::Start => "start",
            Self::Stop { .. } => "stop",
            Self::GetName => "get_name",
            Self::Snapshot { .. } => "snapshot",
            Self::SnapshotMetrics => "snapshot_metrics",
            Self::RetrieveApplicationLogAndTraceFiles => "retrieve_application_log_and_trace_files",
            Self::AddDomainHost { .. } => "add_domain_host",
            Self::RemoveDomainHost { .. } => "remove_domain_host",
            Self::GetDomainHosts => "get_domain_hosts",
            Self::AddTag { .. } => "add_tag",
            Self::RemoveTag { .. } => "remove_tag",
            Self::GetTags => "get_tags",
        }
    }

    /// Whether the operation changes state on the service.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::MakeInstance { .. }
                | Self::SubmitJob { .. }
                | Self::CancelJob { .. }
                | Self::Remove
                | Self::Start
                | Self::Stop { .. }
                | Self::AddDomainHost { .. }
                | Self::RemoveDomainHost { .. }
                | Self::AddTag { .. }
                | Self::RemoveTag { .. }
        )
    }
}
