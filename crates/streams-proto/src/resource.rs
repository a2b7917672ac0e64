//! References to addressable resources on the management service.
//!
//! A [`ResourceRef`] names one remote object: a domain, an instance inside
//! it, a job inside an instance, the domain's host resource manager, or a
//! single host. References are plain values; resolving one costs nothing on
//! the client and a fresh reference is built for every call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::JobId;
use crate::ProtoError;

/// Address of a remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceRef {
    /// A domain.
    Domain {
        /// Domain name.
        domain: String,
    },
    /// An instance within a domain.
    Instance {
        /// Domain name.
        domain: String,
        /// Instance name.
        instance: String,
    },
    /// A job within an instance.
    Job {
        /// Domain name.
        domain: String,
        /// Instance name.
        instance: String,
        /// Job id.
        job_id: JobId,
    },
    /// The host resource manager of a domain.
    HostResourceManager {
        /// Domain name.
        domain: String,
    },
    /// A single host known to a domain.
    Host {
        /// Domain name.
        domain: String,
        /// Host name.
        host: String,
    },
}

impl ResourceRef {
    /// Reference a domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain name is empty.
    pub fn domain(domain: &str) -> Result<Self, ProtoError> {
        Ok(Self::Domain {
            domain: non_empty("domain", domain)?,
        })
    }

    /// Reference an instance.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is empty.
    pub fn instance(domain: &str, instance: &str) -> Result<Self, ProtoError> {
        Ok(Self::Instance {
            domain: non_empty("domain", domain)?,
            instance: non_empty("instance", instance)?,
        })
    }

    /// Reference a job.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is empty.
    pub fn job(domain: &str, instance: &str, job_id: JobId) -> Result<Self, ProtoError> {
        Ok(Self::Job {
            domain: non_empty("domain", domain)?,
            instance: non_empty("instance", instance)?,
            job_id,
        })
    }

    /// Reference the host resource manager of a domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain name is empty.
    pub fn host_resource_manager(domain: &str) -> Result<Self, ProtoError> {
        Ok(Self::HostResourceManager {
            domain: non_empty("domain", domain)?,
        })
    }

    /// Reference a host.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is empty.
    pub fn host(domain: &str, host: &str) -> Result<Self, ProtoError> {
        Ok(Self::Host {
            domain: non_empty("domain", domain)?,
            host: non_empty("host", host)?,
        })
    }

    /// Domain the resource belongs to.
    #[must_use]
    pub fn domain_name(&self) -> &str {
        match self {
            Self::Domain { domain }
            | Self::Instance { domain, .. }
            | Self::Job { domain, .. }
            | Self::HostResourceManager { domain }
            | Self::Host { domain, .. } => domain,
        }
    }

    /// Short kind name, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Domain { .. } => "domain",
            Self::Instance { .. } => "instance",
            Self::Job { .. } => "job",
            Self::HostResourceManager { .. } => "resource_manager",
            Self::Host { .. } => "resource",
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain { domain } => write!(f, "streams.domain:name={domain}"),
            Self::Instance { domain, instance } => {
                write!(f, "streams.instance:domain={domain},name={instance}")
            }
            Self::Job {
                domain,
                instance,
                job_id,
            } => write!(f, "streams.job:domain={domain},instance={instance},id={job_id}"),
            Self::HostResourceManager { domain } => {
                write!(f, "streams.resource_manager:domain={domain},type=streams")
            }
            Self::Host { domain, host } => write!(f, "streams.resource:domain={domain},name={host}"),
        }
    }
}

fn non_empty(what: &str, value: &str) -> Result<String, ProtoError> {
    if value.is_empty() {
        return Err(ProtoError::InvalidResource(format!("{what} name is empty")));
    }
    Ok(value.to_string())
}
