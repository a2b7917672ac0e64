//! Data types shared between the client and the management service.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Identifier of a job within an instance.
///
/// Serialized as a bare JSON number. When used as a map key `serde_json`
/// renders it as a string, which is what the aggregated job documents need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Create a job id from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| ProtoError::Decoding(format!("invalid job id '{s}': {e}")))
    }
}

/// Deployment descriptor returned when an application bundle is registered
/// with an instance.
///
/// The bundle bytes must be uploaded to `uri` before `application_id` can be
/// submitted as a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployInformation {
    /// Identifier to pass to the submit call.
    pub application_id: String,
    /// Upload endpoint for the bundle bytes.
    pub uri: String,
}

/// A request for a block of hosts when creating an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSpecification {
    /// Number of hosts.
    pub count: u32,
    /// Tags every host in the block must carry.
    pub tags: BTreeSet<String>,
    /// Whether the hosts are reserved for this instance.
    pub exclusive: bool,
}

impl ResourceSpecification {
    /// Create a resource specification.
    #[must_use]
    pub fn new<I, S>(count: u32, tags: I, exclusive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            count,
            tags: tags.into_iter().map(Into::into).collect(),
            exclusive,
        }
    }
}
