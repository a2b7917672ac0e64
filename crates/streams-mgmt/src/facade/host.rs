use streams_proto::{Operation, ResourceRef};
use tracing::info;

use super::{decode, ManagementTransport};
use crate::error::CliError;

/// Client stub for a domain's host resource manager.
#[derive(Debug)]
pub struct HostManagerClient<'a, T> {
    transport: &'a T,
    target: ResourceRef,
}

impl<'a, T: ManagementTransport + Sync> HostManagerClient<'a, T> {
    pub(crate) const fn new(transport: &'a T, target: ResourceRef) -> Self {
        Self { transport, target }
    }

    async fn call(&self, operation: Operation) -> Result<serde_json::Value, CliError> {
        self.transport.invoke(self.target.clone(), operation).await
    }

    /// Add a host to the domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn add_host(&self, host: &str) -> Result<(), CliError> {
        self.call(Operation::AddDomainHost { host: host.to_string() }).await?;
        info!(host, "Host added");
        Ok(())
    }

    /// Remove a host from the domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn remove_host(&self, host: &str) -> Result<(), CliError> {
        self.call(Operation::RemoveDomainHost { host: host.to_string() }).await?;
        info!(host, "Host removed");
        Ok(())
    }

    /// Hosts of the domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn hosts(&self) -> Result<Vec<String>, CliError> {
        decode("get_domain_hosts", self.call(Operation::GetDomainHosts).await?)
    }

    /// Tag a host.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn add_tag(&self, host: &str, tag: &str) -> Result<(), CliError> {
        self.call(Operation::AddTag {
            host: host.to_string(),
            tag: tag.to_string(),
        })
        .await?;
        info!(host, tag, "Tag added");
        Ok(())
    }

    /// Remove a tag from a host.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn remove_tag(&self, host: &str, tag: &str) -> Result<(), CliError> {
        self.call(Operation::RemoveTag {
            host: host.to_string(),
            tag: tag.to_string(),
        })
        .await?;
        info!(host, tag, "Tag removed");
        Ok(())
    }
}

/// Client stub for one host.
#[derive(Debug)]
pub struct HostClient<'a, T> {
    transport: &'a T,
    target: ResourceRef,
}

impl<'a, T: ManagementTransport + Sync> HostClient<'a, T> {
    pub(crate) const fn new(transport: &'a T, target: ResourceRef) -> Self {
        Self { transport, target }
    }

    /// Tags on the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn tags(&self) -> Result<Vec<String>, CliError> {
        decode(
            "get_tags",
            self.transport.invoke(self.target.clone(), Operation::GetTags).await?,
        )
    }
}
