use std::collections::BTreeMap;

use streams_proto::{Operation, ResourceRef, ResourceSpecification};
use tracing::info;

use super::{decode, ManagementTransport};
use crate::error::CliError;

/// Client stub for a domain.
#[derive(Debug)]
pub struct DomainClient<'a, T> {
    transport: &'a T,
    target: ResourceRef,
}

impl<'a, T: ManagementTransport + Sync> DomainClient<'a, T> {
    pub(crate) const fn new(transport: &'a T, target: ResourceRef) -> Self {
        Self { transport, target }
    }

    async fn call(&self, operation: Operation) -> Result<serde_json::Value, CliError> {
        self.transport.invoke(self.target.clone(), operation).await
    }

    /// Domain status.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn status(&self) -> Result<String, CliError> {
        decode("get_status", self.call(Operation::GetStatus).await?)
    }

    /// Names of the domain's instances.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn instances(&self) -> Result<Vec<String>, CliError> {
        decode("get_instances", self.call(Operation::GetInstances).await?)
    }

    /// Create an instance. Empty property and resource collections are
    /// sent as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn make_instance(
        &self,
        instance: &str,
        admin_group: Option<&str>,
        user_group: Option<&str>,
        properties: BTreeMap<String, String>,
        resources: Vec<ResourceSpecification>,
    ) -> Result<(), CliError> {
        let operation = Operation::MakeInstance {
            instance: instance.to_string(),
            admin_group: admin_group.map(str::to_string),
            user_group: user_group.map(str::to_string),
            properties: (!properties.is_empty()).then_some(properties),
            resources: (!resources.is_empty()).then_some(resources),
        };
        self.call(operation).await?;
        info!(domain = self.target.domain_name(), instance, "Instance created");
        Ok(())
    }

    /// URL of a freshly packaged product log archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    pub async fn logs_url(&self) -> Result<String, CliError> {
        decode(
            "retrieve_product_log_and_trace_files",
            self.call(Operation::RetrieveProductLogAndTraceFiles).await?,
        )
    }
}
