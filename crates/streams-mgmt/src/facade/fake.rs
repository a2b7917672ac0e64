//! In-memory transport for unit tests.

use std::sync::Mutex;

use serde_json::Value;
use streams_proto::{Operation, ResourceRef};

use super::ManagementTransport;
use crate::error::CliError;

type Responder = Box<dyn Fn(&ResourceRef, &Operation) -> Result<Value, CliError> + Send + Sync>;

/// Answers every call through a closure and records it.
pub(crate) struct FakeTransport {
    respond: Responder,
    calls: Mutex<Vec<(ResourceRef, Operation)>>,
}

impl FakeTransport {
    pub(crate) fn new<F>(respond: F) -> Self
    where
        F: Fn(&ResourceRef, &Operation) -> Result<Value, CliError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(ResourceRef, Operation)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl ManagementTransport for FakeTransport {
    async fn invoke(&self, target: ResourceRef, operation: Operation) -> Result<Value, CliError> {
        let result = (self.respond)(&target, &operation);
        self.calls.lock().expect("calls lock").push((target, operation));
        result
    }
}
