//! # streams-proto
//!
//! Protocol definitions for talking to a stream-processing domain's
//! management service.
//!
//! The management service is reached over a WebSocket. Every frame is a
//! tagged JSON object: the client sends [`ClientMessage`]s and the service
//! answers with [`ServerMessage`]s. Remote work is expressed as an
//! [`Operation`] invoked against a [`ResourceRef`].
//!
//! ```text
//! ┌──────────────┐   ClientMessage    ┌────────────────────┐
//! │ streams-mgmt │───────────────────►│ management service │
//! │              │◄───────────────────│                    │
//! └──────────────┘   ServerMessage    └────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod messages;
pub mod operation;
pub mod resource;
pub mod types;

pub use error::ProtoError;
pub use messages::{error_codes, ClientMessage, ServerMessage, PROTOCOL_VERSION};
pub use operation::Operation;
pub use resource::ResourceRef;
pub use types::{DeployInformation, JobId, ResourceSpecification};
