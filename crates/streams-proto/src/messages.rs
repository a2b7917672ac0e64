//! Session and invocation messages.
//!
//! # Message Flow
//!
//! ```text
//! client                                service
//!   │ hello ──────────────────────────────► │
//!   │ ◄────────────────────────────── welcome│
//!   │ login | open_session ───────────────► │
//!   │ ◄─────────────────────── session_opened│
//!   │ invoke ─────────────────────────────► │
//!   │ ◄──────────────────────── result|error │
//!   │ keep_alive (token sessions) ────────► │
//!   │ close_session ──────────────────────► │
//! ```
//!
//! # Example
//!
//! ```rust
//! use streams_proto::{ClientMessage, ServerMessage};
//!
//! let hello = ClientMessage::hello("1.0.0");
//! assert!(hello.to_json().unwrap().contains("\"type\":\"hello\""));
//!
//! let reply = ServerMessage::from_json(
//!     r#"{"type":"session_opened","session_id":"s-1","keep_alive_secs":30}"#,
//! ).unwrap();
//! assert!(matches!(reply, ServerMessage::SessionOpened { .. }));
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::operation::Operation;
use crate::resource::ResourceRef;
use crate::ProtoError;

/// Protocol version spoken by this client.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent from the client to the management service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Handshake.
    Hello {
        /// Client version.
        version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Open a session with a username and password.
    Login {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },

    /// Open a token-authenticated session for a domain.
    OpenSession {
        /// Logical domain name.
        domain: String,
        /// Authentication token, if one was provided to the client.
        token: Option<String>,
    },

    /// Keep a token session from expiring.
    KeepAlive {
        /// Session to refresh.
        session_id: String,
    },

    /// Invoke an operation on a resource.
    Invoke {
        /// Correlates the reply.
        request_id: Uuid,
        /// Session the call belongs to.
        session_id: String,
        /// Target resource.
        target: ResourceRef,
        /// Operation and arguments.
        operation: Operation,
    },

    /// End the session.
    CloseSession {
        /// Session to close.
        session_id: String,
    },
}

/// Messages sent from the management service to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake reply.
    Welcome {
        /// Service version.
        server_version: String,
        /// Protocol version spoken by the service.
        protocol_version: u32,
    },

    /// A session was opened.
    SessionOpened {
        /// Session id to quote in later messages.
        session_id: String,
        /// Keep-alive period in seconds, when the session expires without one.
        keep_alive_secs: Option<u64>,
    },

    /// A keep-alive was accepted.
    KeepAliveAck,

    /// Successful reply to an invoke.
    Result {
        /// Request this reply belongs to.
        request_id: Uuid,
        /// Operation result.
        value: serde_json::Value,
    },

    /// Failure.
    Error {
        /// Error code, see [`error_codes`].
        code: u32,
        /// Error message.
        message: String,
        /// Request this error belongs to, if any.
        request_id: Option<Uuid>,
    },

    /// The session was closed.
    SessionClosed,
}

/// Error codes reported by the management service.
pub mod error_codes {
    /// The addressed resource does not exist.
    pub const NOT_FOUND: u32 = 2001;
    /// The request was malformed.
    pub const INVALID_REQUEST: u32 = 2002;
    /// Authentication failed or the session expired.
    pub const UNAUTHORIZED: u32 = 2003;
    /// The caller may not perform the operation.
    pub const PERMISSION_DENIED: u32 = 2004;
    /// The operation failed on the service.
    pub const OPERATION_FAILED: u32 = 2005;
    /// Internal error.
    pub const INTERNAL_ERROR: u32 = 2006;
}

impl ClientMessage {
    /// Create a hello message.
    #[must_use]
    pub fn hello(version: impl Into<String>) -> Self {
        Self::Hello {
            version: version.into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }

    /// Create an invoke message with a fresh request id.
    #[must_use]
    pub fn invoke(session_id: impl Into<String>, target: ResourceRef, operation: Operation) -> Self {
        Self::Invoke {
            request_id: Uuid::new_v4(),
            session_id: session_id.into(),
            target,
            operation,
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Request type name for error reporting.
    #[must_use]
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Login { .. } => "login",
            Self::OpenSession { .. } => "open_session",
            Self::KeepAlive { .. } => "keep_alive",
            Self::Invoke { operation, .. } => operation.name(),
            Self::CloseSession { .. } => "close_session",
        }
    }

    /// Request id of an invoke message.
    #[must_use]
    pub const fn request_id(&self) -> Option<Uuid> {
        match self {
            Self::Invoke { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }
}

impl ServerMessage {
    /// Create an error reply.
    #[must_use]
    pub fn error(code: u32, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
            request_id: None,
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
