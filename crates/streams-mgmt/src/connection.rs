//! Management service sessions.
//!
//! # Connection modes
//!
//! - **Credentials**: user name and password against a service URL. The
//!   session lives as long as the socket; nothing runs in the background.
//! - **Token**: coordination string plus domain name, optionally with a
//!   token. The service announces a keep-alive period and the session expires
//!   unless it is refreshed, so a background task sends `keep_alive` on that
//!   period until [`ConnectionManager::disconnect`] cancels and joins it.
//!
//! The socket is shared between foreground calls and the keep-alive task.
//! Each exchange holds the lock from send until its reply arrives, so
//! frames of different exchanges never interleave.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use streams_proto::{ClientMessage, Operation, ResourceRef, ServerMessage, PROTOCOL_VERSION};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{AuthSettings, ConnectionSettings};
use crate::error::CliError;
use crate::facade::ManagementTransport;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SharedStream = Arc<Mutex<WsStream>>;

/// Where and how to open a session.
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// User name and password against a service URL.
    Credentials {
        /// Service URL or coordination string.
        url: String,
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// Domain session located through a coordination string.
    Token {
        /// Comma-separated management endpoints.
        connect_string: String,
        /// Domain to open the session for.
        domain: String,
        /// Optional session token.
        token: Option<String>,
    },
}

impl std::fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credentials { url, username, .. } => f
                .debug_struct("Credentials")
                .field("url", url)
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Token {
                connect_string,
                domain,
                ..
            } => f
                .debug_struct("Token")
                .field("connect_string", connect_string)
                .field("domain", domain)
                .finish_non_exhaustive(),
        }
    }
}

impl ConnectTarget {
    /// Pick the connection mode: credentials when a user name is
    /// configured, token otherwise.
    #[must_use]
    pub fn select(connect_string: &str, domain: &str, auth: &AuthSettings) -> Self {
        match &auth.username {
            Some(username) => Self::Credentials {
                url: connect_string.to_string(),
                username: username.clone(),
                password: auth.password.clone().unwrap_or_default(),
            },
            None => Self::Token {
                connect_string: connect_string.to_string(),
                domain: domain.to_string(),
                token: auth.token.clone(),
            },
        }
    }

    fn locator(&self) -> &str {
        match self {
            Self::Credentials { url, .. } => url,
            Self::Token { connect_string, .. } => connect_string,
        }
    }

    fn open_message(&self) -> ClientMessage {
        match self {
            Self::Credentials {
                username, password, ..
            } => ClientMessage::Login {
                username: username.clone(),
                password: password.clone(),
            },
            Self::Token { domain, token, .. } => ClientMessage::OpenSession {
                domain: domain.clone(),
                token: token.clone(),
            },
        }
    }

    const fn keeps_alive(&self) -> bool {
        matches!(self, Self::Token { .. })
    }
}

/// Expand a coordination string into WebSocket URLs.
///
/// Entries are comma separated. A full `ws://` or `wss://` URL is used as
/// is; a bare `host:port` gets `default_scheme`.
///
/// # Errors
///
/// Returns a validation error for an empty list or an entry with another
/// scheme.
pub fn endpoints(connect_string: &str, default_scheme: &str) -> Result<Vec<String>, CliError> {
    let mut urls = Vec::new();
    for entry in connect_string.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if let Some((scheme, _)) = entry.split_once("://") {
            if scheme != "ws" && scheme != "wss" {
                return Err(CliError::Validation(format!(
                    "invalid management endpoint: {entry}, must start with ws:// or wss://"
                )));
            }
            urls.push(entry.to_string());
        } else {
            urls.push(format!("{default_scheme}://{entry}"));
        }
    }

    if urls.is_empty() {
        return Err(CliError::Validation(format!(
            "no management endpoints in '{connect_string}'"
        )));
    }
    Ok(urls)
}

/// Session timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Time allowed for socket setup and handshake, per endpoint.
    pub connect_timeout: Duration,
    /// Time allowed for one remote call; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Keep-alive period overriding the service's.
    pub keep_alive: Option<Duration>,
    /// Scheme for bare `host:port` entries.
    pub default_scheme: String,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::from(&ConnectionSettings::default())
    }
}

impl From<&ConnectionSettings> for ConnectionOptions {
    fn from(settings: &ConnectionSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            request_timeout: settings.request_timeout(),
            keep_alive: settings.keep_alive(),
            default_scheme: settings.default_scheme.clone(),
        }
    }
}

struct KeepAlive {
    period: Duration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// An open, authenticated session.
pub struct Session {
    ws: SharedStream,
    session_id: String,
    server_version: String,
    request_timeout: Option<Duration>,
    keep_alive: Option<KeepAlive>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("server_version", &self.server_version)
            .field("keep_alive", &self.keep_alive.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session at one endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be opened, the handshake fails
    /// or the service refuses the session.
    pub async fn open(url: &str, target: &ConnectTarget, options: &ConnectionOptions) -> Result<Self, CliError> {
        debug!(url = %url, "Connecting to management service");

        let Handshake {
            ws,
            server_version,
            session_id,
            keep_alive,
        } = timeout(options.connect_timeout, handshake(url, target))
            .await
            .map_err(|_| CliError::Timeout(format!("connecting to {url} timed out")))??;
        debug!(session_id = %session_id, version = %server_version, "Session opened");

        let period = options.keep_alive.or(keep_alive).filter(|_| target.keeps_alive());
        let keep_alive = match period {
            Some(period) if period.is_zero() => {
                warn!(session_id = %session_id, "Zero keep-alive period ignored, session runs without keep-alive");
                None
            }
            Some(period) => Some(spawn_keep_alive(
                Arc::clone(&ws),
                session_id.clone(),
                period,
                options.request_timeout,
            )),
            None => None,
        };

        Ok(Self {
            ws,
            session_id,
            server_version,
            request_timeout: options.request_timeout,
            keep_alive,
        })
    }

    /// Session id assigned by the service.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Version reported by the service.
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Whether a keep-alive task is running.
    #[must_use]
    pub fn has_keep_alive(&self) -> bool {
        self.keep_alive.as_ref().is_some_and(|k| !k.task.is_finished())
    }

    /// Period of the keep-alive task, `None` when the session has none.
    #[must_use]
    pub fn keep_alive_period(&self) -> Option<Duration> {
        self.keep_alive.as_ref().map(|k| k.period)
    }

    /// Invoke an operation and return its result value.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Remote`] when the service reports a failure, and
    /// connection or protocol errors when the exchange breaks.
    pub async fn call(&self, target: ResourceRef, operation: Operation) -> Result<Value, CliError> {
        debug!(target = %target, op = operation.name(), mutating = operation.is_mutating(), "Invoking");
        let request = ClientMessage::invoke(self.session_id.clone(), target, operation);
        match exchange(&self.ws, &request, self.request_timeout).await? {
            ServerMessage::Result { value, .. } => Ok(value),
            other => Err(CliError::Protocol(format!(
                "unexpected response to {}: {other:?}",
                request.request_type()
            ))),
        }
    }

    /// Stop the keep-alive task, close the session and the socket.
    ///
    /// Closing is best effort: the session is gone afterwards either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket close handshake fails.
    pub async fn close(mut self) -> Result<(), CliError> {
        if let Some(keep_alive) = self.keep_alive.take() {
            keep_alive.cancel.cancel();
            if let Err(e) = keep_alive.task.await {
                warn!(error = %e, "Keep-alive task ended abnormally");
            }
        }

        let bye = ClientMessage::CloseSession {
            session_id: self.session_id.clone(),
        };
        if let Err(e) = exchange(&self.ws, &bye, self.request_timeout).await {
            debug!(error = %e, "close_session not acknowledged");
        }

        self.ws
            .lock()
            .await
            .close(None)
            .await
            .map_err(|e| CliError::Connection(e.to_string()))
    }
}

impl ManagementTransport for Session {
    async fn invoke(&self, target: ResourceRef, operation: Operation) -> Result<Value, CliError> {
        self.call(target, operation).await
    }
}

struct Handshake {
    ws: SharedStream,
    server_version: String,
    session_id: String,
    keep_alive: Option<Duration>,
}

async fn handshake(url: &str, target: &ConnectTarget) -> Result<Handshake, CliError> {
    let (ws, _response) = connect_async(url)
        .await
        .map_err(|e| CliError::Connection(e.to_string()))?;
    let ws = Arc::new(Mutex::new(ws));

    debug!("WebSocket connected, sending handshake");
    let server_version = match exchange(&ws, &ClientMessage::hello(env!("CARGO_PKG_VERSION")), None).await? {
        ServerMessage::Welcome {
            server_version,
            protocol_version,
        } => {
            if protocol_version != PROTOCOL_VERSION {
                warn!(
                    server = protocol_version,
                    client = PROTOCOL_VERSION,
                    "Protocol version mismatch"
                );
            }
            server_version
        }
        other => {
            return Err(CliError::Protocol(format!("unexpected response to hello: {other:?}")));
        }
    };

    match exchange(&ws, &target.open_message(), None).await? {
        ServerMessage::SessionOpened {
            session_id,
            keep_alive_secs,
        } => Ok(Handshake {
            ws,
            server_version,
            session_id,
            keep_alive: keep_alive_secs.map(Duration::from_secs),
        }),
        other => Err(CliError::Protocol(format!(
            "unexpected response to session request: {other:?}"
        ))),
    }
}

/// Send one message and wait for its reply.
///
/// Replies belonging to other exchanges are skipped; control frames are
/// handled by the socket.
async fn exchange(ws: &SharedStream, request: &ClientMessage, limit: Option<Duration>) -> Result<ServerMessage, CliError> {
    let request_type = request.request_type();
    let json = request.to_json()?;

    let mut ws = ws.lock().await;
    trace!(request_type, "Sending request");
    ws.send(Message::Text(json))
        .await
        .map_err(|e| CliError::Connection(e.to_string()))?;

    let receive = async {
        loop {
            let frame = ws
                .next()
                .await
                .ok_or_else(|| CliError::Connection("connection closed".into()))?
                .map_err(|e| CliError::Connection(e.to_string()))?;

            let reply = match frame {
                Message::Text(text) => ServerMessage::from_json(&text)?,
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
                Message::Binary(_) => return Err(CliError::Protocol("unexpected binary message".into())),
                Message::Close(_) => {
                    return Err(CliError::Connection("connection closed by server".into()));
                }
            };

            if !answers(request, &reply) {
                debug!(request_type, ?reply, "Skipping unrelated message");
                continue;
            }
            if let ServerMessage::Error { code, message, .. } = reply {
                return Err(CliError::Remote { code, message });
            }
            trace!(request_type, "Received response");
            return Ok(reply);
        }
    };

    match limit {
        Some(limit) => timeout(limit, receive)
            .await
            .map_err(|_| CliError::Timeout(format!("request '{request_type}' timed out")))?,
        None => receive.await,
    }
}

fn answers(request: &ClientMessage, reply: &ServerMessage) -> bool {
    if let ServerMessage::Error { request_id, .. } = reply {
        return request_id.is_none() || *request_id == request.request_id();
    }
    match request {
        ClientMessage::Hello { .. } => matches!(reply, ServerMessage::Welcome { .. }),
        ClientMessage::Login { .. } | ClientMessage::OpenSession { .. } => {
            matches!(reply, ServerMessage::SessionOpened { .. })
        }
        ClientMessage::KeepAlive { .. } => matches!(reply, ServerMessage::KeepAliveAck),
        ClientMessage::Invoke { request_id, .. } => {
            matches!(reply, ServerMessage::Result { request_id: id, .. } if id == request_id)
        }
        ClientMessage::CloseSession { .. } => matches!(reply, ServerMessage::SessionClosed),
    }
}

fn spawn_keep_alive(
    ws: SharedStream,
    session_id: String,
    period: Duration,
    limit: Option<Duration>,
) -> KeepAlive {
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    debug!(period_ms = period.as_millis() as u64, "Starting keep-alive");

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        let ping = ClientMessage::KeepAlive { session_id };
        loop {
            tokio::select! {
                () = stop.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = exchange(&ws, &ping, limit).await {
                        warn!(error = %e, "Keep-alive failed, no further attempts");
                        break;
                    }
                    trace!("Keep-alive acknowledged");
                }
            }
        }
    });

    KeepAlive { period, cancel, task }
}

/// Owns the process's single session.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    options: ConnectionOptions,
    session: Option<Session>,
}

impl ConnectionManager {
    /// Create a manager with no session.
    #[must_use]
    pub const fn new(options: ConnectionOptions) -> Self {
        Self {
            options,
            session: None,
        }
    }

    /// Open a session unless one is already open.
    ///
    /// Endpoints of the coordination string are tried in order; the first
    /// that completes the handshake wins.
    ///
    /// # Errors
    ///
    /// Returns the last endpoint's error if none succeeds.
    pub async fn connect(&mut self, target: &ConnectTarget) -> Result<(), CliError> {
        if self.session.is_some() {
            debug!("Already connected");
            return Ok(());
        }

        let mut last_error = None;
        for url in endpoints(target.locator(), &self.options.default_scheme)? {
            match Session::open(&url, target, &self.options).await {
                Ok(session) => {
                    debug!(
                        url = %url,
                        session_id = session.session_id(),
                        server_version = session.server_version(),
                        keep_alive = ?session.keep_alive_period(),
                        "Connected"
                    );
                    self.session = Some(session);
                    return Ok(());
                }
                Err(e) => {
                    debug!(url = %url, error = %e, "Endpoint failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| CliError::Connection("no endpoint reachable".into())))
    }

    /// Close the session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the socket fails.
    pub async fn disconnect(&mut self) -> Result<(), CliError> {
        match self.session.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }

    /// Whether a session is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// The open session.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::NotConnected`] without one.
    pub fn session(&self) -> Result<&Session, CliError> {
        self.session.as_ref().ok_or(CliError::NotConnected)
    }
}
