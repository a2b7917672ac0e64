//! Test helpers: an in-process management service and artifact server.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rcgen::CertifiedKey;
use streams_proto::{
    error_codes, ClientMessage, DeployInformation, JobId, Operation, ResourceRef, ServerMessage,
    PROTOCOL_VERSION,
};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_native_tls::{native_tls, TlsAcceptor};
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};

/// Default test timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Password the mock service refuses.
pub const REJECTED_PASSWORD: &str = "wrong";

/// Job id handed out by `submit_job`.
pub const SUBMITTED_JOB_ID: u64 = 42;

/// What the mock service reports.
#[derive(Debug, Clone)]
pub struct DomainFixture {
    pub domain: String,
    pub instances: Vec<String>,
    pub jobs: BTreeMap<u64, String>,
    pub hosts: Vec<String>,
    pub tags: Vec<String>,
    pub keep_alive_secs: Option<u64>,
    /// Base URL for snapshot, log and upload URLs.
    pub artifact_base: String,
}

impl DomainFixture {
    pub fn new(artifact_base: &str) -> Self {
        Self {
            domain: "d1".into(),
            instances: vec!["i1".into()],
            jobs: BTreeMap::from([(1, "foo".into()), (2, "bar".into())]),
            hosts: vec!["h1".into(), "h2".into()],
            tags: vec!["gpu".into()],
            keep_alive_secs: None,
            artifact_base: artifact_base.trim_end_matches('/').to_string(),
        }
    }
}

/// Counters and recorded calls.
#[derive(Debug, Default)]
pub struct ServiceLog {
    pub sessions_opened: AtomicUsize,
    pub keep_alives: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub invocations: Mutex<Vec<(ResourceRef, Operation)>>,
}

impl ServiceLog {
    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn keep_alives(&self) -> usize {
        self.keep_alives.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.sessions_closed.load(Ordering::SeqCst)
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.invocations
            .lock()
            .expect("log lock")
            .iter()
            .map(|(_, op)| op.name())
            .collect()
    }

    pub fn invocations(&self) -> Vec<(ResourceRef, Operation)> {
        self.invocations.lock().expect("log lock").clone()
    }
}

/// Mock management service that manages its own lifecycle.
pub struct MockService {
    pub addr: SocketAddr,
    pub log: Arc<ServiceLog>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockService {
    /// Start on an available port.
    pub async fn start(fixture: DomainFixture) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let log = Arc::new(ServiceLog::default());
        let fixture = Arc::new(fixture);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let server_log = Arc::clone(&log);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        tokio::spawn(serve_session(stream, Arc::clone(&fixture), Arc::clone(&server_log)));
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self {
            addr,
            log,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// WebSocket URL of the service.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Bare `host:port`, as found in a coordination string.
    pub fn host_port(&self) -> String {
        self.addr.to_string()
    }

    /// Shutdown the service.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = timeout(Duration::from_secs(2), handle).await;
        }
    }
}

async fn serve_session(stream: TcpStream, fixture: Arc<DomainFixture>, log: Arc<ServiceLog>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(Ok(frame)) = ws.next().await {
        let WsMessage::Text(text) = frame else {
            continue;
        };
        let Ok(request) = ClientMessage::from_json(&text) else {
            let reply = ServerMessage::error(error_codes::INVALID_REQUEST, "undecodable request");
            let _ = ws.send(WsMessage::Text(reply.to_json().expect("encode reply"))).await;
            continue;
        };

        let reply = match request {
            ClientMessage::Hello { .. } => ServerMessage::Welcome {
                server_version: "mock-1.0".into(),
                protocol_version: PROTOCOL_VERSION,
            },
            ClientMessage::Login { password, .. } if password == REJECTED_PASSWORD => {
                ServerMessage::error(error_codes::UNAUTHORIZED, "Login failed")
            }
            ClientMessage::Login { .. } => {
                let n = log.sessions_opened.fetch_add(1, Ordering::SeqCst) + 1;
                ServerMessage::SessionOpened {
                    session_id: format!("s-{n}"),
                    keep_alive_secs: None,
                }
            }
            ClientMessage::OpenSession { domain, .. } if domain != fixture.domain => {
                ServerMessage::error(error_codes::NOT_FOUND, format!("Domain {domain} not found"))
            }
            ClientMessage::OpenSession { .. } => {
                let n = log.sessions_opened.fetch_add(1, Ordering::SeqCst) + 1;
                ServerMessage::SessionOpened {
                    session_id: format!("s-{n}"),
                    keep_alive_secs: fixture.keep_alive_secs,
                }
            }
            ClientMessage::KeepAlive { .. } => {
                log.keep_alives.fetch_add(1, Ordering::SeqCst);
                ServerMessage::KeepAliveAck
            }
            ClientMessage::CloseSession { .. } => {
                log.sessions_closed.fetch_add(1, Ordering::SeqCst);
                ServerMessage::SessionClosed
            }
            ClientMessage::Invoke {
                request_id,
                target,
                operation,
                ..
            } => {
                log.invocations
                    .lock()
                    .expect("log lock")
                    .push((target.clone(), operation.clone()));
                match respond(&fixture, &target, &operation) {
                    Ok(value) => ServerMessage::Result { request_id, value },
                    Err((code, message)) => ServerMessage::Error {
                        code,
                        message,
                        request_id: Some(request_id),
                    },
                }
            }
        };

        if ws.send(WsMessage::Text(reply.to_json().expect("encode reply"))).await.is_err() {
            break;
        }
    }
}

fn respond(fixture: &DomainFixture, target: &ResourceRef, operation: &Operation) -> Result<Value, (u32, String)> {
    if target.domain_name() != fixture.domain {
        return Err((error_codes::NOT_FOUND, format!("Domain {} not found", target.domain_name())));
    }
    if let ResourceRef::Instance { instance, .. } | ResourceRef::Job { instance, .. } = target {
        if !fixture.instances.contains(instance) {
            return Err((error_codes::NOT_FOUND, format!("Instance {instance} not found")));
        }
    }

    let base = &fixture.artifact_base;
    let job = |id: JobId| {
        fixture
            .jobs
            .get(&id.get())
            .cloned()
            .ok_or((error_codes::NOT_FOUND, format!("Job {id} not found")))
    };

    Ok(match (target, operation) {
        (_, Operation::GetStatus) => json!("running"),
        (_, Operation::GetInstances) => json!(fixture.instances),
        (_, Operation::GetJobs) => json!(fixture.jobs.keys().copied().collect::<Vec<u64>>()),
        (_, Operation::RegisterJob { job_id }) => {
            job(*job_id)?;
            Value::Null
        }
        (ResourceRef::Job { job_id, .. }, Operation::GetName) => json!(job(*job_id)?),
        (ResourceRef::Job { job_id, .. }, Operation::Snapshot { .. }) => json!(format!("{base}/snapshot/{job_id}")),
        (ResourceRef::Job { job_id, .. }, Operation::SnapshotMetrics) => json!(format!("{base}/metrics/{job_id}")),
        (ResourceRef::Job { job_id, .. }, Operation::RetrieveApplicationLogAndTraceFiles) => {
            json!(format!("{base}/logs/job-{job_id}.tgz"))
        }
        (_, Operation::RetrieveProductLogAndTraceFiles) => json!(format!("{base}/logs/domain.tgz")),
        (_, Operation::DeployApplication { bundle_name }) => serde_json::to_value(DeployInformation {
            application_id: format!("app-{bundle_name}"),
            uri: format!("{base}/upload/{bundle_name}"),
        })
        .expect("encode deploy information"),
        (_, Operation::SubmitJob { .. }) => json!(SUBMITTED_JOB_ID),
        (_, Operation::GetDomainHosts) => json!(fixture.hosts),
        (_, Operation::GetTags) => json!(fixture.tags),
        (_, Operation::CancelJob { job_id, .. }) => {
            job(*job_id)?;
            Value::Null
        }
        _ => Value::Null,
    })
}

/// One request received by the artifact server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// Minimal HTTP/1.1 server standing in for the artifact endpoints.
///
/// - `PUT /upload/...` answers `upload_status`
/// - `GET /snapshot/<id>` and `GET /metrics/<id>` answer a small JSON text
/// - `GET /logs/...` answers `log_body`
pub struct ArtifactServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    tls: bool,
    handle: JoinHandle<()>,
}

impl ArtifactServer {
    pub async fn start(upload_status: u16, log_body: Vec<u8>) -> Self {
        Self::bind(upload_status, log_body, None).await
    }

    /// Same endpoints over HTTPS, with a self-signed certificate issued for
    /// `host` only. Clients reach it by IP, so the hostname never matches.
    pub async fn start_tls(upload_status: u16, log_body: Vec<u8>, host: &str) -> Self {
        let CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec![host.to_string()]).expect("certificate");
        let identity = native_tls::Identity::from_pkcs8(
            cert.pem().as_bytes(),
            key_pair.serialize_pem().as_bytes(),
        )
        .expect("identity");
        let acceptor = native_tls::TlsAcceptor::new(identity).expect("tls acceptor");
        Self::bind(upload_status, log_body, Some(TlsAcceptor::from(acceptor))).await
    }

    async fn bind(upload_status: u16, log_body: Vec<u8>, acceptor: Option<TlsAcceptor>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log_body = Arc::new(log_body);
        let tls = acceptor.is_some();

        let recorded = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let log_body = Arc::clone(&log_body);
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    match acceptor {
                        Some(acceptor) => {
                            // A client refusing the certificate ends the handshake here.
                            if let Ok(stream) = acceptor.accept(stream).await {
                                let _ = serve_http(stream, upload_status, &log_body, &recorded).await;
                            }
                        }
                        None => {
                            let _ = serve_http(stream, upload_status, &log_body, &recorded).await;
                        }
                    }
                });
            }
        });

        Self { addr, requests, tls, handle }
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{scheme}://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

/// Body served for `GET /snapshot/<id>`.
pub fn status_snapshot(job_id: &str) -> String {
    format!("{{\"job\":\"{job_id}\",\"health\":\"healthy\"}}")
}

/// Body served for `GET /metrics/<id>`.
pub fn metrics_snapshot(job_id: &str) -> String {
    format!("{{\"job\":\"{job_id}\",\"tuplesProcessed\":100}}")
}

async fn serve_http<S>(
    mut stream: S,
    upload_status: u16,
    log_body: &[u8],
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let head_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let headers: BTreeMap<String, String> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buf[head_end..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    recorded.lock().expect("requests lock").push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        headers,
        body,
    });

    let (status, payload): (u16, Vec<u8>) = match (method.as_str(), path.as_str()) {
        ("PUT", p) if p.starts_with("/upload/") => (upload_status, Vec::new()),
        ("GET", p) if p.starts_with("/snapshot/") => (200, status_snapshot(&p["/snapshot/".len()..]).into_bytes()),
        ("GET", p) if p.starts_with("/metrics/") => (200, metrics_snapshot(&p["/metrics/".len()..]).into_bytes()),
        ("GET", p) if p.starts_with("/logs/") => (200, log_body.to_vec()),
        _ => (404, b"not found".to_vec()),
    };

    let mut response = format!(
        "HTTP/1.1 {status} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reason(status),
        payload.len()
    )
    .into_bytes();
    response.extend_from_slice(&payload);
    stream.write_all(&response).await?;
    stream.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Config file pointing at the mock servers: plain `ws` for bare entries and
/// plain HTTP for transfers.
pub fn test_config(extra: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    write!(
        file,
        "[connection]\nconnect_timeout_secs = 5\ndefault_scheme = \"ws\"\n\n[transfer]\nallow_plain_http = true\n\n{extra}"
    )
    .expect("failed to write temp file");
    file
}

/// Deterministic binary payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
