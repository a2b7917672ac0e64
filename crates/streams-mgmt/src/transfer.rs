//! Artifact transfer over HTTPS.
//!
//! Bundles are pushed to the URL the service hands out at deployment time;
//! log archives and snapshots are pulled from URLs it returns. The service
//! uses self-signed certificates, so the trust policy is configurable and
//! by default accepts any certificate and any hostname. The policy is fixed
//! when the [`ArtifactTransfer`] is built and applies to that client only.

use std::path::{Path, PathBuf};

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use crate::error::CliError;

/// Content type of application bundles.
pub const BUNDLE_CONTENT_TYPE: &str = "application/x-jar";

/// Default transfer block size.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// HTTPS trust policy and streaming parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    /// Accept any server certificate.
    pub accept_invalid_certs: bool,
    /// Accept certificates whose hostname does not match.
    pub accept_invalid_hostnames: bool,
    /// Read size for uploads.
    pub block_size: usize,
    /// Allow `http://` URLs in addition to `https://`.
    pub allow_plain_http: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            accept_invalid_hostnames: true,
            block_size: DEFAULT_BLOCK_SIZE,
            allow_plain_http: false,
        }
    }
}

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Local file to remote URL.
    Upload,
    /// Remote URL to local file.
    Download,
}

/// A completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    /// Local file.
    pub local_path: PathBuf,
    /// Remote URL.
    pub remote_url: Url,
    /// Direction.
    pub direction: TransferDirection,
    /// Bytes moved.
    pub content_length: u64,
}

/// HTTPS client for bundle uploads, log downloads and snapshot reads.
#[derive(Debug, Clone)]
pub struct ArtifactTransfer {
    client: Client,
    config: TransportConfig,
}

impl ArtifactTransfer {
    /// Build the HTTP client for a trust policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: TransportConfig) -> Result<Self, CliError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .danger_accept_invalid_hostnames(config.accept_invalid_hostnames)
            .build()?;
        Ok(Self { client, config })
    }

    /// Parse a URL and check its scheme against the policy.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Transfer`] for an unparseable URL or a scheme the
    /// policy does not allow.
    pub fn check_url(&self, raw: &str) -> Result<Url, CliError> {
        let url = Url::parse(raw).map_err(|e| CliError::Transfer(format!("Invalid URL '{raw}': {e}")))?;
        match url.scheme() {
            "https" => Ok(url),
            "http" if self.config.allow_plain_http => Ok(url),
            scheme => Err(CliError::Transfer(format!(
                "Unsupported URL scheme '{scheme}' in {raw}"
            ))),
        }
    }

    /// PUT a local file to `target`.
    ///
    /// The request carries the exact file size as `Content-Length` and the
    /// body is streamed in `block_size` pieces. Anything but `200 OK` fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the request fails, or the
    /// server answers with another status.
    pub async fn upload(&self, local: &Path, target: &str) -> Result<TransferDescriptor, CliError> {
        let url = self.check_url(target)?;
        let file = File::open(local).await?;
        let length = file.metadata().await?.len();
        debug!(file = %local.display(), %url, length, "uploading bundle");

        let body = Body::wrap_stream(ReaderStream::with_capacity(file, self.config.block_size));
        let response = self
            .client
            .put(url.clone())
            .header(CONTENT_TYPE, BUNDLE_CONTENT_TYPE)
            .header(CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CliError::Transfer(format!(
                "Unexpected response code pushing bundle file:  {}",
                status.as_u16()
            )));
        }

        debug!(file = %local.display(), length, "bundle uploaded");
        Ok(TransferDescriptor {
            local_path: local.to_path_buf(),
            remote_url: url,
            direction: TransferDirection::Upload,
            content_length: length,
        })
    }

    /// GET `source` and write the body to `local`.
    ///
    /// A failure part way leaves a truncated file behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// or the file cannot be written.
    pub async fn download(&self, source: &str, local: &Path) -> Result<TransferDescriptor, CliError> {
        let url = self.check_url(source)?;
        debug!(%url, file = %local.display(), "downloading");

        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::Transfer(format!(
                "Unexpected response code retrieving file:  {}",
                status.as_u16()
            )));
        }

        let mut file = File::create(local).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(file = %local.display(), bytes = written, "download complete");
        Ok(TransferDescriptor {
            local_path: local.to_path_buf(),
            remote_url: url,
            direction: TransferDirection::Download,
            content_length: written,
        })
    }

    /// GET `url` and return the body verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    pub async fn fetch_text(&self, url: &str) -> Result<String, CliError> {
        let url = self.check_url(url)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::Transfer(format!(
                "Unexpected response code reading snapshot:  {}",
                status.as_u16()
            )));
        }
        Ok(response.text().await?)
    }
}
