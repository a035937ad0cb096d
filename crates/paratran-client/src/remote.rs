//! HTTP client for a remote paratran service.

use std::path::Path;
use std::time::Duration;

use paratran_core::{DecodingRequest, HealthStatus, TranscriptionResult, validate_input};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::DispatchError;

/// Connect timeout; requests themselves are unbounded since inference on
/// long audio can take minutes.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the `/health` and `/transcribe` endpoints.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    base_url: String,
    http: reqwest::Client,
}

impl RemoteClient {
    /// Client for the service at `base_url` (trailing slashes ignored).
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .user_agent(concat!("paratran/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Normalised base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, DispatchError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.connection(&e))?;
        self.decode(response).await
    }

    /// Upload the file at `path` to `POST /transcribe` with `request` as
    /// query parameters.
    ///
    /// Missing files and unsupported extensions are rejected locally before
    /// any bytes are sent.
    #[instrument(skip(self, request), fields(server = %self.base_url, file = %path.display()))]
    pub async fn transcribe(
        &self,
        path: &Path,
        request: &DecodingRequest,
    ) -> Result<TranscriptionResult, DispatchError> {
        validate_input(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(paratran_core::TranscribeError::from)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "audio".to_string(), |n| n.to_string_lossy().into_owned());
        debug!(bytes = bytes.len(), "uploading");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));
        let response = self
            .http
            .post(format!("{}/transcribe", self.base_url))
            .query(request)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.connection(&e))?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, DispatchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.bytes().await.map_err(|e| self.connection(&e))?;
        serde_json::from_slice(&body).map_err(|e| DispatchError::InvalidResponse {
            url: self.base_url.clone(),
            message: e.to_string(),
        })
    }

    fn connection(&self, error: &reqwest::Error) -> DispatchError {
        DispatchError::Connection {
            url: self.base_url.clone(),
            message: error.to_string(),
        }
    }
}
