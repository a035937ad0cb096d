//! Local-or-remote backend selection.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use paratran_core::{DecodingRequest, TranscribeError, Transcriber, TranscriptionResult};
use tracing::info;

use crate::error::DispatchError;
use crate::remote::RemoteClient;

/// Where requests run. Chosen once per process from the presence of a
/// server URL.
#[derive(Clone)]
pub enum Backend {
    /// In-process orchestrator.
    Local(Arc<Transcriber>),
    /// Remote paratran service.
    Remote(RemoteClient),
}

impl Backend {
    /// Remote backend when `server_url` is set, otherwise local.
    pub fn select(server_url: Option<&str>, local: impl FnOnce() -> Arc<Transcriber>) -> Self {
        match server_url {
            Some(url) => Self::Remote(RemoteClient::new(url)),
            None => Self::Local(local()),
        }
    }

    /// Whether this backend forwards to a remote service.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Check that the backend is usable before a batch starts.
    ///
    /// Remote: `GET /health` (unreachable → [`DispatchError::Connection`]).
    /// Local: nothing; the model loads lazily on the first request.
    pub async fn probe(&self) -> Result<(), DispatchError> {
        if let Self::Remote(client) = self {
            let health = client.health().await?;
            info!(
                server = client.base_url(),
                model = %health.model,
                model_dir = ?health.model_dir,
                "remote server ready"
            );
        }
        Ok(())
    }

    /// Transcribe one file.
    ///
    /// Local requests run on a blocking worker so the async runtime keeps
    /// serving other work while the engine computes.
    pub async fn transcribe(
        &self,
        path: &Path,
        request: &DecodingRequest,
    ) -> Result<TranscriptionResult, DispatchError> {
        match self {
            Self::Local(transcriber) => {
                let transcriber = Arc::clone(transcriber);
                let path = path.to_path_buf();
                let request = request.clone();
                let result = tokio::task::spawn_blocking(move || transcriber.transcribe(&path, &request))
                    .await
                    .map_err(|e| TranscribeError::Inference(format!("worker task: {e}")))?;
                Ok(result?)
            }
            Self::Remote(client) => client.transcribe(path, request).await,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(t) => f.debug_tuple("Local").field(t.identity()).finish(),
            Self::Remote(c) => f.debug_tuple("Remote").field(&c.base_url()).finish(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(t) => write!(f, "local ({})", t.identity()),
            Self::Remote(c) => write!(f, "remote ({})", c.base_url()),
        }
    }
}
