//! Router assembly and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use paratran_core::{ModelSettings, Transcriber};
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};

use crate::error::ServerError;
use crate::handlers;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port; 0 picks a free one.
    pub port: u16,
    /// Largest accepted request body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            max_upload_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Orchestrator shared by every request.
    pub transcriber: Arc<Transcriber>,
    /// Reported by `/health`.
    pub settings: Arc<ModelSettings>,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/transcribe", post(handlers::transcribe))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Load the model, bind, and start serving. Returns a handle to shut it down.
///
/// The model is loaded before the listener is bound; a load failure aborts
/// startup.
pub async fn start(
    config: ServerConfig,
    transcriber: Arc<Transcriber>,
    settings: ModelSettings,
) -> Result<ServerHandle, ServerError> {
    let preload = Arc::clone(&transcriber);
    let _ = tokio::task::spawn_blocking(move || preload.preload())
        .await
        .map_err(|e| ServerError::Task(e.to_string()))?
        .map_err(ServerError::Preload)?;

    let state = AppState {
        transcriber,
        settings: Arc::new(settings),
    };
    let router = build_router(state, &config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(addr = %local_addr, "paratran server listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "server exited with error");
        }
    });

    Ok(ServerHandle {
        addr: local_addr,
        shutdown: Some(shutdown_tx),
        server,
    })
}

/// Handle returned by `start()`; keeps the server task alive.
pub struct ServerHandle {
    /// Address actually bound.
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Bound port.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.server.await;
        info!("paratran server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use paratran_core::testutil::FakeLoader;
    use paratran_core::{ModelCache, ModelIdentity, TranscribeError};
    use tower::ServiceExt;

    fn transcriber(loader: FakeLoader, name: &str) -> Arc<Transcriber> {
        Arc::new(Transcriber::new(
            Arc::new(ModelCache::new(Arc::new(loader))),
            ModelIdentity::new(name, None),
        ))
    }

    fn local_config() -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            ..Default::default()
        }
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_bytes, 1 << 30);
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let settings = ModelSettings {
            model: "org/model".into(),
            cache_dir: Some("/models".into()),
        };
        let handle = start(local_config(), transcriber(FakeLoader::new(), "org/model"), settings)
            .await
            .unwrap();
        assert!(handle.port() > 0);

        let url = format!("http://127.0.0.1:{}/health", handle.port());
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "org/model");
        assert_eq!(body["model_dir"], "/models");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn preload_failure_aborts_startup() {
        let result = start(
            local_config(),
            transcriber(FakeLoader::new().failing_for("broken"), "broken"),
            ModelSettings::default(),
        )
        .await
        .map(|_| ());
        assert_matches!(result, Err(ServerError::Preload(TranscribeError::ModelLoad(_))));
    }

    // ── router, in-process ──

    fn router(max_upload_bytes: usize) -> Router {
        let state = AppState {
            transcriber: transcriber(FakeLoader::new(), "fake"),
            settings: Arc::new(ModelSettings::default()),
        };
        let config = ServerConfig {
            max_upload_bytes,
            ..local_config()
        };
        build_router(state, &config)
    }

    fn multipart_request(payload: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            b"--XBOUNDARY\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.wav\"\r\n\
              Content-Type: application/octet-stream\r\n\r\n",
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n--XBOUNDARY--\r\n");
        Request::builder()
            .method("POST")
            .uri("/transcribe")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let req = Request::builder().uri("/nonexistent").body(Body::empty()).unwrap();
        let resp = router(1024).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transcribe_requires_post() {
        let req = Request::builder().uri("/transcribe").body(Body::empty()).unwrap();
        let resp = router(1024).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn small_upload_is_accepted() {
        let resp = router(64 * 1024)
            .oneshot(multipart_request(b"RIFF....WAVE"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_upload_is_413() {
        let resp = router(1024)
            .oneshot(multipart_request(&[0u8; 8 * 1024]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(parsed["error"].is_string());
    }
}
