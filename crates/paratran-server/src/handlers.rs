//! Route handlers.

use std::io::Write;
use std::path::Path;

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use paratran_core::transcriber::normalized_extension;
use paratran_core::{DecodingRequest, HealthStatus, TranscriptionResult, build_config, check_extension};
use tracing::{debug, info, instrument};

use crate::error::ApiError;
use crate::server::AppState;

/// Multipart field carrying the audio.
pub const FILE_FIELD: &str = "file";

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".into(),
        model: state.settings.model.clone(),
        model_dir: state.settings.cache_dir.clone(),
    })
}

/// `POST /transcribe`.
///
/// Checks run in this order: query parsing, filename extension, decoding
/// parameters. Only then is the upload staged to a temporary file, which is
/// removed however the request ends.
#[instrument(skip_all)]
pub async fn transcribe(
    State(state): State<AppState>,
    query: Result<Query<DecodingRequest>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<Json<TranscriptionResult>, ApiError> {
    let Query(request) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(FILE_FIELD) => break field,
            Ok(Some(other)) => {
                debug!(field = ?other.name(), "ignoring multipart field");
            }
            Ok(None) => {
                return Err(ApiError::bad_request(format!(
                    "Missing multipart field '{FILE_FIELD}'"
                )));
            }
            Err(e) => return Err(ApiError::new(e.status(), e.body_text())),
        }
    };

    let file_name = field.file_name().unwrap_or_default().to_string();
    check_extension(Path::new(&file_name))?;
    let _ = build_config(&request)?;

    let bytes = read_field(field).await?;
    info!(file = %file_name, bytes = bytes.len(), decoding = %request.decoding, "transcription request");

    let suffix = normalized_extension(Path::new(&file_name));
    let transcriber = state.transcriber.clone();
    let result = tokio::task::spawn_blocking(move || -> paratran_core::Result<TranscriptionResult> {
        let mut staged = tempfile::Builder::new()
            .prefix("paratran-")
            .suffix(&suffix)
            .tempfile()?;
        staged.write_all(&bytes)?;
        staged.flush()?;
        transcriber.transcribe(staged.path(), &request)
    })
    .await
    .map_err(|e| ApiError::internal(format!("worker task: {e}")))??;

    Ok(Json(result))
}

async fn read_field(field: Field<'_>) -> Result<axum::body::Bytes, ApiError> {
    field
        .bytes()
        .await
        .map_err(|e| ApiError::new(e.status(), format!("Failed to read upload: {}", e.body_text())))
}
