//! Transcription orchestrator: one request → one inference → one canonical result.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::cache::{CachedModel, ModelCache};
use crate::decoding::{DecodingRequest, build_config};
use crate::engine::{ModelIdentity, RawResult};
use crate::error::{Result, TranscribeError};
use crate::types::{Sentence, Token, TranscriptionResult};

/// Accepted audio extensions, sorted.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".flac", ".m4a", ".mp3", ".ogg", ".wav", ".webm"];

/// Lower-cased extension of `path` including the dot, or `""` when it has none.
pub fn normalized_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Check `path`'s extension against [`ALLOWED_EXTENSIONS`] (case-insensitive).
///
/// Purely name-based; the file content is never inspected.
pub fn check_extension(path: &Path) -> Result<()> {
    let extension = normalized_extension(path);
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(TranscribeError::UnsupportedFormat {
            extension,
            allowed: ALLOWED_EXTENSIONS.join(", "),
        })
    }
}

/// Check that `path` exists and has a supported extension.
pub fn validate_input(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(TranscribeError::FileNotFound(path.to_path_buf()));
    }
    check_extension(path)
}

/// Runs transcription requests against a shared [`ModelCache`].
pub struct Transcriber {
    cache: Arc<ModelCache>,
    identity: ModelIdentity,
}

impl Transcriber {
    /// Create an orchestrator that loads `identity` through `cache`.
    pub fn new(cache: Arc<ModelCache>, identity: ModelIdentity) -> Self {
        Self { cache, identity }
    }

    /// The configured model identity.
    pub fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    /// The shared model cache.
    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// Load the configured model ahead of the first request.
    pub fn preload(&self) -> Result<CachedModel> {
        self.cache.get_model(&self.identity)
    }

    /// Transcribe the file at `path`.
    ///
    /// Input problems (missing file, bad extension, bad parameters) are
    /// reported before the model cache is touched. Engine failures are
    /// returned as the engine produced them.
    #[instrument(skip(self, request), fields(file = %path.display(), decoding = %request.decoding))]
    pub fn transcribe(&self, path: &Path, request: &DecodingRequest) -> Result<TranscriptionResult> {
        validate_input(path)?;
        let config = build_config(request)?;
        let model = self.cache.get_model(&self.identity)?;

        let start = Instant::now();
        let raw = model.handle().infer(path, &config)?;
        let processing_time = round_millis(start.elapsed());

        let result = normalize(raw, processing_time);
        info!(
            sentences = result.sentences.len(),
            duration = result.duration,
            processing_time = result.processing_time,
            "transcription complete"
        );
        Ok(result)
    }
}

/// Seconds rounded to 3 decimals.
fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

/// Flatten raw engine output into the canonical record.
pub fn normalize(raw: RawResult, processing_time: f64) -> TranscriptionResult {
    let sentences: Vec<Sentence> = raw
        .sentences
        .into_iter()
        .map(|s| Sentence {
            text: s.text,
            start: s.start,
            end: s.end,
            tokens: s
                .tokens
                .into_iter()
                .map(|t| Token {
                    text: t.text,
                    start: t.start,
                    end: t.end,
                })
                .collect(),
        })
        .collect();
    debug!(sentences = sentences.len(), "normalized engine output");
    TranscriptionResult::new(raw.text, sentences, processing_time)
}
