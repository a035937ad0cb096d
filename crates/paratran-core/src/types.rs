//! Canonical result records.
//!
//! Every output artifact (txt, json, srt, vtt) and every wire response is
//! derived from [`TranscriptionResult`]. Field order matters for the JSON
//! rendering: `text, duration, processing_time, sentences`.

use serde::{Deserialize, Serialize};

/// A single timed word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Word text as produced by the engine.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

/// A sentence-like unit of the transcript with its word timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence text.
    pub text: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Words in chronological order.
    pub tokens: Vec<Token>,
}

/// The format-independent result of one transcription request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Full transcript text.
    pub text: String,
    /// End of the last sentence in seconds, `0.0` when there are none.
    pub duration: f64,
    /// Wall-clock inference time in seconds, rounded to milliseconds.
    pub processing_time: f64,
    /// Sentences in chronological order.
    pub sentences: Vec<Sentence>,
}

impl TranscriptionResult {
    /// Build a result, deriving `duration` from the last sentence.
    pub fn new(text: String, sentences: Vec<Sentence>, processing_time: f64) -> Self {
        let duration = sentences.last().map_or(0.0, |s| s.end);
        Self {
            text,
            duration,
            processing_time,
            sentences,
        }
    }
}

/// Body of the service health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"ok"` when the service answers.
    pub status: String,
    /// Configured model identifier.
    pub model: String,
    /// Configured model cache directory.
    pub model_dir: Option<String>,
}
