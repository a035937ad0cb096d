//! # paratran-core
//!
//! The transcription request orchestrator shared by every paratran front end
//! (CLI, HTTP service, MCP tool).
//!
//! ```text
//! DecodingRequest ─► decoding::build_config ─► InferenceConfig
//!                                                   │
//! file path ─► Transcriber::transcribe ─► ModelCache::get_model ─► ModelHandle::infer
//!                                                   │
//!                                  TranscriptionResult ─► output::render / write_outputs
//! ```
//!
//! The acoustic model itself lives behind the [`engine::ModelLoader`] and
//! [`engine::ModelHandle`] traits; this crate never touches audio.
//!
//! ## Crate Position
//!
//! Standalone (no paratran crate dependencies).
//! Depended on by: paratran-onnx, paratran-client, paratran-server, paratran-mcp, paratran.

#![deny(unsafe_code)]

pub mod cache;
pub mod decoding;
pub mod engine;
pub mod error;
pub mod output;
pub mod settings;
pub mod transcriber;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod testutil;

pub use cache::{CachedModel, ModelCache};
pub use decoding::{
    ChunkingConfig, DecodingMethod, DecodingRequest, DecodingStrategy, InferenceConfig, Precision,
    SentenceConfig, build_config,
};
pub use engine::{ModelHandle, ModelIdentity, ModelLoader, RawResult, RawSentence, RawToken};
pub use error::{Result, ResultExt, TranscribeError};
pub use output::{OutputFormat, format_timestamp, render, write_outputs};
pub use settings::{DEFAULT_MODEL, ModelSettings, resolve_server_url};
pub use transcriber::{ALLOWED_EXTENSIONS, Transcriber, check_extension, validate_input};
pub use types::{HealthStatus, Sentence, Token, TranscriptionResult};
