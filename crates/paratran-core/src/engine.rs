//! Inference engine boundary.
//!
//! The acoustic model, its decoder and audio decoding are external
//! collaborators. They are consumed through two traits: a [`ModelLoader`]
//! that resolves a [`ModelIdentity`] into a loaded [`ModelHandle`], and the
//! handle's single `infer` call.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::decoding::InferenceConfig;
use crate::error::Result;

/// Which model to load and where to cache it.
///
/// Equality decides cache hits: two identities that compare equal share one
/// loaded model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelIdentity {
    /// Model identifier (hub repo id or local path).
    pub model_name: String,
    /// Directory for downloaded model files.
    pub cache_dir: Option<String>,
}

impl ModelIdentity {
    /// Create an identity.
    pub fn new(model_name: impl Into<String>, cache_dir: Option<String>) -> Self {
        Self {
            model_name: model_name.into(),
            cache_dir,
        }
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cache_dir {
            Some(dir) => write!(f, "{} (cache: {dir})", self.model_name),
            None => f.write_str(&self.model_name),
        }
    }
}

/// Raw word/sub-word token as emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    /// Token text.
    pub text: String,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
}

/// Raw sentence as emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSentence {
    /// Sentence text.
    pub text: String,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
    /// Tokens of this sentence.
    pub tokens: Vec<RawToken>,
}

/// Raw engine output for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    /// Full transcript.
    pub text: String,
    /// Chronological sentences.
    pub sentences: Vec<RawSentence>,
}

/// A loaded model.
pub trait ModelHandle: Send + Sync {
    /// Transcribe the audio file at `path`.
    ///
    /// CPU/GPU bound; callers on an async runtime must run this on a
    /// blocking thread.
    fn infer(&self, path: &Path, config: &InferenceConfig) -> Result<RawResult>;
}

/// Resolves identities into loaded models.
pub trait ModelLoader: Send + Sync {
    /// Load the model named by `identity`.
    ///
    /// Fails with [`crate::TranscribeError::ModelLoad`] when the identifier
    /// cannot be resolved or the cache directory is unusable.
    fn load(&self, identity: &ModelIdentity) -> Result<Arc<dyn ModelHandle>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality_includes_cache_dir() {
        let a = ModelIdentity::new("m", None);
        let b = ModelIdentity::new("m", Some("/tmp/cache".into()));
        assert_ne!(a, b);
        assert_eq!(a, ModelIdentity::new("m", None));
    }

    #[test]
    fn identity_display() {
        assert_eq!(ModelIdentity::new("org/model", None).to_string(), "org/model");
        assert_eq!(
            ModelIdentity::new("org/model", Some("/c".into())).to_string(),
            "org/model (cache: /c)"
        );
    }
}
