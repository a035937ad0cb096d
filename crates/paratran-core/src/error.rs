//! Error taxonomy for a transcription request.

use std::path::PathBuf;

/// Errors that can occur while serving a transcription request.
#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input file extension is not in the allow-list.
    #[error("Unsupported file type '{extension}'. Allowed: {allowed}")]
    UnsupportedFormat {
        /// Lower-cased extension including the dot, or empty.
        extension: String,
        /// Comma-separated, sorted allow-list.
        allowed: String,
    },

    /// A decoding/segmentation/chunking parameter is invalid.
    #[error("{0}")]
    InvalidParameter(String),

    /// The model could not be resolved or loaded.
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// The inference engine failed.
    #[error("inference error: {0}")]
    Inference(String),

    /// I/O error while staging or writing files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize a result.
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl TranscribeError {
    /// Whether the caller can fix this by changing the request.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_) | Self::UnsupportedFormat { .. } | Self::InvalidParameter(_)
        )
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, TranscribeError>;

/// Extension trait to reduce `.map_err()` boilerplate when wrapping engine errors.
pub trait ResultExt<T> {
    /// Wrap the error as [`TranscribeError::Inference`] with `context` prefix.
    fn inference(self, context: &str) -> Result<T>;
    /// Wrap the error as [`TranscribeError::ModelLoad`] with `context` prefix.
    fn model_load(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn inference(self, context: &str) -> Result<T> {
        self.map_err(|e| TranscribeError::Inference(format!("{context}: {e}")))
    }
    fn model_load(self, context: &str) -> Result<T> {
        self.map_err(|e| TranscribeError::ModelLoad(format!("{context}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unsupported_format_message() {
        let e = TranscribeError::UnsupportedFormat {
            extension: ".txt".into(),
            allowed: ".flac, .wav".into(),
        };
        assert_eq!(e.to_string(), "Unsupported file type '.txt'. Allowed: .flac, .wav");
    }

    #[test]
    fn file_not_found_message() {
        let e = TranscribeError::FileNotFound(PathBuf::from("/tmp/missing.wav"));
        assert_eq!(e.to_string(), "File not found: /tmp/missing.wav");
    }

    #[test]
    fn user_input_classification() {
        assert!(TranscribeError::FileNotFound(PathBuf::from("a.wav")).is_user_input());
        assert!(TranscribeError::InvalidParameter("bad".into()).is_user_input());
        assert!(!TranscribeError::ModelLoad("gone".into()).is_user_input());
        assert!(!TranscribeError::Inference("boom".into()).is_user_input());
    }

    #[test]
    fn result_ext_inference_context() {
        let err: std::result::Result<(), &str> = Err("onnx failure");
        assert_matches!(err.inference("encoder run"), Err(TranscribeError::Inference(s)) if s == "encoder run: onnx failure");
    }

    #[test]
    fn result_ext_model_load_context() {
        let err: std::result::Result<(), &str> = Err("404");
        assert_matches!(err.model_load("download"), Err(TranscribeError::ModelLoad(s)) if s == "download: 404");
    }

    #[test]
    fn result_ext_ok_passthrough() {
        let ok: std::result::Result<i32, &str> = Ok(7);
        assert_eq!(ok.inference("ctx").unwrap(), 7);
    }
}
