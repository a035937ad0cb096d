//! Local inference backend for paratran: parakeet-tdt on ONNX Runtime.
//!
//! # Architecture
//!
//! ```text
//! audio file → symphonia decode → rubato resample to 16kHz mono f32
//! → chunk plan (optional windows with overlap)
//! → nemo128.onnx (preprocessor) → encoder-model.onnx
//! → TDT greedy decode (decoder_joint-model.onnx in loop) → timed pieces
//! → chunk merge → words → sentences → RawResult
//! ```
//!
//! ## Crate Position
//!
//! Depends on: paratran-core.
//! Depended on by: paratran (binary).

// Always available (no heavy deps)
pub mod chunk;
pub mod model;
pub mod segment;

// Feature-gated (require ort + symphonia + rubato)
#[cfg(feature = "ort")]
pub(crate) mod audio;
#[cfg(feature = "ort")]
pub(crate) mod decoder;
#[cfg(feature = "ort")]
pub mod engine;

use std::sync::Arc;

use paratran_core::{ModelHandle, ModelIdentity, ModelLoader, Result, TranscribeError};

#[cfg(feature = "ort")]
pub use engine::{OnnxModelLoader, ParakeetModel};

/// Loader used by local mode: ONNX when compiled in, otherwise one that
/// reports the missing backend.
pub fn default_loader() -> Arc<dyn ModelLoader> {
    #[cfg(feature = "ort")]
    {
        Arc::new(OnnxModelLoader::new())
    }
    #[cfg(not(feature = "ort"))]
    {
        Arc::new(UnavailableLoader)
    }
}

/// Whether a local inference backend is compiled in.
pub const fn backend_available() -> bool {
    cfg!(feature = "ort")
}

/// Loader for builds without a local backend; every load fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLoader;

impl ModelLoader for UnavailableLoader {
    fn load(&self, identity: &ModelIdentity) -> Result<Arc<dyn ModelHandle>> {
        Err(TranscribeError::ModelLoad(format!(
            "cannot load '{identity}': no local backend compiled in (rebuild with the `onnx` feature or use --server)"
        )))
    }
}
