//! ONNX session management and the [`ModelLoader`] / [`ModelHandle`] impls.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ort::session::Session;
use paratran_core::{
    DecodingStrategy, InferenceConfig, ModelHandle, ModelIdentity, ModelLoader, Precision, RawResult,
    Result, ResultExt, TranscribeError,
};
use tracing::{debug, info, warn};

use crate::audio::{self, TARGET_SAMPLE_RATE};
use crate::chunk;
use crate::decoder;
use crate::model::{self, ModelPaths, ModelSource, Vocabulary};
use crate::segment::{self, TimedPiece};

/// Intra-op threads for the preprocessor and encoder sessions.
const PARALLEL_THREADS: usize = 4;
/// The decoder loop is sequential.
const DECODER_THREADS: usize = 1;

/// Resolves model identifiers to local directories and loads them.
#[derive(Debug, Default, Clone, Copy)]
pub struct OnnxModelLoader;

impl OnnxModelLoader {
    /// Create a loader.
    pub fn new() -> Self {
        Self
    }

    /// Directory holding the model files for `identity`, downloading if needed.
    pub fn resolve_dir(identity: &ModelIdentity) -> Result<PathBuf> {
        match ModelSource::resolve(&identity.model_name)? {
            ModelSource::LocalDir(dir) => Ok(dir),
            ModelSource::Hub(repo) => {
                model::fetch_from_hub(&repo, identity.cache_dir.as_deref().map(Path::new))
            }
        }
    }
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, identity: &ModelIdentity) -> Result<Arc<dyn ModelHandle>> {
        let dir = Self::resolve_dir(identity)?;
        let model = ParakeetModel::load(&dir)?;
        Ok(Arc::new(model))
    }
}

/// A loaded parakeet-tdt model: three ONNX sessions and the vocabulary.
///
/// `Session::run` needs `&mut self`, so each session sits behind a mutex;
/// concurrent requests on one model take turns per stage.
pub struct ParakeetModel {
    preprocessor: Mutex<Session>,
    encoder: Mutex<Session>,
    decoder_joint: Mutex<Session>,
    vocab: Vocabulary,
}

impl ParakeetModel {
    /// Load all sessions from `dir`. CPU heavy (~600MB of weights).
    pub fn load(dir: &Path) -> Result<Self> {
        let missing = ModelPaths::missing(dir);
        if !missing.is_empty() {
            return Err(TranscribeError::ModelLoad(format!(
                "{} is missing model files: {}",
                dir.display(),
                missing.join(", ")
            )));
        }
        let paths = ModelPaths::from_dir(dir);
        info!(dir = %dir.display(), "loading parakeet-tdt sessions");

        let preprocessor = session(&paths.preprocessor, PARALLEL_THREADS, "preprocessor")?;
        let encoder = session(&paths.encoder, PARALLEL_THREADS, "encoder")?;
        let decoder_joint = session(&paths.decoder_joint, DECODER_THREADS, "decoder_joint")?;
        let vocab = Vocabulary::load(&paths.vocab)?;

        info!(
            vocab_size = vocab.logits_len(),
            blank = vocab.blank(),
            "parakeet-tdt model ready"
        );
        Ok(Self {
            preprocessor: Mutex::new(preprocessor),
            encoder: Mutex::new(encoder),
            decoder_joint: Mutex::new(decoder_joint),
            vocab,
        })
    }

    /// Decode one window of samples into pieces offset by `offset` seconds.
    fn decode_window(&self, samples: &[f32], offset: f64) -> Result<Vec<TimedPiece>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }
        let (features, features_len) = {
            let mut session = self.preprocessor.lock().inference("preprocessor lock")?;
            decoder::run_preprocessor(&mut session, samples)?
        };
        let (frames, valid) = {
            let mut session = self.encoder.lock().inference("encoder lock")?;
            decoder::run_encoder(&mut session, &features, features_len)?
        };
        let emissions = {
            let mut session = self.decoder_joint.lock().inference("decoder lock")?;
            decoder::greedy_decode(&mut session, &frames, valid, &self.vocab)?
        };
        Ok(segment::place_emissions(&emissions, &self.vocab, offset))
    }
}

impl ModelHandle for ParakeetModel {
    fn infer(&self, path: &Path, config: &InferenceConfig) -> Result<RawResult> {
        if let DecodingStrategy::Beam { beam_size, .. } = config.decoding {
            warn!(beam_size, "beam decoding is not available in the ONNX backend, using greedy");
        }
        if config.precision == Precision::BFloat16 {
            debug!("bfloat16 requested, ONNX export runs in float32");
        }

        let samples = audio::load_audio(path)?;
        let windows = chunk::plan_windows(samples.len(), TARGET_SAMPLE_RATE, &config.chunking)?;
        debug!(windows = windows.len(), samples = samples.len(), "running inference");

        let mut per_window = Vec::with_capacity(windows.len());
        for window in &windows {
            let offset = window.start_secs(TARGET_SAMPLE_RATE);
            per_window.push(self.decode_window(&samples[window.start..window.end], offset)?);
        }
        let pieces = chunk::merge_windows(&windows, TARGET_SAMPLE_RATE, per_window);
        Ok(segment::build_result(&pieces, &config.sentence))
    }
}

fn session(path: &Path, threads: usize, name: &str) -> Result<Session> {
    let session = Session::builder()
        .model_load("session builder")?
        .with_intra_threads(threads)
        .model_load("set threads")?
        .commit_from_file(path)
        .model_load(&format!("load {name}"))?;
    debug!(session = name, "loaded");
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn empty_dir_is_a_model_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        let identity = ModelIdentity::new(tmp.path().to_string_lossy(), None);
        let result = OnnxModelLoader::new().load(&identity).map(|_| ());
        assert_matches!(result, Err(TranscribeError::ModelLoad(msg)) if msg.contains("missing model files"));
    }

    #[test]
    fn local_directory_resolves_without_download() {
        let tmp = tempfile::tempdir().unwrap();
        let identity = ModelIdentity::new(tmp.path().to_string_lossy(), Some("/unused".into()));
        assert_eq!(OnnxModelLoader::resolve_dir(&identity).unwrap(), tmp.path());
    }
}
