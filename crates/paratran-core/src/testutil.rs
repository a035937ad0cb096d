//! Test doubles for the engine boundary.
//!
//! [`FakeLoader`] counts loads and hands out [`FakeModel`]s that return a
//! canned [`RawResult`], so orchestrator and front-end tests run without a
//! real model.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::decoding::InferenceConfig;
use crate::engine::{ModelHandle, ModelIdentity, ModelLoader, RawResult, RawSentence, RawToken};
use crate::error::{Result, TranscribeError};

/// Shared call log between a loader and the models it produced.
#[derive(Default)]
struct Probe {
    loads: AtomicUsize,
    inferences: AtomicUsize,
    last_call: Mutex<Option<(PathBuf, InferenceConfig)>>,
}

/// Counting [`ModelLoader`] for tests.
pub struct FakeLoader {
    probe: Arc<Probe>,
    failing: HashSet<String>,
    result: RawResult,
    inference_error: Option<String>,
}

impl FakeLoader {
    /// Loader whose models return [`sample_raw_result`].
    pub fn new() -> Self {
        Self {
            probe: Arc::new(Probe::default()),
            failing: HashSet::new(),
            result: sample_raw_result(),
            inference_error: None,
        }
    }

    /// Builder: fail to load any identity whose model name is `model_name`.
    #[must_use]
    pub fn failing_for(mut self, model_name: &str) -> Self {
        let _ = self.failing.insert(model_name.to_string());
        self
    }

    /// Builder: models return `result`.
    #[must_use]
    pub fn with_result(mut self, result: RawResult) -> Self {
        self.result = result;
        self
    }

    /// Builder: models fail every inference with `message`.
    #[must_use]
    pub fn failing_inference(mut self, message: &str) -> Self {
        self.inference_error = Some(message.to_string());
        self
    }

    /// Number of successful and failed `load` calls.
    pub fn load_count(&self) -> usize {
        self.probe.loads.load(Ordering::SeqCst)
    }

    /// Number of `infer` calls across all produced models.
    pub fn infer_count(&self) -> usize {
        self.probe.inferences.load(Ordering::SeqCst)
    }

    /// Path and config of the most recent `infer` call.
    pub fn last_call(&self) -> Option<(PathBuf, InferenceConfig)> {
        self.probe.last_call.lock().clone()
    }
}

impl Default for FakeLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader for FakeLoader {
    fn load(&self, identity: &ModelIdentity) -> Result<Arc<dyn ModelHandle>> {
        let _ = self.probe.loads.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&identity.model_name) {
            return Err(TranscribeError::ModelLoad(format!(
                "cannot resolve model '{}'",
                identity.model_name
            )));
        }
        Ok(Arc::new(FakeModel {
            probe: Arc::clone(&self.probe),
            result: self.result.clone(),
            inference_error: self.inference_error.clone(),
        }))
    }
}

/// Model returned by [`FakeLoader`].
pub struct FakeModel {
    probe: Arc<Probe>,
    result: RawResult,
    inference_error: Option<String>,
}

impl ModelHandle for FakeModel {
    fn infer(&self, path: &Path, config: &InferenceConfig) -> Result<RawResult> {
        let _ = self.probe.inferences.fetch_add(1, Ordering::SeqCst);
        *self.probe.last_call.lock() = Some((path.to_path_buf(), config.clone()));
        match &self.inference_error {
            Some(message) => Err(TranscribeError::Inference(message.clone())),
            None => Ok(self.result.clone()),
        }
    }
}

/// Two sentences, four words, ending at 2.4s.
pub fn sample_raw_result() -> RawResult {
    let token = |text: &str, start: f64, end: f64| RawToken {
        text: text.into(),
        start,
        end,
    };
    RawResult {
        text: "Hello world. How are".into(),
        sentences: vec![
            RawSentence {
                text: "Hello world.".into(),
                start: 0.0,
                end: 1.1,
                tokens: vec![token("Hello", 0.0, 0.48), token("world.", 0.56, 1.1)],
            },
            RawSentence {
                text: "How are".into(),
                start: 1.6,
                end: 2.4,
                tokens: vec![token("How", 1.6, 1.92), token("are", 2.0, 2.4)],
            },
        ],
    }
}

/// Create an empty file named `name` inside `dir` and return its path.
pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"RIFF").expect("write test audio file");
    path
}
