//! Model file layout, vocabulary parsing and model source resolution.

use std::path::{Path, PathBuf};

use paratran_core::{Result, TranscribeError};

#[cfg(feature = "ort")]
use paratran_core::ResultExt;
#[cfg(feature = "ort")]
use tracing::{debug, info};

/// SentencePiece word-boundary marker.
pub const WORD_BOUNDARY: char = '\u{2581}';

/// Typed paths for the required model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Mel-spectrogram preprocessor (`nemo128.onnx`).
    pub preprocessor: PathBuf,
    /// Encoder model (`encoder-model.onnx`).
    pub encoder: PathBuf,
    /// Encoder external weights (`encoder-model.onnx.data`).
    pub encoder_data: PathBuf,
    /// Decoder + joint network (`decoder_joint-model.onnx`).
    pub decoder_joint: PathBuf,
    /// Token vocabulary (`vocab.txt`).
    pub vocab: PathBuf,
}

impl ModelPaths {
    /// All required model filenames.
    pub const NAMES: &[&str] = &[
        "nemo128.onnx",
        "encoder-model.onnx",
        "encoder-model.onnx.data",
        "decoder_joint-model.onnx",
        "vocab.txt",
    ];

    /// Paths for all model files under `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            preprocessor: dir.join(Self::NAMES[0]),
            encoder: dir.join(Self::NAMES[1]),
            encoder_data: dir.join(Self::NAMES[2]),
            decoder_joint: dir.join(Self::NAMES[3]),
            vocab: dir.join(Self::NAMES[4]),
        }
    }

    /// Names of required files missing under `dir`.
    pub fn missing(dir: impl AsRef<Path>) -> Vec<&'static str> {
        let dir = dir.as_ref();
        Self::NAMES
            .iter()
            .copied()
            .filter(|name| !dir.join(name).is_file())
            .collect()
    }
}

/// Where a model identifier points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Existing directory holding the model files.
    LocalDir(PathBuf),
    /// `HuggingFace` repository id.
    Hub(String),
}

impl ModelSource {
    /// An existing directory wins; anything else is a hub repo id.
    pub fn resolve(model_name: &str) -> Result<Self> {
        if model_name.trim().is_empty() {
            return Err(TranscribeError::ModelLoad("empty model identifier".into()));
        }
        let path = Path::new(model_name);
        if path.is_dir() {
            Ok(Self::LocalDir(path.to_path_buf()))
        } else {
            Ok(Self::Hub(model_name.to_string()))
        }
    }
}

/// Token table with the blank id used by the TDT joint network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    blank: usize,
}

impl Vocabulary {
    /// Parse `vocab.txt`: one `<piece> <id>` pair per line.
    ///
    /// Lines without an id are numbered by position. The blank is the
    /// `<blk>` entry, or one past the last id when absent.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries: Vec<(usize, String)> = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry = match line.rsplit_once(' ') {
                Some((piece, id)) if id.chars().all(|c| c.is_ascii_digit()) && !id.is_empty() => {
                    let id: usize = id.parse().map_err(|e| {
                        TranscribeError::ModelLoad(format!("vocab line {}: {e}", line_no + 1))
                    })?;
                    (id, piece.to_string())
                }
                _ => (entries.len(), line.to_string()),
            };
            entries.push(entry);
        }
        if entries.is_empty() {
            return Err(TranscribeError::ModelLoad("vocabulary is empty".into()));
        }

        let size = entries.iter().map(|(id, _)| id + 1).max().unwrap_or(0);
        let mut tokens = vec![String::new(); size];
        for (id, piece) in entries {
            tokens[id] = piece;
        }
        let blank = tokens
            .iter()
            .position(|t| t == "<blk>")
            .unwrap_or(tokens.len());
        Ok(Self { tokens, blank })
    }

    /// Read and parse a vocabulary file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranscribeError::ModelLoad(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Number of token logits emitted by the joint network (blank included).
    pub fn logits_len(&self) -> usize {
        self.tokens.len().max(self.blank + 1)
    }

    /// Blank token id.
    pub fn blank(&self) -> usize {
        self.blank
    }

    /// Piece text for `id`.
    pub fn piece(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }
}

/// Download the model files from `repo_id` and return their directory.
///
/// Files land in `cache_dir` when given, otherwise in the hub's default
/// cache. Already cached files are not fetched again.
#[cfg(feature = "ort")]
pub fn fetch_from_hub(repo_id: &str, cache_dir: Option<&Path>) -> Result<PathBuf> {
    let mut builder = hf_hub::api::sync::ApiBuilder::new().with_progress(false);
    if let Some(dir) = cache_dir {
        std::fs::create_dir_all(dir).model_load("create cache dir")?;
        builder = builder.with_cache_dir(dir.to_path_buf());
    }
    let api = builder.build().model_load("hub client init")?;
    let repo = api.model(repo_id.to_string());

    info!(repo = repo_id, "resolving model files from hub");
    let mut snapshot_dir = None;
    for &name in ModelPaths::NAMES {
        let path = repo.get(name).model_load(&format!("download {repo_id}/{name}"))?;
        debug!(file = name, path = %path.display(), "model file ready");
        snapshot_dir = path.parent().map(Path::to_path_buf);
    }
    snapshot_dir.ok_or_else(|| TranscribeError::ModelLoad(format!("no files resolved for {repo_id}")))
}
