//! Batch runner: many files, one backend, outputs on disk.
//!
//! Files run one after another. A per-file failure is recorded and the
//! batch moves on; a failure that makes the backend unusable
//! ([`DispatchError::aborts_batch`]) stops the batch. The same rule applies
//! to the up-front health check: an unreachable server stops the batch, an
//! HTTP-level rejection of `/health` does not.

use std::path::{Path, PathBuf};

use paratran_core::{DecodingRequest, OutputFormat, TranscriptionResult, write_outputs};
use tracing::{error, info, warn};

use crate::backend::Backend;
use crate::error::DispatchError;

/// What to do with each file.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Decoding parameters applied to every file.
    pub request: DecodingRequest,
    /// Directory receiving `{stem}.{ext}` artifacts.
    pub output_dir: PathBuf,
    /// Formats to write per file.
    pub formats: Vec<OutputFormat>,
}

/// Result for one input file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Transcribed and written.
    Written {
        /// Input file.
        source: PathBuf,
        /// Artifacts written.
        outputs: Vec<PathBuf>,
    },
    /// Skipped because of an error.
    Failed {
        /// Input file.
        source: PathBuf,
        /// Human-readable reason.
        error: String,
    },
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per attempted file, in input order.
    pub outcomes: Vec<FileOutcome>,
    /// Set when the batch stopped early.
    pub aborted: Option<String>,
}

impl BatchReport {
    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Failed { .. }))
            .count()
    }

    /// True when every file was written and the batch ran to the end.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failed() == 0
    }
}

/// Run `files` through `backend`, writing artifacts per `options`.
///
/// `on_result` sees every successful result right after its files are
/// written.
pub async fn run_batch(
    backend: &Backend,
    files: &[PathBuf],
    options: &BatchOptions,
    mut on_result: impl FnMut(&Path, &TranscriptionResult, &[PathBuf]),
) -> BatchReport {
    let mut report = BatchReport::default();

    if let Err(e) = backend.probe().await {
        if e.aborts_batch() {
            error!(error = %e, "backend unavailable");
            report.aborted = Some(e.to_string());
            return report;
        }
        warn!(error = %e, "health check rejected, trying files anyway");
    }

    for (index, source) in files.iter().enumerate() {
        info!(file = %source.display(), n = index + 1, of = files.len(), "transcribing");
        match transcribe_one(backend, source, options).await {
            Ok((result, outputs)) => {
                on_result(source, &result, &outputs);
                report.outcomes.push(FileOutcome::Written {
                    source: source.clone(),
                    outputs,
                });
            }
            Err(e) => {
                let message = e.to_string();
                report.outcomes.push(FileOutcome::Failed {
                    source: source.clone(),
                    error: message.clone(),
                });
                if e.aborts_batch() {
                    error!(file = %source.display(), error = %message, "aborting batch");
                    report.aborted = Some(message);
                    break;
                }
                warn!(file = %source.display(), error = %message, "file failed, continuing");
            }
        }
    }
    report
}

async fn transcribe_one(
    backend: &Backend,
    source: &Path,
    options: &BatchOptions,
) -> Result<(TranscriptionResult, Vec<PathBuf>), DispatchError> {
    let result = backend.transcribe(source, &options.request).await?;
    let stem = source
        .file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned());
    let outputs = write_outputs(&result, &stem, &options.output_dir, &options.formats)?;
    Ok((result, outputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use paratran_core::testutil::{FakeLoader, touch};
    use paratran_core::{ModelCache, ModelIdentity, Transcriber};

    fn backend(loader: Arc<FakeLoader>) -> Backend {
        Backend::Local(Arc::new(Transcriber::new(
            Arc::new(ModelCache::new(loader)),
            ModelIdentity::new("fake", None),
        )))
    }

    fn options(dir: &Path, formats: Vec<OutputFormat>) -> BatchOptions {
        BatchOptions {
            request: DecodingRequest::default(),
            output_dir: dir.join("out"),
            formats,
        }
    }

    #[tokio::test]
    async fn writes_each_file_and_continues_past_user_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = touch(dir.path(), "one.wav");
        let bad = touch(dir.path(), "notes.txt");
        let missing = dir.path().join("gone.mp3");
        let also_good = touch(dir.path(), "two.flac");
        let loader = Arc::new(FakeLoader::new());

        let mut seen = Vec::new();
        let report = run_batch(
            &backend(loader.clone()),
            &[good, bad, missing, also_good],
            &options(dir.path(), vec![OutputFormat::Txt, OutputFormat::Srt]),
            |source, _, outputs| seen.push((source.to_path_buf(), outputs.len())),
        )
        .await;

        assert!(report.aborted.is_none());
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.failed(), 2);
        assert!(!report.is_success());
        assert_eq!(seen.len(), 2);
        assert!(dir.path().join("out/one.txt").exists());
        assert!(dir.path().join("out/one.srt").exists());
        assert!(dir.path().join("out/two.txt").exists());
        assert_eq!(loader.infer_count(), 2);
    }

    #[tokio::test]
    async fn model_load_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![touch(dir.path(), "a.wav"), touch(dir.path(), "b.wav")];
        let loader = Arc::new(FakeLoader::new().failing_for("fake"));

        let report = run_batch(
            &backend(loader.clone()),
            &files,
            &options(dir.path(), vec![OutputFormat::Txt]),
            |_, _, _| {},
        )
        .await;

        assert!(report.aborted.is_some());
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(loader.load_count(), 1);
    }

    #[tokio::test]
    async fn inference_failure_is_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![touch(dir.path(), "a.wav"), touch(dir.path(), "b.wav")];
        let loader = Arc::new(FakeLoader::new().failing_inference("bad audio"));

        let report = run_batch(
            &backend(loader),
            &files,
            &options(dir.path(), vec![OutputFormat::Json]),
            |_, _, _| {},
        )
        .await;

        assert!(report.aborted.is_none());
        assert_eq!(report.failed(), 2);
    }

    #[tokio::test]
    async fn empty_batch_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let report = run_batch(
            &backend(Arc::new(FakeLoader::new())),
            &[],
            &options(dir.path(), vec![OutputFormat::Txt]),
            |_, _, _| {},
        )
        .await;
        assert!(report.is_success());
    }
}
