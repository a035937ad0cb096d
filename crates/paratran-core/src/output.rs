//! Output formatter: [`TranscriptionResult`] → txt / json / srt / vtt.
//!
//! Rendering is a pure function of the result; writing goes to
//! `{output_dir}/{base_name}.{ext}` and overwrites whatever is there, so
//! re-running a request reproduces identical files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{Result, TranscribeError};
use crate::types::TranscriptionResult;

/// Artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputFormat {
    /// Plain transcript text.
    Txt,
    /// Canonical result as pretty JSON.
    Json,
    /// SubRip subtitles.
    Srt,
    /// WebVTT subtitles.
    Vtt,
}

impl OutputFormat {
    /// Every format, in rendering order.
    pub const ALL: [Self; 4] = [Self::Txt, Self::Json, Self::Srt, Self::Vtt];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Srt => "srt",
            Self::Vtt => "vtt",
        }
    }

    /// Parse a CLI selection: a single format name or `all`.
    pub fn parse_selection(s: &str) -> Result<Vec<Self>> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL.to_vec());
        }
        Ok(vec![s.parse()?])
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = TranscribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "srt" => Ok(Self::Srt),
            "vtt" => Ok(Self::Vtt),
            _ => Err(TranscribeError::InvalidParameter(format!(
                "Invalid output format '{s}'. Must be one of: txt, json, srt, vtt, all."
            ))),
        }
    }
}

/// `HH:MM:SS{sep}mmm` for a seconds value.
///
/// Negative and NaN inputs clamp to zero; hours are not wrapped at 24.
pub fn format_timestamp(seconds: f64, millis_separator: char) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}{millis_separator}{millis:03}")
}

/// Render `result` in `format`.
pub fn render(result: &TranscriptionResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Txt => Ok(format!("{}\n", result.text)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(result)?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Srt => Ok(render_srt(result)),
        OutputFormat::Vtt => Ok(render_vtt(result)),
    }
}

fn render_srt(result: &TranscriptionResult) -> String {
    result
        .sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| {
            format!(
                "{}\n{} --> {}\n{}\n\n",
                i + 1,
                format_timestamp(sentence.start, ','),
                format_timestamp(sentence.end, ','),
                sentence.text.trim()
            )
        })
        .collect()
}

fn render_vtt(result: &TranscriptionResult) -> String {
    let cues = result.sentences.iter().map(|sentence| {
        format!(
            "{} --> {}\n{}\n\n",
            format_timestamp(sentence.start, '.'),
            format_timestamp(sentence.end, '.'),
            sentence.text.trim()
        )
    });
    std::iter::once(String::from("WEBVTT\n\n")).chain(cues).collect()
}

/// Write one artifact per format to `{output_dir}/{base_name}.{ext}`.
///
/// Creates `output_dir` if needed. Duplicate formats are written once.
/// Returns the written paths in the order the formats were given.
pub fn write_outputs(
    result: &TranscriptionResult,
    base_name: &str,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(formats.len());
    let mut seen = Vec::with_capacity(formats.len());
    for &format in formats {
        if seen.contains(&format) {
            continue;
        }
        seen.push(format);

        let path = output_dir.join(format!("{base_name}.{}", format.extension()));
        std::fs::write(&path, render(result, format)?)?;
        debug!(path = %path.display(), %format, "wrote output");
        written.push(path);
    }
    Ok(written)
}
