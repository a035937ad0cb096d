//! Long-audio windowing and merge.
//!
//! Windows of `chunk_duration` seconds start every
//! `chunk_duration - overlap_duration` seconds. Pieces from adjacent windows
//! are stitched at the midpoint of their overlap: the earlier window owns
//! everything that starts before it, the later window everything after.

use paratran_core::{ChunkingConfig, Result, TranscribeError};

use crate::segment::TimedPiece;

/// Half-open sample range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    /// First sample.
    pub start: usize,
    /// One past the last sample.
    pub end: usize,
}

impl ChunkWindow {
    /// Window start in seconds.
    pub fn start_secs(self, sample_rate: u32) -> f64 {
        self.start as f64 / f64::from(sample_rate)
    }

    /// Window end in seconds.
    pub fn end_secs(self, sample_rate: u32) -> f64 {
        self.end as f64 / f64::from(sample_rate)
    }
}

/// Split `total_samples` into inference windows.
pub fn plan_windows(
    total_samples: usize,
    sample_rate: u32,
    config: &ChunkingConfig,
) -> Result<Vec<ChunkWindow>> {
    let whole = vec![ChunkWindow {
        start: 0,
        end: total_samples,
    }];
    let Some(chunk_duration) = config.chunk_duration else {
        return Ok(whole);
    };

    let rate = f64::from(sample_rate);
    let chunk = (chunk_duration * rate).round();
    let overlap = (config.overlap_duration * rate).round();
    if !chunk.is_finite() || !overlap.is_finite() || chunk <= 0.0 || chunk - overlap < 1.0 {
        return Err(TranscribeError::Inference(format!(
            "chunk advance must be positive (chunk_duration {chunk_duration}, overlap_duration {})",
            config.overlap_duration
        )));
    }
    let chunk = chunk as usize;
    let advance = chunk - overlap as usize;

    if total_samples <= chunk {
        return Ok(whole);
    }

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk).min(total_samples);
        windows.push(ChunkWindow { start, end });
        if end == total_samples {
            break;
        }
        start += advance;
    }
    Ok(windows)
}

/// Stitch per-window pieces (already on the absolute timeline) together.
///
/// `per_window[i]` holds the pieces decoded from `windows[i]`.
pub fn merge_windows(
    windows: &[ChunkWindow],
    sample_rate: u32,
    per_window: Vec<Vec<TimedPiece>>,
) -> Vec<TimedPiece> {
    let cut = |left: ChunkWindow, right: ChunkWindow| {
        (right.start_secs(sample_rate) + left.end_secs(sample_rate)) / 2.0
    };

    let mut merged = Vec::new();
    for (i, pieces) in per_window.into_iter().enumerate() {
        let lo = if i == 0 {
            f64::NEG_INFINITY
        } else {
            cut(windows[i - 1], windows[i])
        };
        let hi = windows
            .get(i + 1)
            .map_or(f64::INFINITY, |&next| cut(windows[i], next));
        merged.extend(pieces.into_iter().filter(|p| p.start >= lo && p.start < hi));
    }
    merged
}
