//! Decoding configuration: caller parameters → [`InferenceConfig`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TranscribeError};

/// Caller-facing decoding parameters.
///
/// Field names and defaults are the wire contract shared by the HTTP query
/// string, the MCP tool arguments and the CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingRequest {
    /// `greedy` or `beam`.
    pub decoding: String,
    /// Beam width (beam decoding only).
    pub beam_size: u32,
    /// Length penalty (beam decoding only).
    pub length_penalty: f64,
    /// Patience (beam decoding only).
    pub patience: f64,
    /// Duration reward 0.0-1.0 (beam decoding only).
    pub duration_reward: f64,
    /// Max words per sentence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_words: Option<u32>,
    /// Split sentence on silence gap (seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silence_gap: Option<f64>,
    /// Max sentence duration (seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
    /// Chunk duration in seconds for long audio (`None` = no chunking).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_duration: Option<f64>,
    /// Overlap between chunks (seconds).
    pub overlap_duration: f64,
    /// Use float32 instead of bfloat16.
    pub fp32: bool,
}

impl Default for DecodingRequest {
    fn default() -> Self {
        Self {
            decoding: DecodingMethod::Greedy.to_string(),
            beam_size: 5,
            length_penalty: 1.0,
            patience: 1.0,
            duration_reward: 0.7,
            max_words: None,
            silence_gap: None,
            max_duration: None,
            chunk_duration: None,
            overlap_duration: 15.0,
            fp32: false,
        }
    }
}

/// Decoding strategy name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodingMethod {
    /// Single best path.
    Greedy,
    /// Beam search.
    Beam,
}

impl fmt::Display for DecodingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Greedy => "greedy",
            Self::Beam => "beam",
        })
    }
}

impl FromStr for DecodingMethod {
    type Err = TranscribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "greedy" => Ok(Self::Greedy),
            "beam" => Ok(Self::Beam),
            other => Err(TranscribeError::InvalidParameter(format!(
                "Invalid decoding method '{other}'. Must be 'greedy' or 'beam'."
            ))),
        }
    }
}

/// Decoding strategy handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodingStrategy {
    /// Single best path.
    Greedy,
    /// Beam search with scoring adjustments.
    Beam {
        /// Beam width (≥ 1).
        beam_size: u32,
        /// Length penalty.
        length_penalty: f64,
        /// Patience factor.
        patience: f64,
        /// Duration reward.
        duration_reward: f64,
    },
}

/// Sentence segmentation limits. `None` disables a limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SentenceConfig {
    /// Max words per sentence.
    pub max_words: Option<u32>,
    /// Silence gap (seconds) that forces a split.
    pub silence_gap: Option<f64>,
    /// Max sentence duration (seconds).
    pub max_duration: Option<f64>,
}

/// Long-audio chunking.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Window length in seconds; `None` disables chunking.
    pub chunk_duration: Option<f64>,
    /// Overlap between adjacent windows in seconds.
    pub overlap_duration: f64,
}

/// Floating-point precision for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// 32-bit float.
    Float32,
    /// Reduced precision (bfloat16).
    BFloat16,
}

impl Precision {
    /// `Float32` when `fp32` is set, else `BFloat16`.
    pub fn from_fp32(fp32: bool) -> Self {
        if fp32 { Self::Float32 } else { Self::BFloat16 }
    }
}

/// Everything the engine needs besides the audio path.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    /// Decoding strategy.
    pub decoding: DecodingStrategy,
    /// Sentence segmentation policy.
    pub sentence: SentenceConfig,
    /// Chunking policy.
    pub chunking: ChunkingConfig,
    /// Compute precision.
    pub precision: Precision,
}

/// Translate request parameters into an [`InferenceConfig`].
///
/// Only the decoding method, beam width and chunk overlap are checked; the
/// remaining values pass through for the engine to interpret.
pub fn build_config(request: &DecodingRequest) -> Result<InferenceConfig> {
    let method: DecodingMethod = request.decoding.parse()?;

    if request.beam_size < 1 {
        return Err(TranscribeError::InvalidParameter(format!(
            "Invalid beam_size {}. Must be at least 1.",
            request.beam_size
        )));
    }
    if request.overlap_duration < 0.0 {
        return Err(TranscribeError::InvalidParameter(format!(
            "Invalid overlap_duration {}. Must not be negative.",
            request.overlap_duration
        )));
    }
    if let Some(chunk) = request.chunk_duration {
        if request.overlap_duration > chunk {
            return Err(TranscribeError::InvalidParameter(format!(
                "Invalid overlap_duration {}. Must not exceed chunk_duration {chunk}.",
                request.overlap_duration
            )));
        }
    }

    let decoding = match method {
        DecodingMethod::Greedy => DecodingStrategy::Greedy,
        DecodingMethod::Beam => DecodingStrategy::Beam {
            beam_size: request.beam_size,
            length_penalty: request.length_penalty,
            patience: request.patience,
            duration_reward: request.duration_reward,
        },
    };

    Ok(InferenceConfig {
        decoding,
        sentence: SentenceConfig {
            max_words: request.max_words,
            silence_gap: request.silence_gap,
            max_duration: request.max_duration,
        },
        chunking: ChunkingConfig {
            chunk_duration: request.chunk_duration,
            overlap_duration: request.overlap_duration,
        },
        precision: Precision::from_fp32(request.fp32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_match_wire_contract() {
        let r = DecodingRequest::default();
        assert_eq!(r.decoding, "greedy");
        assert_eq!(r.beam_size, 5);
        assert_eq!(r.length_penalty, 1.0);
        assert_eq!(r.patience, 1.0);
        assert_eq!(r.duration_reward, 0.7);
        assert_eq!(r.overlap_duration, 15.0);
        assert!(r.chunk_duration.is_none());
        assert!(!r.fp32);
    }

    #[test]
    fn greedy_ignores_beam_parameters() {
        let request = DecodingRequest {
            beam_size: 12,
            length_penalty: 0.3,
            ..DecodingRequest::default()
        };
        let config = build_config(&request).unwrap();
        assert_eq!(config.decoding, DecodingStrategy::Greedy);
        assert_eq!(config.precision, Precision::BFloat16);
    }

    #[test]
    fn beam_carries_parameters() {
        let request = DecodingRequest {
            decoding: "beam".into(),
            beam_size: 8,
            length_penalty: 0.5,
            patience: 2.0,
            duration_reward: 0.2,
            fp32: true,
            ..DecodingRequest::default()
        };
        let config = build_config(&request).unwrap();
        assert_eq!(
            config.decoding,
            DecodingStrategy::Beam {
                beam_size: 8,
                length_penalty: 0.5,
                patience: 2.0,
                duration_reward: 0.2,
            }
        );
        assert_eq!(config.precision, Precision::Float32);
    }

    #[test]
    fn segmentation_and_chunking_pass_through() {
        let request = DecodingRequest {
            max_words: Some(12),
            silence_gap: Some(0.6),
            max_duration: Some(8.0),
            chunk_duration: Some(120.0),
            overlap_duration: 10.0,
            ..DecodingRequest::default()
        };
        let config = build_config(&request).unwrap();
        assert_eq!(config.sentence.max_words, Some(12));
        assert_eq!(config.sentence.silence_gap, Some(0.6));
        assert_eq!(config.sentence.max_duration, Some(8.0));
        assert_eq!(config.chunking.chunk_duration, Some(120.0));
        assert_eq!(config.chunking.overlap_duration, 10.0);
    }

    #[test]
    fn rejects_unknown_decoding_method() {
        let request = DecodingRequest {
            decoding: "foo".into(),
            ..DecodingRequest::default()
        };
        assert_matches!(
            build_config(&request),
            Err(TranscribeError::InvalidParameter(msg)) if msg == "Invalid decoding method 'foo'. Must be 'greedy' or 'beam'."
        );
    }

    #[test]
    fn rejects_zero_beam_size() {
        let request = DecodingRequest {
            decoding: "beam".into(),
            beam_size: 0,
            ..DecodingRequest::default()
        };
        assert_matches!(build_config(&request), Err(TranscribeError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_negative_overlap() {
        let request = DecodingRequest {
            overlap_duration: -1.0,
            ..DecodingRequest::default()
        };
        assert_matches!(build_config(&request), Err(TranscribeError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_overlap_longer_than_chunk() {
        let request = DecodingRequest {
            chunk_duration: Some(10.0),
            overlap_duration: 15.0,
            ..DecodingRequest::default()
        };
        assert_matches!(build_config(&request), Err(TranscribeError::InvalidParameter(_)));
    }

    #[test]
    fn overlap_longer_than_chunk_allowed_without_chunking() {
        // Default overlap (15s) is irrelevant while chunking is off.
        let request = DecodingRequest {
            chunk_duration: None,
            overlap_duration: 300.0,
            ..DecodingRequest::default()
        };
        assert!(build_config(&request).is_ok());
    }

    #[test]
    fn overlap_equal_to_chunk_is_accepted() {
        let request = DecodingRequest {
            chunk_duration: Some(15.0),
            ..DecodingRequest::default()
        };
        assert!(build_config(&request).is_ok());
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let request: DecodingRequest =
            serde_json::from_value(serde_json::json!({"decoding": "beam", "max_words": 20})).unwrap();
        assert_eq!(request.decoding, "beam");
        assert_eq!(request.max_words, Some(20));
        assert_eq!(request.beam_size, 5);
        assert_eq!(request.overlap_duration, 15.0);
    }

    #[test]
    fn request_skips_unset_optionals_when_serialized() {
        let value = serde_json::to_value(DecodingRequest::default()).unwrap();
        assert!(value.get("chunk_duration").is_none());
        assert!(value.get("max_words").is_none());
        assert_eq!(value["overlap_duration"], 15.0);
    }
}
