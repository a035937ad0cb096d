//! The `transcribe` tool: schema, argument parsing, invocation.

use std::path::PathBuf;

use paratran_client::Backend;
use paratran_core::DecodingRequest;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

/// Tool name as listed by `tools/list`.
pub const TOOL_NAME: &str = "transcribe";

const DESCRIPTION: &str = "Transcribe an audio file to text with word-level timestamps. \
Returns JSON with the full text, duration, processing time, and sentences \
with word-level timestamps.";

/// Parsed `tools/call` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscribeArgs {
    /// Audio file on the machine running this server.
    pub file_path: PathBuf,
    /// Every other argument.
    pub request: DecodingRequest,
}

impl TranscribeArgs {
    /// Split `file_path` off the argument object and read the rest as a
    /// [`DecodingRequest`], defaults filling the gaps.
    pub fn parse(arguments: Option<&Value>) -> Result<Self, String> {
        let mut fields: Map<String, Value> = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err("Tool arguments must be an object".into()),
        };
        let file_path = match fields.remove("file_path") {
            Some(Value::String(s)) if !s.is_empty() => PathBuf::from(s),
            Some(Value::String(_)) | None => {
                return Err("Missing required parameter: file_path".into());
            }
            Some(_) => return Err("Parameter file_path must be a string".into()),
        };
        // Optional parameters sent as explicit null mean "not set".
        fields.retain(|_, v| !v.is_null());
        let request = serde_json::from_value(Value::Object(fields))
            .map_err(|e| format!("Invalid tool arguments: {e}"))?;
        Ok(Self { file_path, request })
    }
}

/// Entry for `tools/list`.
pub fn definition() -> Value {
    let d = DecodingRequest::default();
    json!({
        "name": TOOL_NAME,
        "description": DESCRIPTION,
        "inputSchema": {
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Absolute path to the audio file (wav, mp3, flac, m4a, ogg, webm)."
                },
                "decoding": {
                    "type": "string",
                    "enum": ["greedy", "beam"],
                    "default": d.decoding,
                    "description": "Decoding method."
                },
                "beam_size": {
                    "type": "integer",
                    "minimum": 1,
                    "default": d.beam_size,
                    "description": "Beam size (beam decoding only)."
                },
                "length_penalty": {
                    "type": "number",
                    "default": d.length_penalty,
                    "description": "Length penalty (beam decoding only)."
                },
                "patience": {
                    "type": "number",
                    "default": d.patience,
                    "description": "Patience (beam decoding only)."
                },
                "duration_reward": {
                    "type": "number",
                    "default": d.duration_reward,
                    "description": "Duration reward 0.0-1.0 (beam decoding only)."
                },
                "max_words": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Max words per sentence."
                },
                "silence_gap": {
                    "type": "number",
                    "description": "Split sentence on silence gap (seconds)."
                },
                "max_duration": {
                    "type": "number",
                    "description": "Max sentence duration (seconds)."
                },
                "chunk_duration": {
                    "type": "number",
                    "description": "Chunk duration in seconds for long audio. Omit to disable chunking."
                },
                "overlap_duration": {
                    "type": "number",
                    "minimum": 0,
                    "default": d.overlap_duration,
                    "description": "Overlap between chunks (seconds)."
                },
                "fp32": {
                    "type": "boolean",
                    "default": d.fp32,
                    "description": "Use float32 instead of bfloat16."
                }
            },
            "required": ["file_path"]
        }
    })
}

/// Run one transcription and wrap the outcome as a `tools/call` result.
///
/// Success carries the canonical JSON (2-space indent) as text; transcription
/// failures are reported in-band with `isError` so the calling model can read
/// them. `Err` only when the result itself cannot be encoded.
pub async fn call(backend: &Backend, args: &TranscribeArgs) -> Result<Value, serde_json::Error> {
    info!(file = %args.file_path.display(), %backend, "transcribing");
    match backend.transcribe(&args.file_path, &args.request).await {
        Ok(result) => Ok(text_result(serde_json::to_string_pretty(&result)?, false)),
        Err(e) => {
            warn!(file = %args.file_path.display(), error = %e, "transcription failed");
            Ok(text_result(e.to_string(), true))
        }
    }
}

fn text_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}
