//! Command-line definition.

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};
use paratran_core::{DecodingRequest, ModelSettings, OutputFormat, resolve_server_url};
use paratran_core::settings::read_env_string;
use paratran_server::ServerConfig;

use crate::logging::LogFormat;

/// Speech-to-text with word-level timestamps.
///
/// With FILES, transcribes each one and writes the selected formats. Runs
/// the model in-process unless `--server` (or `PARATRAN_SERVER`) points at a
/// running `paratran serve`.
#[derive(Parser, Debug)]
#[command(name = "paratran", version, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub transcribe: TranscribeArgs,

    /// Debug logging; also prints each sentence with its timecodes.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log encoding on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP transcription service.
    Serve(ServeArgs),
    /// Run the MCP server on stdio.
    Mcp(McpArgs),
}

/// Model selection shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// HF model ID or local model directory [env: PARATRAN_MODEL]
    #[arg(long)]
    pub model: Option<String>,

    /// Directory for downloaded models [env: PARATRAN_MODEL_DIR]
    #[arg(long, visible_alias = "model-dir")]
    pub cache_dir: Option<String>,
}

impl ModelArgs {
    pub fn settings(&self) -> ModelSettings {
        ModelSettings::resolve(self.model.as_deref(), self.cache_dir.as_deref())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Bind host.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port.
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    #[command(flatten)]
    pub model: ModelArgs,
}

impl ServeArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            ..ServerConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct McpArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Forward tool calls to a remote paratran server [env: PARATRAN_SERVER]
    #[arg(long)]
    pub server: Option<String>,
}

/// Options for the default (transcribe files) command.
#[derive(Args, Debug, Clone, Default)]
pub struct TranscribeArgs {
    /// Audio files (wav, mp3, flac, m4a, ogg, webm).
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Remote paratran server URL [env: PARATRAN_SERVER]
    #[arg(long)]
    pub server: Option<String>,

    /// Where to write output files.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Output format.
    #[arg(
        short = 'f',
        long,
        default_value = "txt",
        value_parser = PossibleValuesParser::new(["txt", "json", "srt", "vtt", "all"])
    )]
    pub output_format: String,

    #[command(flatten)]
    pub decoding: DecodingArgs,
}

impl TranscribeArgs {
    pub fn formats(&self) -> paratran_core::Result<Vec<OutputFormat>> {
        OutputFormat::parse_selection(&self.output_format)
    }

    pub fn server_url(&self) -> Option<String> {
        resolve_server_url(self.server.as_deref(), read_env_string)
    }
}

/// Decoding flags. Unset flags take the [`DecodingRequest`] defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct DecodingArgs {
    /// Decoding method [default: greedy]
    #[arg(long, value_parser = PossibleValuesParser::new(["greedy", "beam"]))]
    pub decoding: Option<String>,

    /// Beam size, beam decoding only [default: 5]
    #[arg(long)]
    pub beam_size: Option<u32>,

    /// Length penalty, beam decoding only [default: 1.0]
    #[arg(long)]
    pub length_penalty: Option<f64>,

    /// Patience, beam decoding only [default: 1.0]
    #[arg(long)]
    pub patience: Option<f64>,

    /// Duration reward 0.0-1.0, beam decoding only [default: 0.7]
    #[arg(long)]
    pub duration_reward: Option<f64>,

    /// Max words per sentence.
    #[arg(long)]
    pub max_words: Option<u32>,

    /// Split sentences on silence gaps longer than this (seconds).
    #[arg(long)]
    pub silence_gap: Option<f64>,

    /// Max sentence duration (seconds).
    #[arg(long)]
    pub max_duration: Option<f64>,

    /// Chunk long audio into windows of this many seconds.
    #[arg(long)]
    pub chunk_duration: Option<f64>,

    /// Overlap between chunks (seconds) [default: 15.0]
    #[arg(long)]
    pub overlap_duration: Option<f64>,

    /// Use float32 instead of bfloat16.
    #[arg(long)]
    pub fp32: bool,
}

impl DecodingArgs {
    pub fn to_request(&self) -> DecodingRequest {
        let d = DecodingRequest::default();
        DecodingRequest {
            decoding: self.decoding.clone().unwrap_or(d.decoding),
            beam_size: self.beam_size.unwrap_or(d.beam_size),
            length_penalty: self.length_penalty.unwrap_or(d.length_penalty),
            patience: self.patience.unwrap_or(d.patience),
            duration_reward: self.duration_reward.unwrap_or(d.duration_reward),
            max_words: self.max_words,
            silence_gap: self.silence_gap,
            max_duration: self.max_duration,
            chunk_duration: self.chunk_duration,
            overlap_duration: self.overlap_duration.unwrap_or(d.overlap_duration),
            fp32: self.fp32,
        }
    }
}
