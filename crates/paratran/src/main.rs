//! # paratran
//!
//! Binary entry point: batch transcription of files (local or remote),
//! `paratran serve` (HTTP service) and `paratran mcp` (MCP over stdio).

#![deny(unsafe_code)]

mod cli;
mod logging;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use paratran_client::{Backend, BatchOptions, FileOutcome, run_batch};
use paratran_core::settings::read_env_string;
use paratran_core::{ModelCache, ModelSettings, Transcriber, TranscriptionResult, format_timestamp, resolve_server_url};
use paratran_mcp::McpServer;
use tracing::{error, info};

use crate::cli::{Cli, Command, McpArgs, ServeArgs, TranscribeArgs};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_subscriber(cli.verbose, cli.log_format);

    match cli.command {
        Some(Command::Serve(args)) => serve(args).await,
        Some(Command::Mcp(args)) => mcp(args).await,
        None => transcribe(cli.transcribe, cli.verbose).await,
    }
}

/// In-process orchestrator with a fresh single-slot cache.
fn local_transcriber(settings: &ModelSettings) -> Arc<Transcriber> {
    if !paratran_onnx::backend_available() {
        tracing::warn!("built without a local inference backend; local transcription will fail");
    }
    let cache = Arc::new(ModelCache::new(paratran_onnx::default_loader()));
    Arc::new(Transcriber::new(cache, settings.identity()))
}

async fn transcribe(args: TranscribeArgs, verbose: bool) -> Result<ExitCode> {
    if args.files.is_empty() {
        eprintln!("paratran: no input files (see --help)");
        return Ok(ExitCode::FAILURE);
    }

    let formats = args.formats()?;
    let settings = args.model.settings();
    let backend = Backend::select(args.server_url().as_deref(), || local_transcriber(&settings));
    info!(%backend, files = args.files.len(), "starting batch");

    let options = BatchOptions {
        request: args.decoding.to_request(),
        output_dir: args.output_dir.clone(),
        formats,
    };
    let report = run_batch(&backend, &args.files, &options, |source, result, outputs| {
        for path in outputs {
            info!(source = %source.display(), output = %path.display(), "wrote");
        }
        if verbose {
            print_sentences(source, result);
        }
    })
    .await;

    for outcome in &report.outcomes {
        if let FileOutcome::Failed { source, error } = outcome {
            eprintln!("{}: {error}", source.display());
        }
    }
    if let Some(reason) = &report.aborted {
        error!(%reason, "batch aborted");
        eprintln!("paratran: batch aborted: {reason}");
    }

    let written = report.outcomes.len() - report.failed();
    info!(written, failed = report.failed(), "batch finished");
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_sentences(source: &Path, result: &TranscriptionResult) {
    println!("{}:", source.display());
    for sentence in &result.sentences {
        println!(
            "[{} --> {}] {}",
            format_timestamp(sentence.start, '.'),
            format_timestamp(sentence.end, '.'),
            sentence.text.trim()
        );
    }
}

async fn serve(args: ServeArgs) -> Result<ExitCode> {
    let settings = args.model.settings();
    let config = args.server_config();
    info!(model = %settings.model, cache_dir = ?settings.cache_dir, "loading model");

    let transcriber = local_transcriber(&settings);
    let handle = paratran_server::start(config, transcriber, settings)
        .await
        .context("Failed to start server")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    info!("Shutting down...");
    handle.shutdown().await;
    Ok(ExitCode::SUCCESS)
}

async fn mcp(args: McpArgs) -> Result<ExitCode> {
    let settings = args.model.settings();
    let server_url = resolve_server_url(args.server.as_deref(), read_env_string);
    let backend = Backend::select(server_url.as_deref(), || local_transcriber(&settings));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    McpServer::new(backend)
        .serve(stdin, tokio::io::stdout())
        .await
        .context("MCP transport failed")?;
    Ok(ExitCode::SUCCESS)
}
