//! Audio file → 16kHz mono f32.

use std::fs::File;
use std::path::Path;

use paratran_core::{Result, ResultExt, TranscribeError};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Sample rate the model expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Decode the file at `path` into 16kHz mono samples.
pub fn load_audio(path: &Path) -> Result<Vec<f32>> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let _ = hint.with_extension(&ext.to_ascii_lowercase());
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .inference("audio probe")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| TranscribeError::Inference("audio probe: no audio track".into()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let source_rate = params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .inference("audio codec init")?;

    let mut mono: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(TranscribeError::Inference(format!("audio read: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = e, "skipping corrupt audio packet");
                continue;
            }
            Err(e) => return Err(TranscribeError::Inference(format!("audio decode: {e}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        mono.extend(
            buf.samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    debug!(
        samples = mono.len(),
        source_rate,
        "decoded {:.1}s of audio",
        mono.len() as f64 / f64::from(source_rate)
    );

    if mono.is_empty() || source_rate == TARGET_SAMPLE_RATE {
        return Ok(mono);
    }
    resample(&mono, source_rate, TARGET_SAMPLE_RATE)
}

/// Resample mono audio with a windowed-sinc resampler.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    const CHUNK: usize = 1024;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK, 1).inference("resampler init")?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let mut out = Vec::with_capacity(expected + CHUNK);
    let delay = resampler.output_delay();

    let mut input = vec![vec![0.0f32; CHUNK]];
    for block in samples.chunks(CHUNK) {
        input[0][..block.len()].copy_from_slice(block);
        input[0][block.len()..].fill(0.0);
        let resampled = resampler.process(&input, None).inference("resample")?;
        out.extend_from_slice(&resampled[0]);
    }
    // Flush the filter tail so the delay trim below keeps the full signal.
    while out.len() < expected + delay {
        input[0].fill(0.0);
        let resampled = resampler.process(&input, None).inference("resample flush")?;
        if resampled[0].is_empty() {
            break;
        }
        out.extend_from_slice(&resampled[0]);
    }

    let end = (delay + expected).min(out.len());
    Ok(out[delay.min(end)..end].to_vec())
}
