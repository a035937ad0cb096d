//! ONNX graph runners and the TDT greedy decoding loop.
//!
//! ONNX tensor shapes use `i64` dimensions while Rust indexing needs `usize`;
//! the values are small positive tensor extents.

use ndarray::{Array2, Array3, Axis};
use ort::session::Session;
use ort::value::Tensor;
use paratran_core::{Result, ResultExt, TranscribeError};
use tracing::debug;

use crate::model::Vocabulary;
use crate::segment::Emission;

/// TDT duration buckets, in encoder frames.
pub const DURATIONS: [usize; 5] = [0, 1, 2, 3, 4];

/// Prediction network LSTM state shape: `[layers, batch, hidden]`.
const STATE_SHAPE: [i64; 3] = [2, 1, 640];

/// Tokens allowed on one frame before the decoder is forced forward.
const MAX_SYMBOLS_PER_FRAME: usize = 10;

/// Waveform `[N]` → mel features `[1, 128, T]` and their valid length.
pub fn run_preprocessor(session: &mut Session, samples: &[f32]) -> Result<(Array3<f32>, i64)> {
    let n = samples.len() as i64;
    let waveforms = Tensor::from_array(([1i64, n], samples.to_vec())).inference("waveform tensor")?;
    let lens = Tensor::from_array(([1i64], vec![n])).inference("waveform length tensor")?;

    let outputs = session
        .run(ort::inputs!["waveforms" => waveforms, "waveforms_lens" => lens])
        .inference("preprocessor run")?;

    let (shape, data) = outputs["features"]
        .try_extract_tensor::<f32>()
        .inference("extract features")?;
    let (_, lens) = outputs["features_lens"]
        .try_extract_tensor::<i64>()
        .inference("extract features length")?;

    let features = Array3::from_shape_vec(
        (shape[0] as usize, shape[1] as usize, shape[2] as usize),
        data.to_vec(),
    )
    .inference("reshape features")?;
    Ok((features, lens.first().copied().unwrap_or(0)))
}

/// Mel features → encoder frames `[T', hidden]` and the valid frame count.
///
/// The encoder emits `[1, hidden, T']`; frames are transposed to rows.
pub fn run_encoder(
    session: &mut Session,
    features: &Array3<f32>,
    features_len: i64,
) -> Result<(Array2<f32>, usize)> {
    let dims: Vec<i64> = features.shape().iter().map(|&d| d as i64).collect();
    let signal = Tensor::from_array(([dims[0], dims[1], dims[2]], features.iter().copied().collect::<Vec<_>>()))
        .inference("encoder input tensor")?;
    let length = Tensor::from_array(([1i64], vec![features_len])).inference("encoder length tensor")?;

    let outputs = session
        .run(ort::inputs!["audio_signal" => signal, "length" => length])
        .inference("encoder run")?;

    let (shape, data) = outputs["outputs"]
        .try_extract_tensor::<f32>()
        .inference("extract encoder output")?;
    let (_, lens) = outputs["encoded_lengths"]
        .try_extract_tensor::<i64>()
        .inference("extract encoded length")?;

    let encoded = Array3::from_shape_vec(
        (shape[0] as usize, shape[1] as usize, shape[2] as usize),
        data.to_vec(),
    )
    .inference("reshape encoder output")?;
    let frames = encoded
        .index_axis(Axis(0), 0)
        .t()
        .as_standard_layout()
        .into_owned();
    let valid = lens.first().map_or(frames.nrows(), |&l| l.max(0) as usize);
    Ok((frames, valid.min(frames.nrows())))
}

/// Greedy TDT decode over `frames[..valid]`.
///
/// Each joint step yields a token and a duration. A non-blank token is
/// emitted and advances the prediction network; the duration moves the frame
/// cursor. A blank with zero duration still advances one frame.
pub fn greedy_decode(
    session: &mut Session,
    frames: &Array2<f32>,
    valid: usize,
    vocab: &Vocabulary,
) -> Result<Vec<Emission>> {
    let hidden = frames.ncols() as i64;
    let n_tokens = vocab.logits_len();
    let blank = vocab.blank();
    let state_len = STATE_SHAPE.iter().product::<i64>() as usize;

    let mut state_1 = vec![0.0f32; state_len];
    let mut state_2 = vec![0.0f32; state_len];
    let mut prev_token = blank;
    let mut emissions = Vec::new();
    let mut on_frame = 0;
    let mut t = 0;

    while t < valid {
        let frame = frames.row(t).to_vec();
        let encoder_outputs =
            Tensor::from_array(([1i64, hidden, 1], frame)).inference("joint frame tensor")?;
        let targets = Tensor::from_array(([1i64, 1], vec![prev_token as i64])).inference("joint target tensor")?;
        let target_length = Tensor::from_array(([1i64], vec![1i64])).inference("joint target length tensor")?;
        let s1 = Tensor::from_array((STATE_SHAPE, state_1.clone())).inference("joint state tensor")?;
        let s2 = Tensor::from_array((STATE_SHAPE, state_2.clone())).inference("joint state tensor")?;

        let outputs = session
            .run(ort::inputs![
                "encoder_outputs" => encoder_outputs,
                "targets" => targets,
                "target_length" => target_length,
                "input_states_1" => s1,
                "input_states_2" => s2,
            ])
            .inference("decoder_joint run")?;

        let (_, logits) = outputs["outputs"]
            .try_extract_tensor::<f32>()
            .inference("extract joint logits")?;
        if logits.len() < n_tokens + DURATIONS.len() {
            return Err(TranscribeError::Inference(format!(
                "joint logits too short: {} < {n_tokens} + {}",
                logits.len(),
                DURATIONS.len()
            )));
        }
        let token = argmax(&logits[..n_tokens]);
        let duration = DURATIONS[argmax(&logits[n_tokens..n_tokens + DURATIONS.len()])];

        if token != blank {
            let (_, next_1) = outputs["output_states_1"]
                .try_extract_tensor::<f32>()
                .inference("extract joint state")?;
            let (_, next_2) = outputs["output_states_2"]
                .try_extract_tensor::<f32>()
                .inference("extract joint state")?;
            state_1 = next_1.to_vec();
            state_2 = next_2.to_vec();
            prev_token = token;
            emissions.push(Emission {
                token,
                frame: t,
                duration,
            });
            on_frame += 1;
        }

        if duration > 0 {
            t += duration;
            on_frame = 0;
        } else if token == blank || on_frame >= MAX_SYMBOLS_PER_FRAME {
            t += 1;
            on_frame = 0;
        }
    }

    debug!(frames = valid, tokens = emissions.len(), "tdt greedy decode done");
    Ok(emissions)
}

/// Index of the largest value; `0` for an empty slice.
fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map_or(0, |(i, _)| i)
}
