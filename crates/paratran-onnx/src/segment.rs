//! Timed pieces → words → sentences.

use paratran_core::{RawResult, RawSentence, RawToken, SentenceConfig};

use crate::model::{Vocabulary, WORD_BOUNDARY};

/// Encoder frame length in seconds (10ms hop, 8x subsampling).
pub const FRAME_SECONDS: f64 = 0.08;

/// Characters that close a sentence.
const TERMINAL_PUNCTUATION: &[char] = &['.', '?', '!', '。', '？', '！', '…'];

/// A decoded vocabulary piece placed on the audio timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedPiece {
    /// Piece text, possibly starting with the word-boundary marker.
    pub text: String,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds.
    pub end: f64,
}

/// One non-blank token emitted by the TDT decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    /// Vocabulary id.
    pub token: usize,
    /// Encoder frame the token was emitted on.
    pub frame: usize,
    /// Predicted duration in frames.
    pub duration: usize,
}

/// Place emissions on the timeline, `offset` seconds from the file start.
///
/// A zero-duration token still spans one frame. Unknown ids are dropped.
pub fn place_emissions(emissions: &[Emission], vocab: &Vocabulary, offset: f64) -> Vec<TimedPiece> {
    let at = |frame: usize| round3(offset + frame as f64 * FRAME_SECONDS);
    emissions
        .iter()
        .filter_map(|e| {
            let text = vocab.piece(e.token)?;
            Some(TimedPiece {
                text: text.to_string(),
                start: at(e.frame),
                end: at(e.frame + e.duration.max(1)),
            })
        })
        .collect()
}

fn round3(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

/// Join pieces into words. A piece that starts with the boundary marker
/// opens a new word; the rest continue the current one.
pub fn assemble_words(pieces: &[TimedPiece]) -> Vec<RawToken> {
    let mut words: Vec<RawToken> = Vec::new();
    for piece in pieces {
        let starts_word = piece.text.starts_with(WORD_BOUNDARY);
        let text = piece.text.replace(WORD_BOUNDARY, " ");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match words.last_mut() {
            Some(word) if !starts_word => {
                word.text.push_str(text);
                word.end = piece.end;
            }
            _ => words.push(RawToken {
                text: text.to_string(),
                start: piece.start,
                end: piece.end,
            }),
        }
    }
    words
}

/// Group words into sentences.
///
/// A sentence closes after terminal punctuation, once it holds `max_words`
/// words, before a pause longer than `silence_gap`, or before a word that
/// would push it past `max_duration`.
pub fn segment(words: Vec<RawToken>, config: &SentenceConfig) -> Vec<RawSentence> {
    let mut sentences = Vec::new();
    let mut current: Vec<RawToken> = Vec::new();

    for word in words {
        if let Some(last) = current.last() {
            let gap_split = config
                .silence_gap
                .is_some_and(|gap| word.start - last.end > gap);
            let duration_split = config
                .max_duration
                .is_some_and(|max| word.end - current[0].start > max);
            if gap_split || duration_split {
                sentences.push(close(std::mem::take(&mut current)));
            }
        }

        let terminal = word.text.ends_with(TERMINAL_PUNCTUATION);
        current.push(word);

        let full = config
            .max_words
            .is_some_and(|max| current.len() >= max as usize);
        if terminal || full {
            sentences.push(close(std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        sentences.push(close(current));
    }
    sentences
}

fn close(tokens: Vec<RawToken>) -> RawSentence {
    let text = tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let start = tokens.first().map_or(0.0, |t| t.start);
    let end = tokens.last().map_or(0.0, |t| t.end);
    RawSentence {
        text,
        start,
        end,
        tokens,
    }
}

/// Full engine output for a sequence of timed pieces.
pub fn build_result(pieces: &[TimedPiece], config: &SentenceConfig) -> RawResult {
    let sentences = segment(assemble_words(pieces), config);
    let text = sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    RawResult { text, sentences }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(text: &str, start: f64, end: f64) -> TimedPiece {
        TimedPiece {
            text: text.into(),
            start,
            end,
        }
    }

    fn word(text: &str, start: f64, end: f64) -> RawToken {
        RawToken {
            text: text.into(),
            start,
            end,
        }
    }

    #[test]
    fn emissions_map_to_frame_times() {
        let vocab = Vocabulary::parse("▁hi 0\n! 1\n<blk> 2\n").unwrap();
        let pieces = place_emissions(
            &[
                Emission { token: 0, frame: 3, duration: 2 },
                Emission { token: 1, frame: 5, duration: 0 },
                Emission { token: 9, frame: 6, duration: 1 },
            ],
            &vocab,
            10.0,
        );
        assert_eq!(
            pieces,
            vec![piece("▁hi", 10.24, 10.4), piece("!", 10.4, 10.48)]
        );
    }

    #[test]
    fn joins_continuation_pieces() {
        let words = assemble_words(&[
            piece("▁Hel", 0.0, 0.16),
            piece("lo", 0.16, 0.32),
            piece("▁world", 0.4, 0.8),
            piece(".", 0.8, 0.88),
        ]);
        assert_eq!(words, vec![word("Hello", 0.0, 0.32), word("world.", 0.4, 0.88)]);
    }

    #[test]
    fn leading_continuation_starts_a_word() {
        let words = assemble_words(&[piece("lo", 0.0, 0.1), piece("▁", 0.1, 0.2)]);
        assert_eq!(words, vec![word("lo", 0.0, 0.1)]);
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let words = vec![
            word("Hi.", 0.0, 0.4),
            word("How", 0.5, 0.7),
            word("are", 0.7, 0.9),
            word("you?", 0.9, 1.2),
            word("Fine", 1.3, 1.6),
        ];
        let sentences = segment(words, &SentenceConfig::default());
        let texts: Vec<_> = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi.", "How are you?", "Fine"]);
        assert_eq!(sentences[1].start, 0.5);
        assert_eq!(sentences[1].end, 1.2);
    }

    #[test]
    fn splits_on_max_words() {
        let words = (0..5)
            .map(|i| word("w", f64::from(i), f64::from(i) + 0.5))
            .collect();
        let config = SentenceConfig {
            max_words: Some(2),
            ..SentenceConfig::default()
        };
        let sizes: Vec<_> = segment(words, &config).iter().map(|s| s.tokens.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn splits_on_silence_gap() {
        let words = vec![word("a", 0.0, 0.5), word("b", 0.6, 1.0), word("c", 3.0, 3.4)];
        let config = SentenceConfig {
            silence_gap: Some(1.0),
            ..SentenceConfig::default()
        };
        let texts: Vec<_> = segment(words, &config).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["a b", "c"]);
    }

    #[test]
    fn splits_on_max_duration() {
        let words = vec![word("a", 0.0, 1.0), word("b", 1.0, 2.0), word("c", 2.0, 3.5)];
        let config = SentenceConfig {
            max_duration: Some(2.5),
            ..SentenceConfig::default()
        };
        let texts: Vec<_> = segment(words, &config).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, vec!["a b", "c"]);
    }

    #[test]
    fn no_words_no_sentences() {
        let result = build_result(&[], &SentenceConfig::default());
        assert!(result.sentences.is_empty());
        assert!(result.text.is_empty());
    }

    #[test]
    fn result_text_joins_sentences() {
        let result = build_result(
            &[
                piece("▁Yes", 0.0, 0.3),
                piece(".", 0.3, 0.35),
                piece("▁No", 0.6, 0.9),
            ],
            &SentenceConfig::default(),
        );
        assert_eq!(result.text, "Yes. No");
        assert_eq!(result.sentences.len(), 2);
    }
}
