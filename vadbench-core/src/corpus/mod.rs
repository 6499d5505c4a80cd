//! Synthesized-corpus types and constants.
//!
//! A corpus is one continuous PCM track plus one ground-truth label per
//! `DEFAULT_FRAME_LEN`-sample block, persisted as a 16-bit mono WAV and a
//! plain-text label file (one ordinal per line, same order as the audio) so
//! every engine is benchmarked against identical bytes.

pub mod labeler;
pub mod synth;

pub use labeler::{label_frames, LabelerConfig};
pub use synth::{synthesize, SynthConfig};

use std::fmt;
use std::path::Path;

use crate::audio::wav;
use crate::error::{Result, VadBenchError};

/// Fixed corpus sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Ground-truth labeling granularity: one label per this many samples.
pub const DEFAULT_FRAME_LEN: usize = 512;

/// Silence appended after each utterance, in seconds.
pub const SILENCE_SEC: usize = 20;

/// Samples of inter-utterance silence, rounded down to whole label blocks.
pub const SILENCE_SAMPLES: usize =
    DEFAULT_FRAME_LEN * (SILENCE_SEC * SAMPLE_RATE as usize / DEFAULT_FRAME_LEN);

/// Label blocks of inter-utterance silence.
pub const SILENCE_FRAMES: usize = SILENCE_SAMPLES / DEFAULT_FRAME_LEN;

/// Ground truth for one `DEFAULT_FRAME_LEN`-sample block.
///
/// `Unknown` marks the guard band around speech onsets/offsets; those blocks
/// count toward neither the true-detect nor the false-alarm denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLabel {
    Silence,
    Unknown,
    Voice,
}

impl FrameLabel {
    /// Wire ordinal used in the persisted label file.
    pub fn ordinal(self) -> u8 {
        match self {
            FrameLabel::Silence => 0,
            FrameLabel::Unknown => 1,
            FrameLabel::Voice => 2,
        }
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(FrameLabel::Silence),
            1 => Some(FrameLabel::Unknown),
            2 => Some(FrameLabel::Voice),
            _ => None,
        }
    }
}

impl fmt::Display for FrameLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameLabel::Silence => "silence",
            FrameLabel::Unknown => "unknown",
            FrameLabel::Voice => "voice",
        };
        f.write_str(name)
    }
}

/// A synthesized benchmark corpus.
///
/// Invariant: `samples.len() == labels.len() * DEFAULT_FRAME_LEN`.
#[derive(Debug, Clone)]
pub struct Corpus {
    /// Mono f32 samples in [-1.0, 1.0] at `SAMPLE_RATE`.
    pub samples: Vec<f32>,
    /// One ground-truth label per `DEFAULT_FRAME_LEN`-sample block.
    pub labels: Vec<FrameLabel>,
}

impl Corpus {
    /// Persist as a 16-bit mono WAV plus a label text file.
    pub fn store(&self, speech_path: &Path, label_path: &Path) -> Result<()> {
        wav::write_mono_i16(speech_path, &self.samples, SAMPLE_RATE)?;

        let mut text = String::with_capacity(self.labels.len() * 2);
        for label in &self.labels {
            text.push((b'0' + label.ordinal()) as char);
            text.push('\n');
        }
        std::fs::write(label_path, text)?;
        Ok(())
    }

    /// Load a previously persisted corpus, validating the sample/label shape.
    pub fn load(speech_path: &Path, label_path: &Path) -> Result<Self> {
        let samples = wav::read_mono(speech_path, SAMPLE_RATE)?;

        let text = std::fs::read_to_string(label_path)?;
        let mut labels = Vec::with_capacity(text.len() / 2);
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let ordinal: u8 = line.parse().map_err(|_| VadBenchError::LabelFile {
                path: label_path.to_path_buf(),
                detail: format!("line {}: not a label ordinal: {line:?}", lineno + 1),
            })?;
            let label = FrameLabel::from_ordinal(ordinal).ok_or_else(|| {
                VadBenchError::LabelFile {
                    path: label_path.to_path_buf(),
                    detail: format!("line {}: unknown label ordinal {ordinal}", lineno + 1),
                }
            })?;
            labels.push(label);
        }

        if samples.len() != labels.len() * DEFAULT_FRAME_LEN {
            return Err(VadBenchError::CorpusShape {
                samples: samples.len(),
                labels: labels.len(),
            });
        }

        Ok(Self { samples, labels })
    }

    /// Count of blocks carrying `label`.
    pub fn count(&self, label: FrameLabel) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }
}
