//! Energy detector: frame RMS as the speech probability.
//!
//! The cheapest baseline in the sweep. Raw RMS is parameter-independent, so
//! the evaluator caches it once per frame and re-thresholds on lookup.

use super::{Detector, FrameScore};
use crate::audio;
use crate::corpus::DEFAULT_FRAME_LEN;
use crate::error::Result;

/// Stateless RMS scorer over 512-sample frames.
#[derive(Debug, Default)]
pub struct EnergyDetector;

impl EnergyDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for EnergyDetector {
    fn frame_length(&self) -> usize {
        DEFAULT_FRAME_LEN
    }

    fn score(&mut self, frame: &[f32]) -> Result<FrameScore> {
        Ok(FrameScore::Probability(audio::rms(frame)))
    }

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}
